//! Unmatched URLs: smart search, then domain fallback.

use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use super::matcher::RequestUrl;
use super::scorer::{DOMAIN_FALLBACK_QUALITY, SMART_SEARCH_QUALITY};
use super::snapshot::{CompiledSmartSearch, CompiledSnapshot};
use super::trace::Tracer;
use crate::domain::entities::{RedirectMode, RedirectStrategy, StepKind};
use crate::utils::encoding::{decode_component, encode_component};
use crate::utils::url_parts::swap_origin;

/// Why smart search could not produce a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExtractionFailure {
    #[error("no search term could be extracted")]
    NoTerm,
    #[error("no search URL is configured")]
    NoSearchUrl,
}

/// A search term with the endpoint it will be sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTarget {
    pub term: String,
    pub search_url: String,
    pub skip_encoding: bool,
}

impl SearchTarget {
    /// The search URL with the (optionally encoded) term appended.
    pub fn destination(&self) -> String {
        if self.skip_encoding {
            format!("{}{}", self.search_url, self.term)
        } else {
            format!("{}{}", self.search_url, encode_component(&self.term))
        }
    }
}

/// Outcome of the fallback protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackOutcome {
    pub final_url: String,
    pub strategy: RedirectStrategy,
    pub quality: u8,
}

fn last_segment(path: &str) -> Option<String> {
    path.split('/')
        .rev()
        .find(|s| !s.trim().is_empty())
        .map(|s| decode_component(s).trim().to_string())
        .filter(|s| !s.is_empty())
}

/// `pathPattern` scoping: a case-insensitive prefix ending on a segment boundary.
fn in_scope(search: &CompiledSmartSearch, path: &str) -> bool {
    let Some(pattern) = search.rule.path_pattern.as_deref().map(str::trim).filter(|p| !p.is_empty())
    else {
        return true;
    };

    let path = path.to_lowercase();
    let pattern = pattern.to_lowercase();
    let pattern = pattern.trim_end_matches('/');

    path.strip_prefix(pattern)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// First capture group of `pattern` against the full URL, decoded.
fn captured_term(pattern: &Regex, url: &str) -> Option<String> {
    pattern
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| decode_component(m.as_str()).trim().to_string())
        .filter(|t| !t.is_empty())
}

fn term_for(search: &CompiledSmartSearch, request: &RequestUrl<'_>) -> Option<String> {
    match &search.pattern {
        Some(pattern) => captured_term(pattern, request.raw),
        None => last_segment(request.parts.path),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Extracts a search term and endpoint for an unmatched URL.
///
/// Heuristics in scope are tried pattern-bearing first, then in configuration
/// order. The single `smartSearchRegex` comes next, and the last path segment
/// is the final fallback.
///
/// # Errors
///
/// Returns [`ExtractionFailure::NoTerm`] when nothing usable is found, or
/// [`ExtractionFailure::NoSearchUrl`] when neither the heuristic nor the
/// settings name a search endpoint.
pub fn extract_search_term(
    request: &RequestUrl<'_>,
    snapshot: &CompiledSnapshot,
) -> Result<SearchTarget, ExtractionFailure> {
    let settings = snapshot.settings();

    let found = snapshot
        .smart_search()
        .iter()
        .filter(|s| in_scope(s, request.parts.path))
        .find_map(|s| term_for(s, request).map(|term| (Some(s), term)))
        .or_else(|| {
            snapshot
                .legacy_search()
                .and_then(|pattern| captured_term(pattern, request.raw))
                .map(|term| (None, term))
        })
        .or_else(|| last_segment(request.parts.path).map(|term| (None, term)));

    let (heuristic, term) = found.ok_or(ExtractionFailure::NoTerm)?;

    let search_url = heuristic
        .and_then(|s| non_empty(s.rule.search_url.as_deref()))
        .or_else(|| non_empty(settings.default_search_url.as_deref()))
        .ok_or(ExtractionFailure::NoSearchUrl)?;

    Ok(SearchTarget {
        term,
        search_url: search_url.to_string(),
        skip_encoding: heuristic
            .and_then(|s| s.rule.skip_encoding)
            .unwrap_or(settings.default_search_skip_encoding),
    })
}

/// Produces a destination for a URL no rule matched.
///
/// Fallbacks never apply global search & replace or static parameters.
pub(crate) fn resolve(request: &RequestUrl<'_>, snapshot: &CompiledSnapshot, tracer: &mut Tracer) -> FallbackOutcome {
    let original = request.raw;
    let settings = snapshot.settings();

    if settings.default_redirect_mode == RedirectMode::Search {
        match extract_search_term(request, snapshot) {
            Ok(target) => {
                let final_url = target.destination();
                tracer.record(
                    StepKind::Fallback,
                    format!("Smart search for \"{}\"", target.term),
                    original,
                    &final_url,
                );
                return FallbackOutcome {
                    final_url,
                    strategy: RedirectStrategy::SmartSearch,
                    quality: SMART_SEARCH_QUALITY,
                };
            }
            Err(failure) => {
                debug!(url = original, %failure, "Smart search unavailable, using domain fallback");
                tracer.record(
                    StepKind::Fallback,
                    format!("Smart search unavailable: {failure}"),
                    original,
                    original,
                );
            }
        }
    }

    let final_url = match settings.new_domain_base() {
        Some(domain) => swap_origin(original, domain),
        None => {
            warn!(url = original, "No default new domain configured, URL left unchanged");
            original.to_string()
        }
    };
    tracer.record(StepKind::Fallback, "Domain fallback", original, &final_url);

    FallbackOutcome {
        final_url,
        strategy: RedirectStrategy::DomainFallback,
        quality: DOMAIN_FALLBACK_QUALITY,
    }
}
