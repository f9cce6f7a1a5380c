//! Rule transformation pipeline.
//!
//! Stages run in a fixed order:
//! A. base resolution by redirect type,
//! B. search & replace on the base,
//! C. query assembly,
//! D. query and fragment attachment.

use thiserror::Error;

use super::matcher::{RequestUrl, RuleMatch};
use super::query;
use super::search_replace;
use super::snapshot::CompiledSnapshot;
use super::trace::Tracer;
use crate::domain::entities::{GlobalSettings, QueryMode, RedirectType, StepKind, UrlRule};
use crate::domain::validation::is_absolute_http;
use crate::utils::url_parts::append_query;

/// Reasons a matched rule cannot produce a URL. The engine fails closed on any.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("{redirect_type} rule '{rule_id}' has no absolute target URL")]
    MissingTarget {
        rule_id: String,
        redirect_type: &'static str,
    },
    #[error("rule '{rule_id}' has a relative target but no default new domain is configured")]
    MissingDefaultDomain { rule_id: String },
}

fn absolute_target(rule: &UrlRule) -> Result<&str, TransformError> {
    rule.target_url
        .as_deref()
        .map(str::trim)
        .filter(|t| is_absolute_http(t))
        .ok_or_else(|| TransformError::MissingTarget {
            rule_id: rule.id.clone(),
            redirect_type: rule.redirect_type.as_str(),
        })
}

fn default_domain<'s>(rule: &UrlRule, settings: &'s GlobalSettings) -> Result<&'s str, TransformError> {
    settings
        .new_domain_base()
        .ok_or_else(|| TransformError::MissingDefaultDomain {
            rule_id: rule.id.clone(),
        })
}

fn path_or_root(path: &str) -> &str {
    if path.is_empty() { "/" } else { path }
}

/// Stage A: the base URL without query or fragment.
pub fn resolve_base(
    request: &RequestUrl<'_>,
    matched: &RuleMatch<'_>,
    settings: &GlobalSettings,
) -> Result<String, TransformError> {
    let rule = &matched.rule.rule;
    let raw_path = request.parts.path;

    match rule.redirect_type {
        RedirectType::Wildcard => Ok(absolute_target(rule)?.to_string()),
        RedirectType::Domain => {
            let origin = absolute_target(rule)?.trim_end_matches('/');
            Ok(format!("{origin}{}", path_or_root(raw_path)))
        }
        RedirectType::Partial => {
            let suffix = raw_path.get(matched.span.prefix_end..).unwrap_or_default();
            let target = rule.target_url.as_deref().map(str::trim).filter(|t| !t.is_empty());

            match target {
                None => {
                    let domain = default_domain(rule, settings)?;
                    Ok(format!("{domain}{}", path_or_root(raw_path)))
                }
                Some(target) if is_absolute_http(target) => {
                    Ok(format!("{}{suffix}", target.trim_end_matches('/')))
                }
                Some(target) => {
                    let domain = default_domain(rule, settings)?;
                    let segment = target.trim_matches('/');

                    let mut path = String::with_capacity(segment.len() + suffix.len() + 1);
                    if !segment.is_empty() {
                        path.push('/');
                        path.push_str(segment);
                    }
                    // A mid-segment match leaves the remainder glued to the target segment.
                    path.push_str(suffix);
                    if !path.starts_with('/') {
                        path.insert(0, '/');
                    }

                    Ok(format!("{domain}{path}"))
                }
            }
        }
    }
}

fn query_description(mode: QueryMode, query: &str) -> String {
    let count = query.split('&').filter(|p| !p.is_empty()).count();
    let mode = match mode {
        QueryMode::Forward => "forwarded",
        QueryMode::Discard => "discarded, whitelist applied",
        QueryMode::Keep => "kept",
    };
    format!("Query parameters {mode}; {count} in final URL")
}

/// Runs stages A through D for a matched rule.
pub(crate) fn transform(
    request: &RequestUrl<'_>,
    matched: &RuleMatch<'_>,
    snapshot: &CompiledSnapshot,
    tracer: &mut Tracer,
) -> Result<String, TransformError> {
    let rule = &matched.rule.rule;

    let base = resolve_base(request, matched, snapshot.settings())?;
    tracer.record(
        StepKind::Rule,
        format!("Applied {} rule '{}'", rule.redirect_type.as_str(), rule.matcher),
        request.raw,
        &base,
    );

    let base = search_replace::apply(base, matched.rule, snapshot.global_search_replace(), tracer);

    let (query, mode) = query::build_query(request.parts.query, matched.rule, snapshot, tracer);

    let mut final_url = append_query(&base, &query);
    if rule.redirect_type != RedirectType::Wildcard
        && let Some(fragment) = request.parts.fragment
        && !final_url.contains('#')
    {
        final_url.push('#');
        final_url.push_str(fragment);
    }

    tracer.record(StepKind::Query, query_description(mode, &query), &base, &final_url);

    Ok(final_url)
}
