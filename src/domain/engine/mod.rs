//! URL rule resolution and transformation.
//!
//! [`evaluate`] is a pure function of `(url, snapshot)`: it selects the most
//! specific rule, runs the transformation pipeline, scores the match and
//! records a trace. When no rule matches, the fallback protocol takes over.
//! A rule that cannot produce a URL fails closed: the original URL is
//! returned with quality 0.
//!
//! # Modules
//!
//! - [`snapshot`] - Pre-compiled rules and settings
//! - [`matcher`] - Rule selection
//! - [`pipeline`] - Base resolution and stage ordering
//! - [`search_replace`] - Literal search & replace with override law
//! - [`query`] - Query parameter assembly
//! - [`scorer`] - Match quality
//! - [`fallback`] - Smart search and domain fallback
//! - [`trace`] - Step recorder

pub mod fallback;
pub mod matcher;
pub mod pipeline;
pub mod query;
pub mod scorer;
pub mod search_replace;
pub mod snapshot;
pub mod trace;

use tracing::{debug, warn};

use crate::domain::entities::{RedirectStrategy, StepKind, TransformationResult};
use matcher::{RequestUrl, select_rule};
use snapshot::CompiledSnapshot;
use trace::Tracer;

pub use fallback::{ExtractionFailure, SearchTarget, extract_search_term};
pub use matcher::match_rule;
pub use pipeline::TransformError;
pub use snapshot::CompiledRule;

/// Resolves one URL against a snapshot.
///
/// # Examples
///
/// ```ignore
/// let snapshot = CompiledSnapshot::compile(rules, settings);
/// let result = evaluate("https://old.com/foo?x=1", &snapshot);
/// println!("{} -> {} ({}%)", result.original_url, result.final_url, result.quality);
/// ```
pub fn evaluate(old_url: &str, snapshot: &CompiledSnapshot) -> TransformationResult {
    let request = RequestUrl::parse(old_url);
    let settings = snapshot.settings();
    let mut tracer = Tracer::new();

    let Some(matched) = select_rule(&request, snapshot.rules(), settings.case_sensitive_link_detection)
    else {
        let outcome = fallback::resolve(&request, snapshot, &mut tracer);
        debug!(
            url = old_url,
            strategy = outcome.strategy.as_str(),
            final_url = %outcome.final_url,
            "No rule matched"
        );
        let (steps, applied_global_rules) = tracer.into_parts();

        return TransformationResult {
            original_url: old_url.to_string(),
            final_url: outcome.final_url,
            matched_rule: None,
            quality: outcome.quality,
            level: scorer::level(outcome.quality),
            applied_global_rules,
            redirect_strategy: outcome.strategy,
            steps,
            auto_redirect: settings.auto_redirect,
        };
    };

    let rule = &matched.rule.rule;
    let (final_url, quality) = match pipeline::transform(&request, &matched, snapshot, &mut tracer) {
        Ok(final_url) => (final_url, scorer::score_match(&matched.span)),
        Err(error) => {
            warn!(rule_id = %rule.id, url = old_url, %error, "Transformation failed, keeping original URL");
            tracer.clear_globals();
            tracer.record(
                StepKind::Rule,
                format!("Transformation failed: {error}"),
                old_url,
                old_url,
            );
            (old_url.to_string(), scorer::FAILED_QUALITY)
        }
    };

    debug!(
        url = old_url,
        rule_id = %rule.id,
        quality,
        final_url = %final_url,
        "Rule matched"
    );

    let (steps, applied_global_rules) = tracer.into_parts();
    TransformationResult {
        original_url: old_url.to_string(),
        final_url,
        matched_rule: Some(rule.clone()),
        quality,
        level: scorer::level(quality),
        applied_global_rules,
        redirect_strategy: RedirectStrategy::Rule,
        steps,
        auto_redirect: rule.auto_redirect || settings.auto_redirect,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{
        GlobalEntry, GlobalSettings, MatchLevel, RedirectType, SearchReplace, StaticQueryParam,
        UrlRule,
    };

    fn settings() -> GlobalSettings {
        GlobalSettings::with_domain("https://new.com")
    }

    #[test]
    fn test_wildcard_with_discard_and_static() {
        let mut rule = UrlRule::new(
            "r1",
            "/foo",
            RedirectType::Wildcard,
            Some("https://new.com/bar".to_string()),
        );
        rule.discard_query_params = true;
        rule.static_query_params = vec![StaticQueryParam::new("source", "migration")];
        let snapshot = CompiledSnapshot::compile(vec![rule], settings());

        let result = evaluate("https://old.com/foo?x=1&y=2", &snapshot);

        assert_eq!(result.final_url, "https://new.com/bar?source=migration");
        assert_eq!(result.quality, 75);
        assert_eq!(result.level, MatchLevel::Yellow);
        assert_eq!(result.redirect_strategy, RedirectStrategy::Rule);
    }

    #[test]
    fn test_failed_rule_keeps_original() {
        let mut settings = settings();
        settings.global_search_and_replace =
            vec![GlobalEntry::new("g1", SearchReplace::new("old", "new", false))];
        let rule = UrlRule::new("r1", "/foo", RedirectType::Wildcard, None);
        let snapshot = CompiledSnapshot::compile(vec![rule], settings);

        let result = evaluate("https://old.com/foo", &snapshot);

        assert_eq!(result.final_url, "https://old.com/foo");
        assert_eq!(result.quality, 0);
        assert_eq!(result.level, MatchLevel::Red);
        assert!(result.applied_global_rules.is_empty());
        assert_eq!(result.steps.len(), 1);
        assert!(result.matched_rule.is_some());
    }

    #[test]
    fn test_trace_is_continuous() {
        let mut rule = UrlRule::new("r1", "/sites", RedirectType::Partial, Some("sites".to_string()));
        rule.search_and_replace = vec![SearchReplace::new("/sites", "/teams", false)];
        let snapshot = CompiledSnapshot::compile(vec![rule], settings());

        let result = evaluate("https://old.com/sites/my-site?a=1#top", &snapshot);

        assert_eq!(result.final_url, "https://new.com/teams/my-site?a=1#top");
        assert_eq!(result.steps.first().unwrap().url_before, result.original_url);
        assert_eq!(result.steps.last().unwrap().url_after, result.final_url);
        for pair in result.steps.windows(2) {
            assert_eq!(pair[0].url_after, pair[1].url_before);
        }
    }

    #[test]
    fn test_auto_redirect_inherits_global() {
        let rule = UrlRule::new("r1", "/a", RedirectType::Partial, None);
        let mut settings = settings();
        settings.auto_redirect = true;
        let snapshot = CompiledSnapshot::compile(vec![rule], settings);

        assert!(evaluate("/a", &snapshot).auto_redirect);
    }

    #[test]
    fn test_empty_snapshot_falls_back() {
        let snapshot = CompiledSnapshot::compile(Vec::new(), settings());
        let result = evaluate("https://old.com/x", &snapshot);

        assert_eq!(result.redirect_strategy, RedirectStrategy::DomainFallback);
        assert_eq!(result.final_url, "https://new.com/x");
        assert!(result.matched_rule.is_none());
    }
}
