//! Snapshot loading and single-URL resolution.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::domain::engine::{self, snapshot::CompiledSnapshot};
use crate::domain::entities::{RuleSnapshot, TransformationResult};
use crate::domain::repositories::SnapshotRepository;
use crate::domain::validation::{validate_rule, validate_settings};
use crate::error::AppError;

/// A rule rejected at the configuration boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRule {
    pub id: String,
    pub matcher: String,
    pub reason: String,
}

/// Outcome of a snapshot reload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub rules_loaded: usize,
    pub rules_skipped: Vec<SkippedRule>,
}

/// Service holding the active snapshot and resolving URLs against it.
///
/// Readers clone the `Arc` of the current snapshot, so a reload never
/// changes the rules under an evaluation that is already running.
pub struct RedirectService<R: SnapshotRepository> {
    repository: Arc<R>,
    snapshot: RwLock<Arc<CompiledSnapshot>>,
}

impl<R: SnapshotRepository> RedirectService<R> {
    /// Creates a service with an empty snapshot; call [`Self::reload`] to load rules.
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            snapshot: RwLock::new(Arc::new(CompiledSnapshot::default())),
        }
    }

    /// Loads rules and settings, validates them and swaps in a new snapshot.
    ///
    /// Invalid rules are skipped and reported; the rest still load.
    ///
    /// # Errors
    ///
    /// Returns the repository error if loading fails, or
    /// [`AppError::Configuration`] if the settings are invalid. The previous
    /// snapshot stays active in both cases.
    pub async fn reload(&self) -> Result<LoadReport, AppError> {
        let RuleSnapshot { rules, settings } = self.repository.load_snapshot().await?;
        validate_settings(&settings)?;

        let mut report = LoadReport::default();
        let mut accepted = Vec::with_capacity(rules.len());

        for rule in rules {
            match validate_rule(&rule) {
                Ok(()) => accepted.push(rule),
                Err(e) => {
                    warn!(rule_id = %rule.id, matcher = %rule.matcher, error = %e, details = %e.details(), "Skipping invalid rule");
                    report.rules_skipped.push(SkippedRule {
                        id: rule.id,
                        matcher: rule.matcher,
                        reason: e.details().to_string(),
                    });
                }
            }
        }

        report.rules_loaded = accepted.len();
        let compiled = CompiledSnapshot::compile(accepted, settings);
        *self.snapshot.write().await = Arc::new(compiled);

        info!(
            rules_loaded = report.rules_loaded,
            rules_skipped = report.rules_skipped.len(),
            "Rule snapshot loaded"
        );
        Ok(report)
    }

    /// The snapshot currently in use.
    pub async fn snapshot(&self) -> Arc<CompiledSnapshot> {
        Arc::clone(&*self.snapshot.read().await)
    }

    /// Resolves one URL.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if `url` is blank.
    pub async fn resolve(&self, url: &str) -> Result<TransformationResult, AppError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(AppError::bad_request("URL cannot be empty", json!({})));
        }

        let snapshot = self.snapshot().await;
        let result = engine::evaluate(url, &snapshot);

        metrics::counter!(
            "url_migrator_resolutions_total",
            "strategy" => result.redirect_strategy.as_str(),
            "level" => result.level.as_str()
        )
        .increment(1);

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{GlobalSettings, RedirectStrategy, RedirectType, UrlRule};
    use crate::domain::repositories::MockSnapshotRepository;

    fn valid_rule() -> UrlRule {
        UrlRule::new(
            "r1",
            "/foo",
            RedirectType::Wildcard,
            Some("https://new.com/bar".to_string()),
        )
    }

    fn mock_repo(rules: Vec<UrlRule>, settings: GlobalSettings) -> MockSnapshotRepository {
        let mut mock_repo = MockSnapshotRepository::new();
        mock_repo
            .expect_load_snapshot()
            .times(1)
            .returning(move || Ok(RuleSnapshot::new(rules.clone(), settings.clone())));
        mock_repo
    }

    #[tokio::test]
    async fn test_reload_and_resolve() {
        let repo = mock_repo(vec![valid_rule()], GlobalSettings::with_domain("https://new.com"));
        let service = RedirectService::new(Arc::new(repo));

        let report = service.reload().await.unwrap();
        assert_eq!(report.rules_loaded, 1);
        assert!(report.rules_skipped.is_empty());

        let result = service.resolve("https://old.com/foo").await.unwrap();
        assert_eq!(result.final_url, "https://new.com/bar");
        assert_eq!(result.redirect_strategy, RedirectStrategy::Rule);
    }

    #[tokio::test]
    async fn test_reload_skips_invalid_rules() {
        let invalid = UrlRule::new("bad", "/broken", RedirectType::Wildcard, None);
        let repo = mock_repo(vec![valid_rule(), invalid], GlobalSettings::default());
        let service = RedirectService::new(Arc::new(repo));

        let report = service.reload().await.unwrap();

        assert_eq!(report.rules_loaded, 1);
        assert_eq!(report.rules_skipped.len(), 1);
        assert_eq!(report.rules_skipped[0].id, "bad");
    }

    #[tokio::test]
    async fn test_invalid_settings_keep_previous_snapshot() {
        let mut repo = MockSnapshotRepository::new();
        repo.expect_load_snapshot().returning(|| {
            Ok(RuleSnapshot::new(
                vec![valid_rule()],
                GlobalSettings::with_domain("not a url"),
            ))
        });
        let service = RedirectService::new(Arc::new(repo));

        let result = service.reload().await;

        assert!(matches!(result, Err(AppError::Configuration { .. })));
        assert!(service.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_repository_error_propagates() {
        let mut repo = MockSnapshotRepository::new();
        repo.expect_load_snapshot()
            .returning(|| Err(AppError::not_found("Snapshot file not found", json!({}))));
        let service = RedirectService::new(Arc::new(repo));

        let result = service.reload().await;
        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_resolve_rejects_blank_url() {
        let service = RedirectService::new(Arc::new(MockSnapshotRepository::new()));
        let result = service.resolve("   ").await;

        assert!(matches!(result, Err(AppError::Validation { .. })));
    }
}
