mod common;

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use url_migrator::application::services::{RedirectService, ValidationService, extract_urls};
use url_migrator::domain::entities::{GlobalRuleKind, RedirectStrategy, RuleSnapshot};
use url_migrator::domain::repositories::SnapshotRepository;
use url_migrator::error::AppError;
use url_migrator::infrastructure::persistence::FileSnapshotRepository;

/// Counts store reads made through the wrapped file repository.
struct CountingRepository {
    inner: FileSnapshotRepository,
    reads: AtomicUsize,
}

#[async_trait]
impl SnapshotRepository for CountingRepository {
    async fn load_snapshot(&self) -> Result<RuleSnapshot, AppError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.load_snapshot().await
    }
}

fn snapshot_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

async fn loaded_service(file: &NamedTempFile) -> Arc<RedirectService<FileSnapshotRepository>> {
    let repo = Arc::new(FileSnapshotRepository::new(file.path()));
    let service = Arc::new(RedirectService::new(repo));
    service.reload().await.unwrap();
    service
}

#[tokio::test]
async fn test_reload_reports_skipped_rules() {
    let file = snapshot_file(common::SNAPSHOT_JSON);
    let repo = Arc::new(FileSnapshotRepository::new(file.path()));
    let service = RedirectService::new(repo);

    let report = service.reload().await.unwrap();

    assert_eq!(report.rules_loaded, 2);
    assert_eq!(report.rules_skipped.len(), 1);
    assert_eq!(report.rules_skipped[0].id, "broken");
}

#[tokio::test]
async fn test_resolve_applies_rule_and_global_static() {
    let file = snapshot_file(common::SNAPSHOT_JSON);
    let service = loaded_service(&file).await;

    let result = service
        .resolve("https://old.com/foo?file=123&ignore=me")
        .await
        .unwrap();

    assert_eq!(
        result.final_url,
        "https://new.com/bar?id=123&lang=en&source=migration"
    );
    assert_eq!(result.applied_global_rules.len(), 1);
    assert_eq!(result.applied_global_rules[0].kind, GlobalRuleKind::Static);
    assert!(!result.auto_redirect);
}

#[tokio::test]
async fn test_resolve_partial_rule_with_auto_redirect() {
    let file = snapshot_file(common::SNAPSHOT_JSON);
    let service = loaded_service(&file).await;

    let result = service.resolve("https://old.com/sites/my-site").await.unwrap();

    assert_eq!(result.final_url, "https://new.com/teams/my-site?lang=en");
    assert!(result.auto_redirect);
}

#[tokio::test]
async fn test_skipped_rule_never_matches() {
    let file = snapshot_file(common::SNAPSHOT_JSON);
    let service = loaded_service(&file).await;

    let result = service.resolve("https://old.com/broken/page").await.unwrap();

    assert_eq!(result.redirect_strategy, RedirectStrategy::DomainFallback);
    assert_eq!(result.final_url, "https://new.com/broken/page");
}

#[tokio::test]
async fn test_reload_picks_up_file_changes() {
    let file = snapshot_file(common::SNAPSHOT_JSON);
    let service = loaded_service(&file).await;

    let old_snapshot = service.snapshot().await;

    std::fs::write(
        file.path(),
        r#"{ "rules": [], "settings": { "defaultNewDomain": "https://other.com" } }"#,
    )
    .unwrap();

    let report = service.reload().await.unwrap();
    assert_eq!(report.rules_loaded, 0);

    let result = service.resolve("https://old.com/foo").await.unwrap();
    assert_eq!(result.final_url, "https://other.com/foo");

    // Snapshots already handed out stay intact.
    assert_eq!(old_snapshot.rules().len(), 2);
}

#[tokio::test]
async fn test_reload_reads_rules_and_settings_together() {
    let file = snapshot_file(common::SNAPSHOT_JSON);
    let repo = Arc::new(CountingRepository {
        inner: FileSnapshotRepository::new(file.path()),
        reads: AtomicUsize::new(0),
    });
    let service = RedirectService::new(Arc::clone(&repo));

    service.reload().await.unwrap();
    assert_eq!(repo.reads.load(Ordering::SeqCst), 1);

    std::fs::write(
        file.path(),
        r#"{
            "rules": [
                { "id": "v2", "matcher": "/foo", "redirectType": "partial",
                  "targetUrl": "/v2", "createdAt": "2024-01-01T00:00:00Z" }
            ],
            "settings": { "defaultNewDomain": "https://v2.new.com" }
        }"#,
    )
    .unwrap();

    service.reload().await.unwrap();
    assert_eq!(repo.reads.load(Ordering::SeqCst), 2);

    let snapshot = service.snapshot().await;
    assert_eq!(snapshot.rules().len(), 1);
    assert_eq!(snapshot.settings().new_domain_base(), Some("https://v2.new.com"));

    let result = service.resolve("https://old.com/foo/x").await.unwrap();
    assert_eq!(result.final_url, "https://v2.new.com/v2/x");
}

#[tokio::test]
async fn test_malformed_snapshot_keeps_previous() {
    let file = snapshot_file(common::SNAPSHOT_JSON);
    let service = loaded_service(&file).await;

    std::fs::write(file.path(), "{ not json").unwrap();

    let result = service.reload().await;

    assert!(matches!(result, Err(AppError::Configuration { .. })));
    assert_eq!(service.snapshot().await.rules().len(), 2);
}

#[tokio::test]
async fn test_batch_validation_and_csv() {
    let file = snapshot_file(common::SNAPSHOT_JSON);
    let service = loaded_service(&file).await;
    let validation = ValidationService::new(service, 2, 1000);

    let urls = extract_urls(
        "https://old.com/foo\nhttps://old.com/sites/my-site; https://old.com/unknown",
    );
    let report = validation.validate(urls).await.unwrap();

    assert_eq!(report.summary.total, 3);
    assert_eq!(report.summary.rule, 2);
    assert_eq!(report.summary.domain_fallback, 1);
    assert_eq!(report.summary.changed, 3);

    let csv = report.to_csv();
    let lines: Vec<_> = csv.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "Original URL,Final URL,Changed,Rule Matcher,Match Quality");
    assert_eq!(
        lines[1],
        "https://old.com/foo,https://new.com/bar?lang=en&source=migration,Yes,/foo,100%"
    );
    assert_eq!(
        lines[3],
        "https://old.com/unknown,https://new.com/unknown,Yes,No Match,10%"
    );

    let out_dir = tempfile::tempdir().unwrap();
    let out_path = out_dir.path().join("report.csv");
    tokio::fs::write(&out_path, &csv).await.unwrap();
    assert_eq!(tokio::fs::read_to_string(&out_path).await.unwrap(), csv);
}

#[tokio::test]
async fn test_missing_snapshot_file() {
    let repo = Arc::new(FileSnapshotRepository::new("/nonexistent/rules.json"));
    let service = RedirectService::new(repo);

    let result = service.reload().await;
    assert!(matches!(result, Err(AppError::NotFound { .. })));
}
