//! In-process snapshot repository.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::entities::{GlobalSettings, RuleSnapshot, UrlRule};
use crate::domain::repositories::SnapshotRepository;
use crate::error::AppError;

/// Holds rules and settings in memory.
///
/// Used when an embedding application already has the records at hand, and in
/// tests. [`InMemorySnapshotRepository::replace`] swaps both at once.
#[derive(Default)]
pub struct InMemorySnapshotRepository {
    state: RwLock<RuleSnapshot>,
}

impl InMemorySnapshotRepository {
    pub fn new(rules: Vec<UrlRule>, settings: GlobalSettings) -> Self {
        Self {
            state: RwLock::new(RuleSnapshot::new(rules, settings)),
        }
    }

    pub async fn replace(&self, rules: Vec<UrlRule>, settings: GlobalSettings) {
        debug!(rules = rules.len(), "Replacing in-memory snapshot");
        *self.state.write().await = RuleSnapshot::new(rules, settings);
    }
}

#[async_trait]
impl SnapshotRepository for InMemorySnapshotRepository {
    async fn load_snapshot(&self) -> Result<RuleSnapshot, AppError> {
        Ok(self.state.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::RedirectType;

    #[tokio::test]
    async fn test_replace_swaps_snapshot() {
        let repo = InMemorySnapshotRepository::default();
        assert!(repo.load_snapshot().await.unwrap().rules.is_empty());

        repo.replace(
            vec![UrlRule::new("r1", "/a", RedirectType::Partial, None)],
            GlobalSettings::with_domain("https://new.com"),
        )
        .await;

        let snapshot = repo.load_snapshot().await.unwrap();
        assert_eq!(snapshot.rules.len(), 1);
        assert_eq!(snapshot.settings.new_domain_base(), Some("https://new.com"));
    }
}
