//! Repository trait for rule snapshots.

use crate::domain::entities::RuleSnapshot;
use crate::error::AppError;
use async_trait::async_trait;

/// Source of the rules and settings the engine evaluates against.
///
/// The engine never writes: rules are authored elsewhere and only read here.
/// Rules and settings are returned from a single read of the store.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::FileSnapshotRepository`] - JSON document on disk
/// - [`crate::infrastructure::persistence::InMemorySnapshotRepository`] - Fixed in-process snapshot
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// Loads every rule, in storage order, together with the global settings.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the backing store does not exist.
    /// Returns [`AppError::Configuration`] if the stored data cannot be parsed.
    async fn load_snapshot(&self) -> Result<RuleSnapshot, AppError>;
}
