//! Repository trait definitions for the domain layer.
//!
//! The engine consumes rules and settings through [`SnapshotRepository`];
//! implementations live in `crate::infrastructure::persistence`, and mock
//! implementations are generated via `mockall` for testing.

pub mod snapshot_repository;

pub use snapshot_repository::SnapshotRepository;

#[cfg(test)]
pub use snapshot_repository::MockSnapshotRepository;
