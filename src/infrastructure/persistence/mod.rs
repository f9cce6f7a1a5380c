//! Snapshot repository implementations.
//!
//! - [`FileSnapshotRepository`] - JSON snapshot document on disk
//! - [`InMemorySnapshotRepository`] - Records held in process

pub mod file_snapshot_repository;
pub mod memory_snapshot_repository;

pub use file_snapshot_repository::FileSnapshotRepository;
pub use memory_snapshot_repository::InMemorySnapshotRepository;
