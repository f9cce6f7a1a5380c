//! Infrastructure layer for external integrations.
//!
//! This layer implements the repository interfaces defined by the domain
//! layer.
//!
//! # Modules
//!
//! - [`persistence`] - Snapshot sources (file and in-memory)

pub mod persistence;
