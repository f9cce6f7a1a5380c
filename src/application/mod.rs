//! Application layer services.
//!
//! Services own the active rule snapshot and coordinate loading, validation
//! and evaluation. They consume repository traits and give the CLI (or an
//! embedding server) a small async API.
//!
//! # Available Services
//!
//! - [`services::redirect_service::RedirectService`] - Snapshot reloads and single-URL resolution
//! - [`services::validation_service::ValidationService`] - Batch audits and CSV export

pub mod services;
