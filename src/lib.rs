//! # URL Migrator
//!
//! Rule-driven resolution of legacy URLs to their post-migration destinations.
//!
//! Given an incoming URL and a snapshot of redirect rules plus global
//! settings, the engine selects the most specific rule, rewrites the URL
//! through a fixed pipeline, scores the match and records a step-by-step
//! trace. Unmatched URLs go through smart search or a plain domain swap.
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture principles with clear layer separation:
//!
//! - **Domain Layer** ([`domain`]) - Entities, the evaluation engine and the repository trait
//! - **Application Layer** ([`application`]) - Snapshot reloads and batch validation
//! - **Infrastructure Layer** ([`infrastructure`]) - File and in-memory snapshot sources
//!
//! ## Quick Start
//!
//! ```bash
//! export SNAPSHOT_PATH="./rules.json"
//! cargo run -- resolve "https://old.com/sites/my-site"
//! ```
//!
//! ## Embedding
//!
//! ```ignore
//! let snapshot = CompiledSnapshot::compile(rules, settings);
//! let result = evaluate("https://old.com/foo", &snapshot);
//! ```
//!
//! ## Configuration
//!
//! Tool configuration is loaded from environment variables via [`config::Config`].
//! See [`config`] module for available options.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod utils;

pub use error::AppError;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::application::services::{RedirectService, ValidationService};
    pub use crate::domain::engine::evaluate;
    pub use crate::domain::engine::snapshot::CompiledSnapshot;
    pub use crate::domain::entities::{
        GlobalSettings, MatchLevel, RedirectStrategy, RedirectType, TransformationResult, UrlRule,
    };
    pub use crate::error::AppError;
}
