//! Domain layer containing entities and the evaluation engine.
//!
//! # Architecture
//!
//! - [`entities`] - Rules, settings and evaluation results
//! - [`engine`] - Rule selection, transformation pipeline, scoring and fallback
//! - [`validation`] - Configuration boundary for rules and settings
//! - [`repositories`] - Snapshot source trait
//!
//! # Design Principles
//!
//! - The engine is synchronous and pure: same URL and snapshot, same result
//! - Repository traits define contracts implemented by the infrastructure layer
//! - Loading and orchestration live in [`crate::application::services`]

pub mod engine;
pub mod entities;
pub mod repositories;
pub mod validation;
