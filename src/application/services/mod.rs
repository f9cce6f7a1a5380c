//! Business logic services for the application layer.

pub mod redirect_service;
pub mod validation_service;

pub use redirect_service::{LoadReport, RedirectService, SkippedRule};
pub use validation_service::{
    ValidationReport, ValidationService, ValidationSummary, extract_urls,
};
