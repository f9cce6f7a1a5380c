//! Application error type shared by services, repositories and the CLI.
//!
//! The engine itself never returns these: it fails closed and reports through
//! the trace instead. `AppError` covers the layers around it (snapshot loading,
//! configuration validation, batch validation).

use serde::Serialize;
use serde_json::{Value, json};

/// Machine-readable error body, used when errors are rendered as JSON.
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Validation { message: String, details: Value },

    #[error("{message}")]
    NotFound { message: String, details: Value },

    /// A rule or settings record failed the schema boundary.
    #[error("{message}")]
    Configuration { message: String, details: Value },

    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }
    pub fn configuration(message: impl Into<String>, details: Value) -> Self {
        Self::Configuration {
            message: message.into(),
            details,
        }
    }
    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// Stable code used in JSON output and logs.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "validation_error",
            AppError::NotFound { .. } => "not_found",
            AppError::Configuration { .. } => "configuration_error",
            AppError::Internal { .. } => "internal_error",
        }
    }

    pub fn details(&self) -> &Value {
        match self {
            AppError::Validation { details, .. }
            | AppError::NotFound { details, .. }
            | AppError::Configuration { details, .. }
            | AppError::Internal { details, .. } => details,
        }
    }

    /// Converts the error into its serializable body.
    pub fn to_info(&self) -> ErrorInfo {
        ErrorInfo {
            code: self.code(),
            message: self.to_string(),
            details: self.details().clone(),
        }
    }
}

pub fn map_io_error(e: std::io::Error, path: &str) -> AppError {
    if e.kind() == std::io::ErrorKind::NotFound {
        return AppError::not_found("Snapshot file not found", json!({ "path": path }));
    }

    AppError::internal(
        "Failed to read snapshot file",
        json!({ "path": path, "error": e.to_string() }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::bad_request("x", json!({})).code(),
            "validation_error"
        );
        assert_eq!(AppError::not_found("x", json!({})).code(), "not_found");
        assert_eq!(
            AppError::configuration("x", json!({})).code(),
            "configuration_error"
        );
        assert_eq!(AppError::internal("x", json!({})).code(), "internal_error");
    }

    #[test]
    fn test_error_info_carries_details() {
        let err = AppError::configuration("Invalid rule", json!({ "rule": "abc" }));
        let info = err.to_info();

        assert_eq!(info.message, "Invalid rule");
        assert_eq!(info.details["rule"], "abc");
    }

    #[test]
    fn test_error_info_serializes_for_json_output() {
        let err = AppError::not_found("Snapshot file not found", json!({ "path": "rules.json" }));
        let body = serde_json::to_value(err.to_info()).unwrap();

        assert_eq!(
            body,
            json!({
                "code": "not_found",
                "message": "Snapshot file not found",
                "details": { "path": "rules.json" }
            })
        );
    }

    #[test]
    fn test_map_io_error_not_found() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert!(matches!(
            map_io_error(err, "rules.json"),
            AppError::NotFound { .. }
        ));
    }

    #[test]
    fn test_map_io_error_other() {
        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(matches!(
            map_io_error(err, "rules.json"),
            AppError::Internal { .. }
        ));
    }
}
