//! JSON file implementation of the snapshot repository.

use async_trait::async_trait;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::domain::entities::RuleSnapshot;
use crate::domain::repositories::SnapshotRepository;
use crate::error::{AppError, map_io_error};

/// Reads rules and settings from a JSON document exported by the admin side,
/// laid out as `{ "rules": [...], "settings": {...} }`.
///
/// The file is read once per load, so a reload picks up edits and never mixes
/// two versions of the file.
pub struct FileSnapshotRepository {
    path: PathBuf,
}

impl FileSnapshotRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and parses the whole document.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] when the file is missing and
    /// [`AppError::Configuration`] when it is not a valid snapshot document.
    pub async fn load_document(&self) -> Result<RuleSnapshot, AppError> {
        let display = self.path.display().to_string();
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| map_io_error(e, &display))?;

        let document: RuleSnapshot = serde_json::from_str(&content).map_err(|e| {
            AppError::configuration(
                format!("Snapshot file '{display}' is not valid: {e}"),
                json!({ "path": display, "line": e.line(), "column": e.column() }),
            )
        })?;

        debug!(path = %self.path.display(), rules = document.rules.len(), "Snapshot document loaded");
        Ok(document)
    }
}

#[async_trait]
impl SnapshotRepository for FileSnapshotRepository {
    async fn load_snapshot(&self) -> Result<RuleSnapshot, AppError> {
        self.load_document().await
    }
}
