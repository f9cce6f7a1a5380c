//! Batch URL audit with CSV export.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use super::redirect_service::RedirectService;
use crate::domain::engine;
use crate::domain::entities::{MatchLevel, RedirectStrategy, TransformationResult};
use crate::domain::repositories::SnapshotRepository;
use crate::error::AppError;
use crate::utils::csv::write_row;

pub const CSV_HEADER: [&str; 5] = [
    "Original URL",
    "Final URL",
    "Changed",
    "Rule Matcher",
    "Match Quality",
];

/// Splits pasted input into URLs on newlines, commas and semicolons.
pub fn extract_urls(input: &str) -> Vec<String> {
    input
        .split(['\n', ',', ';'])
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .collect()
}

/// Aggregate counts over a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationSummary {
    pub total: usize,
    pub changed: usize,
    pub unchanged: usize,
    pub green: usize,
    pub yellow: usize,
    pub red: usize,
    pub rule: usize,
    pub smart_search: usize,
    pub domain_fallback: usize,
}

impl ValidationSummary {
    fn from_results(results: &[TransformationResult]) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Default::default()
        };

        for result in results {
            if result.changed() {
                summary.changed += 1;
            } else {
                summary.unchanged += 1;
            }
            match result.level {
                MatchLevel::Green => summary.green += 1,
                MatchLevel::Yellow => summary.yellow += 1,
                MatchLevel::Red => summary.red += 1,
            }
            match result.redirect_strategy {
                RedirectStrategy::Rule => summary.rule += 1,
                RedirectStrategy::SmartSearch => summary.smart_search += 1,
                RedirectStrategy::DomainFallback => summary.domain_fallback += 1,
            }
        }

        summary
    }
}

/// Results of one batch, in input order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub results: Vec<TransformationResult>,
    pub summary: ValidationSummary,
    /// Number of URLs submitted before truncation.
    pub submitted: usize,
    pub truncated: bool,
}

impl ValidationReport {
    /// Renders the report as CSV, one row per URL.
    pub fn to_csv(&self) -> String {
        let mut out = write_row(CSV_HEADER);
        out.push('\n');

        for result in &self.results {
            let quality = format!("{}%", result.quality);
            out.push_str(&write_row([
                result.original_url.as_str(),
                result.final_url.as_str(),
                if result.changed() { "Yes" } else { "No" },
                result.matcher().unwrap_or("No Match"),
                quality.as_str(),
            ]));
            out.push('\n');
        }

        out
    }
}

/// Evaluates many URLs against one snapshot on a bounded worker pool.
pub struct ValidationService<R: SnapshotRepository> {
    redirects: Arc<RedirectService<R>>,
    concurrency: usize,
    max_urls: usize,
}

impl<R: SnapshotRepository> ValidationService<R> {
    pub fn new(redirects: Arc<RedirectService<R>>, concurrency: usize, max_urls: usize) -> Self {
        Self {
            redirects,
            concurrency: concurrency.max(1),
            max_urls: max_urls.max(1),
        }
    }

    /// Evaluates `urls` in order. Input beyond the configured limit is dropped.
    ///
    /// Every URL in the batch sees the same snapshot, even if a reload
    /// happens meanwhile.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if no URL is given, or
    /// [`AppError::Internal`] if a worker panics.
    pub async fn validate(&self, mut urls: Vec<String>) -> Result<ValidationReport, AppError> {
        urls.retain(|u| !u.trim().is_empty());
        if urls.is_empty() {
            return Err(AppError::bad_request("No URLs to validate", json!({})));
        }

        let submitted = urls.len();
        let truncated = submitted > self.max_urls;
        if truncated {
            warn!(submitted, limit = self.max_urls, "URL batch truncated");
            urls.truncate(self.max_urls);
        }

        let snapshot = self.redirects.snapshot().await;
        let chunk_size = urls.len().div_ceil(self.concurrency);

        let handles: Vec<_> = urls
            .chunks(chunk_size)
            .map(|chunk| {
                let chunk = chunk.to_vec();
                let snapshot = Arc::clone(&snapshot);
                tokio::task::spawn_blocking(move || {
                    chunk
                        .iter()
                        .map(|url| engine::evaluate(url.trim(), &snapshot))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut results = Vec::with_capacity(urls.len());
        for handle in handles {
            let chunk = handle.await.map_err(|e| {
                AppError::internal("Validation worker failed", json!({ "reason": e.to_string() }))
            })?;
            results.extend(chunk);
        }

        for result in &results {
            metrics::counter!(
                "url_migrator_validated_urls_total",
                "strategy" => result.redirect_strategy.as_str()
            )
            .increment(1);
        }

        let summary = ValidationSummary::from_results(&results);
        info!(
            total = summary.total,
            changed = summary.changed,
            green = summary.green,
            yellow = summary.yellow,
            red = summary.red,
            truncated,
            "URL batch validated"
        );

        Ok(ValidationReport {
            results,
            summary,
            submitted,
            truncated,
        })
    }
}
