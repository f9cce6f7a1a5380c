//! Command-line front end for the URL migration engine.
//!
//! Loads a rule snapshot and resolves legacy URLs against it, either one at a
//! time with the full trace or as a batch audit with CSV export.
//!
//! # Usage
//!
//! ```bash
//! # Resolve a single URL and show every transformation step
//! url-migrator resolve "https://old.com/sites/my-site?x=1"
//!
//! # Same, as JSON
//! url-migrator resolve --json "https://old.com/foo"
//!
//! # Audit a list of URLs (newline, comma or semicolon separated)
//! url-migrator validate --input urls.txt --output report.csv
//!
//! # Check that the snapshot loads cleanly
//! url-migrator --snapshot ./rules.json check
//! ```
//!
//! # Environment Variables
//!
//! See [`url_migrator::config`]. `--snapshot` overrides `SNAPSHOT_PATH`.

use url_migrator::application::services::{
    LoadReport, RedirectService, ValidationReport, ValidationService, extract_urls,
};
use url_migrator::config::{Config, load_from_env};
use url_migrator::domain::entities::{MatchLevel, TransformationResult};
use url_migrator::error::AppError;
use url_migrator::infrastructure::persistence::FileSnapshotRepository;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Resolve legacy URLs against a redirect rule snapshot.
#[derive(Parser)]
#[command(name = "url-migrator")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Rules and settings document (overrides SNAPSHOT_PATH)
    #[arg(short, long, global = true)]
    snapshot: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve URLs and show the transformation trace
    Resolve {
        /// URLs to resolve
        #[arg(required = true)]
        urls: Vec<String>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Audit a batch of URLs
    Validate {
        /// File with URLs separated by newlines, commas or semicolons
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// URLs given directly
        urls: Vec<String>,

        /// Write the CSV report to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,

        /// Overwrite the output file without asking
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Load the snapshot and report rejected rules
    Check,
}

impl Commands {
    fn json_output(&self) -> bool {
        matches!(
            self,
            Commands::Resolve { json: true, .. } | Commands::Validate { json: true, .. }
        )
    }
}

/// In JSON mode the error body also goes to stdout, so scripted callers get a
/// parseable answer for failures too.
fn report_error(e: AppError, json: bool) -> anyhow::Error {
    if json {
        let body = json!({ "error": e.to_info() });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    }
    e.into()
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if config.is_json_logging() {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = load_from_env().context("Invalid configuration")?;
    if let Some(path) = &cli.snapshot {
        config.snapshot_path = path.display().to_string();
    }

    init_tracing(&config);
    config.print_summary();

    let json_output = cli.command.json_output();
    let repository = Arc::new(FileSnapshotRepository::new(&config.snapshot_path));
    let redirects = Arc::new(RedirectService::new(repository));
    let report = redirects
        .reload()
        .await
        .map_err(|e| report_error(e, json_output))
        .with_context(|| format!("Failed to load snapshot '{}'", config.snapshot_path))?;

    match cli.command {
        Commands::Resolve { urls, json } => resolve_urls(&redirects, urls, json).await?,
        Commands::Validate {
            input,
            urls,
            output,
            json,
            yes,
        } => {
            let service = ValidationService::new(
                Arc::clone(&redirects),
                config.validation_concurrency,
                config.validation_max_urls,
            );
            validate_urls(&service, input, urls, output, json, yes).await?;
        }
        Commands::Check => print_load_report(&config.snapshot_path, &report),
    }

    Ok(())
}

fn level_colored(level: MatchLevel, text: &str) -> ColoredString {
    match level {
        MatchLevel::Green => text.green(),
        MatchLevel::Yellow => text.yellow(),
        MatchLevel::Red => text.red(),
    }
}

/// Resolves each URL and prints its trace.
async fn resolve_urls(
    redirects: &RedirectService<FileSnapshotRepository>,
    urls: Vec<String>,
    json: bool,
) -> Result<()> {
    if json {
        // Failed URLs are reported in place so the output lines up with the input.
        let mut entries = Vec::with_capacity(urls.len());
        for url in &urls {
            entries.push(match redirects.resolve(url).await {
                Ok(result) => serde_json::to_value(&result)?,
                Err(e) => json!({ "originalUrl": url, "error": e.to_info() }),
            });
        }
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for url in &urls {
        print_result(&redirects.resolve(url).await?);
    }

    Ok(())
}

/// Prints one result with its step-by-step trace.
///
/// # Output Format
///
/// ```text
/// https://old.com/foo?x=1
///   -> https://new.com/bar?source=migration
///   Strategy: rule   Quality: 75% (yellow)   Matcher: /foo
///
///   1. [rule] Applied wildcard rule '/foo'
///      https://old.com/foo?x=1 -> https://new.com/bar
/// ```
fn print_result(result: &TransformationResult) {
    let quality = format!("{}% ({})", result.quality, result.level.as_str());

    println!("{}", result.original_url.bright_white().bold());
    println!("  -> {}", level_colored(result.level, &result.final_url).bold());
    println!(
        "  Strategy: {}   Quality: {}   Matcher: {}",
        result.redirect_strategy.as_str().cyan(),
        level_colored(result.level, &quality),
        result.matcher().unwrap_or("No Match").bright_black()
    );
    if result.auto_redirect {
        println!("  {}", "Auto redirect enabled".bright_black());
    }
    println!();

    for (i, step) in result.steps.iter().enumerate() {
        let marker = if step.changed { "*" } else { " " };
        println!(
            "  {}{}. [{}] {}",
            marker.bright_yellow(),
            i + 1,
            format!("{:?}", step.kind).to_lowercase().bright_black(),
            step.description
        );
        if step.changed {
            println!("     {} -> {}", step.url_before.bright_black(), step.url_after);
        }
    }

    if !result.applied_global_rules.is_empty() {
        println!();
        println!("  {}", "Global rules applied:".bright_white());
        for applied in &result.applied_global_rules {
            println!(
                "    {} {}",
                applied.id.cyan(),
                applied.description.bright_black()
            );
        }
    }
    println!();
}

/// Runs a batch audit and optionally writes the CSV report.
async fn validate_urls(
    service: &ValidationService<FileSnapshotRepository>,
    input: Option<PathBuf>,
    urls: Vec<String>,
    output: Option<PathBuf>,
    json: bool,
    skip_confirm: bool,
) -> Result<()> {
    let mut batch = Vec::new();
    if let Some(path) = &input {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read '{}'", path.display()))?;
        batch.extend(extract_urls(&content));
    }
    for url in &urls {
        batch.extend(extract_urls(url));
    }

    let report = service
        .validate(batch)
        .await
        .map_err(|e| report_error(e, json))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_validation_report(&report);
    }

    if let Some(path) = output {
        write_csv(&path, &report, skip_confirm).await?;
    }

    Ok(())
}

fn print_validation_report(report: &ValidationReport) {
    println!("{}", "URL Validation".bright_blue().bold());
    println!();

    for result in &report.results {
        let quality = format!("{:>3}%", result.quality);
        println!(
            "  {}  {} -> {}",
            level_colored(result.level, &quality),
            result.original_url.bright_black(),
            result.final_url
        );
    }

    let summary = &report.summary;
    println!();
    println!(
        "  Total: {}   Changed: {}   Unchanged: {}",
        summary.total.to_string().bright_white().bold(),
        summary.changed.to_string().cyan(),
        summary.unchanged.to_string().bright_black()
    );
    println!(
        "  Green: {}   Yellow: {}   Red: {}",
        summary.green.to_string().green(),
        summary.yellow.to_string().yellow(),
        summary.red.to_string().red()
    );
    println!(
        "  Rule: {}   Smart search: {}   Domain fallback: {}",
        summary.rule, summary.smart_search, summary.domain_fallback
    );

    if report.truncated {
        println!();
        println!(
            "{}",
            format!(
                "  Only the first {} of {} URLs were validated",
                report.results.len(),
                report.submitted
            )
            .yellow()
        );
    }
    println!();
}

async fn write_csv(path: &Path, report: &ValidationReport, skip_confirm: bool) -> Result<()> {
    if !skip_confirm && tokio::fs::try_exists(path).await.unwrap_or(false) {
        let confirmed = Confirm::new()
            .with_prompt(format!("Overwrite '{}'?", path.display()))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "Cancelled, report not written".red());
            return Ok(());
        }
    }

    tokio::fs::write(path, report.to_csv())
        .await
        .with_context(|| format!("Failed to write '{}'", path.display()))?;

    println!(
        "{} {}",
        "Report written to".green(),
        path.display().to_string().bright_white()
    );
    Ok(())
}

fn print_load_report(snapshot_path: &str, report: &LoadReport) {
    println!("{}", "Snapshot check".bright_blue().bold());
    println!();
    println!("  File:   {}", snapshot_path.cyan());
    println!(
        "  Loaded: {}",
        report.rules_loaded.to_string().green().bold()
    );

    if report.rules_skipped.is_empty() {
        println!("  {}", "All rules are valid".green());
    } else {
        println!(
            "  Skipped: {}",
            report.rules_skipped.len().to_string().red().bold()
        );
        println!();
        for skipped in &report.rules_skipped {
            println!(
                "  {} {} {}",
                skipped.id.red(),
                skipped.matcher.cyan(),
                skipped.reason.bright_black()
            );
        }
    }
    println!();
}
