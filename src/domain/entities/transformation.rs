//! Result of one engine evaluation.

use serde::{Deserialize, Serialize};

use super::rule::UrlRule;

/// Tri-level bucket derived from the quality score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchLevel {
    Red,
    Yellow,
    Green,
}

impl MatchLevel {
    /// Buckets a 0-100 score: green >= 90, yellow 50-89, red below 50.
    pub fn from_quality(quality: u8) -> Self {
        match quality {
            90.. => MatchLevel::Green,
            50..=89 => MatchLevel::Yellow,
            _ => MatchLevel::Red,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchLevel::Red => "red",
            MatchLevel::Yellow => "yellow",
            MatchLevel::Green => "green",
        }
    }
}

/// Terminal state of the fallback protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RedirectStrategy {
    Rule,
    SmartSearch,
    DomainFallback,
}

impl RedirectStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedirectStrategy::Rule => "rule",
            RedirectStrategy::SmartSearch => "smart-search",
            RedirectStrategy::DomainFallback => "domain-fallback",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlobalRuleKind {
    Search,
    Static,
    Kept,
}

/// A global sub-rule consumed while producing the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedGlobalRule {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: GlobalRuleKind,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Rule,
    Global,
    Query,
    Fallback,
}

/// One stage boundary of the trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceStep {
    pub description: String,
    pub url_before: String,
    pub url_after: String,
    pub changed: bool,
    #[serde(rename = "type")]
    pub kind: StepKind,
}

/// Everything a downstream consumer needs to serve, persist or audit a redirect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformationResult {
    pub original_url: String,
    pub final_url: String,
    pub matched_rule: Option<UrlRule>,
    pub quality: u8,
    pub level: MatchLevel,
    pub applied_global_rules: Vec<AppliedGlobalRule>,
    pub redirect_strategy: RedirectStrategy,
    pub steps: Vec<TraceStep>,
    /// Rule-level auto-redirect, falling back to the global default.
    pub auto_redirect: bool,
}

impl TransformationResult {
    pub fn changed(&self) -> bool {
        self.original_url != self.final_url
    }

    pub fn matcher(&self) -> Option<&str> {
        self.matched_rule.as_ref().map(|r| r.matcher.as_str())
    }
}
