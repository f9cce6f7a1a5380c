//! Global settings snapshot consumed by the engine.

use serde::{Deserialize, Serialize};
use serde_with::{DefaultOnNull, serde_as};
use validator::Validate;

use super::rule::{KeptQueryParam, SearchReplace, StaticQueryParam};

/// Strategy used when no rule matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedirectMode {
    /// Try a smart search redirect first.
    Search,
    /// Swap only the domain.
    #[default]
    Domain,
}

/// A global sub-rule with the stable id used for override and audit tracking.
///
/// `order` is only consulted for search & replace entries; static and kept
/// lists apply in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GlobalEntry<T: Validate> {
    #[validate(length(min = 1))]
    pub id: String,
    #[serde(default)]
    pub order: i32,
    #[serde(flatten)]
    #[validate(nested)]
    pub entry: T,
}

impl<T: Validate> GlobalEntry<T> {
    pub fn new(id: impl Into<String>, entry: T) -> Self {
        Self {
            id: id.into(),
            order: 0,
            entry,
        }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }
}

/// Heuristic for extracting a search term from an unmatched URL.
///
/// `order` is stored for the admin side; extraction tries pattern-bearing
/// rules first and otherwise keeps configuration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SmartSearchRule {
    /// Regex whose first capture group is the search term.
    #[serde(default)]
    #[validate(custom(function = "crate::domain::validation::validate_regex_pattern"))]
    pub pattern: Option<String>,
    #[serde(default)]
    pub order: i32,
    /// Search endpoint overriding `defaultSearchUrl`.
    #[serde(default)]
    pub search_url: Option<String>,
    /// Only consider URLs under this path prefix.
    #[serde(default)]
    pub path_pattern: Option<String>,
    #[serde(default)]
    pub skip_encoding: Option<bool>,
}

/// Installation-wide settings that apply to every evaluation.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSettings {
    #[serde(default)]
    #[validate(
        length(max = 500),
        custom(function = "crate::domain::validation::validate_optional_absolute_url")
    )]
    pub default_new_domain: String,
    #[serde(default)]
    pub default_redirect_mode: RedirectMode,
    #[serde(default)]
    pub case_sensitive_link_detection: bool,
    #[serde(default)]
    pub auto_redirect: bool,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    #[validate(nested)]
    pub global_search_and_replace: Vec<GlobalEntry<SearchReplace>>,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    #[validate(nested)]
    pub global_static_query_params: Vec<GlobalEntry<StaticQueryParam>>,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    #[validate(nested)]
    pub global_kept_query_params: Vec<GlobalEntry<KeptQueryParam>>,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub default_search_url: Option<String>,
    #[serde(default)]
    pub default_search_skip_encoding: bool,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    #[validate(nested)]
    pub smart_search_rules: Vec<SmartSearchRule>,
    /// Single-pattern heuristic predating `smartSearchRules`; tried after them.
    #[serde(default)]
    #[validate(custom(function = "crate::domain::validation::validate_regex_pattern"))]
    pub smart_search_regex: Option<String>,
}

impl GlobalSettings {
    pub fn with_domain(default_new_domain: impl Into<String>) -> Self {
        Self {
            default_new_domain: default_new_domain.into(),
            ..Default::default()
        }
    }

    /// Default domain without a trailing slash, or `None` when unset.
    pub fn new_domain_base(&self) -> Option<&str> {
        let trimmed = self.default_new_domain.trim().trim_end_matches('/');
        (!trimmed.is_empty()).then_some(trimmed)
    }
}
