//! Redirect rule entity and its per-rule sub-rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DefaultOnNull, serde_as};
use validator::Validate;

/// How a rule rewrites the incoming URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedirectType {
    /// Every matching URL goes to the absolute target.
    Wildcard,
    /// The matched path prefix is replaced, the rest of the path is kept.
    #[default]
    Partial,
    /// Only the origin is replaced.
    Domain,
}

impl RedirectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedirectType::Wildcard => "wildcard",
            RedirectType::Partial => "partial",
            RedirectType::Domain => "domain",
        }
    }

    /// Whether the target must be an absolute http(s) URL.
    pub fn requires_absolute_target(&self) -> bool {
        matches!(self, RedirectType::Wildcard | RedirectType::Domain)
    }
}

/// Literal search-and-replace applied to the URL being built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SearchReplace {
    #[validate(length(min = 1, max = 500))]
    pub search: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub replace: String,
    #[serde(default)]
    pub case_sensitive: bool,
}

impl SearchReplace {
    pub fn new(search: impl Into<String>, replace: impl Into<String>, case_sensitive: bool) -> Self {
        Self {
            search: search.into(),
            replace: replace.into(),
            case_sensitive,
        }
    }
}

/// Query parameter appended to every transformed URL in scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StaticQueryParam {
    #[validate(length(min = 1, max = 200))]
    pub key: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub value: String,
    /// Emit `value` as-is (for pre-encoded or path-like values).
    #[serde(default)]
    pub skip_encoding: bool,
}

impl StaticQueryParam {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            skip_encoding: false,
        }
    }
}

/// Whitelist entry that reinstates a discarded query parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct KeptQueryParam {
    #[validate(
        length(min = 1, max = 500),
        custom(function = "crate::domain::validation::validate_regex_pattern")
    )]
    pub key_pattern: String,
    #[serde(default)]
    #[validate(custom(function = "crate::domain::validation::validate_regex_pattern"))]
    pub value_pattern: Option<String>,
    /// Rename the parameter on output.
    #[serde(default)]
    pub target_key: Option<String>,
    #[serde(default)]
    pub skip_encoding: bool,
}

impl KeptQueryParam {
    pub fn new(key_pattern: impl Into<String>) -> Self {
        Self {
            key_pattern: key_pattern.into(),
            ..Default::default()
        }
    }

    pub fn renamed(mut self, target_key: impl Into<String>) -> Self {
        self.target_key = Some(target_key.into());
        self
    }
}

/// Starting set for the query-parameter stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// Carry the original parameters unchanged.
    Forward,
    /// Start empty, reinstate whitelisted parameters.
    Discard,
    /// Carry the original parameters.
    Keep,
}

/// A redirect rule as authored by the admin collaborator.
///
/// The engine only reads rules; `matcher` is a path prefix (optionally host
/// qualified, e.g. `old.com/docs`, and optionally carrying query constraints).
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "crate::domain::validation::validate_rule_target"))]
pub struct UrlRule {
    pub id: String,
    #[validate(
        length(min = 1, max = 500),
        custom(function = "crate::domain::validation::validate_matcher")
    )]
    pub matcher: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub target_url: Option<String>,
    #[serde(default)]
    pub redirect_type: RedirectType,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    #[validate(nested)]
    pub search_and_replace: Vec<SearchReplace>,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    #[validate(nested)]
    pub static_query_params: Vec<StaticQueryParam>,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    #[validate(nested)]
    pub kept_query_params: Vec<KeptQueryParam>,
    #[serde(default)]
    pub discard_query_params: bool,
    #[serde(default)]
    pub forward_query_params: bool,
    #[serde(default)]
    pub auto_redirect: bool,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub info_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UrlRule {
    /// Creates a rule with empty sub-rule lists and default flags.
    pub fn new(
        id: impl Into<String>,
        matcher: impl Into<String>,
        redirect_type: RedirectType,
        target_url: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            matcher: matcher.into(),
            target_url,
            redirect_type,
            search_and_replace: Vec::new(),
            static_query_params: Vec::new(),
            kept_query_params: Vec::new(),
            discard_query_params: false,
            forward_query_params: false,
            auto_redirect: false,
            info_text: None,
            created_at: Utc::now(),
        }
    }

    /// Resolves the query mode; forwarding wins when both flags are set.
    pub fn query_mode(&self) -> QueryMode {
        if self.forward_query_params {
            QueryMode::Forward
        } else if self.discard_query_params {
            QueryMode::Discard
        } else {
            QueryMode::Keep
        }
    }
}
