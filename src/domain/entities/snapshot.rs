//! Rules and settings read together as one consistent unit.

use serde::{Deserialize, Serialize};
use serde_with::{DefaultOnNull, serde_as};

use super::{GlobalSettings, UrlRule};

/// One version of the rule store: `{ "rules": [...], "settings": {...} }`.
///
/// Rules and settings always come from the same read, so a reload never
/// pairs rules of one version with settings of another.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSnapshot {
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub rules: Vec<UrlRule>,
    #[serde(default)]
    pub settings: GlobalSettings,
}

impl RuleSnapshot {
    pub fn new(rules: Vec<UrlRule>, settings: GlobalSettings) -> Self {
        Self { rules, settings }
    }
}
