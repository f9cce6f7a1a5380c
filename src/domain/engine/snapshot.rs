//! Immutable, pre-compiled view of rules and settings.
//!
//! Regexes and matchers are built once per snapshot so evaluation stays a
//! pure function of `(url, snapshot)`. Entries whose patterns do not compile
//! are skipped with a warning instead of failing the whole snapshot.

use regex::{NoExpand, Regex, RegexBuilder};
use tracing::warn;

use super::matcher::Matcher;
use crate::domain::entities::{
    GlobalEntry, GlobalSettings, KeptQueryParam, SearchReplace, SmartSearchRule,
    StaticQueryParam, UrlRule,
};

/// Literal search & replace with its case-aware regex.
#[derive(Debug, Clone)]
pub struct CompiledSearchReplace {
    /// Set for global entries.
    pub global_id: Option<String>,
    pub search: String,
    pub replace: String,
    pub case_sensitive: bool,
    pattern: Regex,
}

impl CompiledSearchReplace {
    fn compile(entry: &SearchReplace, global_id: Option<&str>) -> Option<Self> {
        if entry.search.is_empty() {
            return None;
        }

        let pattern = RegexBuilder::new(&regex::escape(&entry.search))
            .case_insensitive(!entry.case_sensitive)
            .build()
            .map_err(|e| warn!(search = %entry.search, error = %e, "Skipping search & replace entry"))
            .ok()?;

        Some(Self {
            global_id: global_id.map(str::to_string),
            search: entry.search.clone(),
            replace: entry.replace.clone(),
            case_sensitive: entry.case_sensitive,
            pattern,
        })
    }

    /// Replaces every occurrence; `$` in the replacement is literal.
    pub fn apply(&self, url: &str) -> String {
        self.pattern
            .replace_all(url, NoExpand(&self.replace))
            .into_owned()
    }

    /// Whether this rule-level entry suppresses the global entry `global`.
    pub fn overrides(&self, global: &CompiledSearchReplace) -> bool {
        self.search == global.search
            || (!self.case_sensitive
                && !global.case_sensitive
                && self.search.to_lowercase() == global.search.to_lowercase())
    }
}

/// Whitelist entry with compiled key/value patterns.
#[derive(Debug, Clone)]
pub struct CompiledKept {
    pub global_id: Option<String>,
    pub key_pattern: String,
    pub target_key: Option<String>,
    pub skip_encoding: bool,
    key: Regex,
    value: Option<Regex>,
}

impl CompiledKept {
    fn compile(entry: &KeptQueryParam, global_id: Option<&str>) -> Option<Self> {
        let key = Regex::new(&entry.key_pattern)
            .map_err(|e| warn!(pattern = %entry.key_pattern, error = %e, "Skipping kept parameter"))
            .ok()?;

        let value = match entry.value_pattern.as_deref().filter(|p| !p.is_empty()) {
            Some(pattern) => Some(
                Regex::new(pattern)
                    .map_err(|e| warn!(pattern, error = %e, "Skipping kept parameter"))
                    .ok()?,
            ),
            None => None,
        };

        Some(Self {
            global_id: global_id.map(str::to_string),
            key_pattern: entry.key_pattern.clone(),
            target_key: entry
                .target_key
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string),
            skip_encoding: entry.skip_encoding,
            key,
            value,
        })
    }

    pub fn matches_key(&self, key: &str) -> bool {
        self.key.is_match(key)
    }

    pub fn value_pattern(&self) -> Option<&Regex> {
        self.value.as_ref()
    }
}

/// Static parameter tagged with its global id, if any.
#[derive(Debug, Clone)]
pub struct StaticEntry {
    pub global_id: Option<String>,
    pub param: StaticQueryParam,
}

/// Smart-search heuristic with its optional compiled pattern.
#[derive(Debug, Clone)]
pub struct CompiledSmartSearch {
    pub rule: SmartSearchRule,
    pub pattern: Option<Regex>,
}

/// A rule plus everything the pipeline needs precompiled.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub rule: UrlRule,
    pub matcher: Matcher,
    pub search_replace: Vec<CompiledSearchReplace>,
    pub kept: Vec<CompiledKept>,
    pub statics: Vec<StaticEntry>,
}

impl CompiledRule {
    pub fn compile(rule: UrlRule) -> Self {
        Self {
            matcher: Matcher::parse(&rule.matcher),
            search_replace: rule
                .search_and_replace
                .iter()
                .filter_map(|e| CompiledSearchReplace::compile(e, None))
                .collect(),
            kept: rule
                .kept_query_params
                .iter()
                .filter_map(|e| CompiledKept::compile(e, None))
                .collect(),
            statics: rule
                .static_query_params
                .iter()
                .filter(|p| !p.key.is_empty())
                .map(|p| StaticEntry {
                    global_id: None,
                    param: p.clone(),
                })
                .collect(),
            rule,
        }
    }
}

/// Rules and settings as one consistent, read-only unit.
#[derive(Debug, Clone, Default)]
pub struct CompiledSnapshot {
    rules: Vec<CompiledRule>,
    settings: GlobalSettings,
    global_search_replace: Vec<CompiledSearchReplace>,
    global_kept: Vec<CompiledKept>,
    global_statics: Vec<StaticEntry>,
    smart_search: Vec<CompiledSmartSearch>,
    legacy_search: Option<Regex>,
}

fn compile_globals<T, C>(
    entries: &[GlobalEntry<T>],
    compile: impl Fn(&T, Option<&str>) -> Option<C>,
) -> Vec<C>
where
    T: validator::Validate,
{
    entries
        .iter()
        .filter_map(|g| compile(&g.entry, Some(&g.id)))
        .collect()
}

impl CompiledSnapshot {
    pub fn compile(rules: Vec<UrlRule>, settings: GlobalSettings) -> Self {
        let mut ordered: Vec<&GlobalEntry<SearchReplace>> =
            settings.global_search_and_replace.iter().collect();
        // Stable: equal `order` keeps configuration order.
        ordered.sort_by_key(|g| g.order);
        let global_search_replace = ordered
            .into_iter()
            .filter_map(|g| CompiledSearchReplace::compile(&g.entry, Some(&g.id)))
            .collect();

        let global_kept = compile_globals(&settings.global_kept_query_params, CompiledKept::compile);

        let global_statics = settings
            .global_static_query_params
            .iter()
            .filter(|g| !g.entry.key.is_empty())
            .map(|g| StaticEntry {
                global_id: Some(g.id.clone()),
                param: g.entry.clone(),
            })
            .collect();

        let mut smart_search: Vec<CompiledSmartSearch> = settings
            .smart_search_rules
            .iter()
            .filter_map(|rule| {
                let pattern = match rule.pattern.as_deref().filter(|p| !p.trim().is_empty()) {
                    Some(p) => Some(
                        Regex::new(p)
                            .map_err(|e| warn!(pattern = p, error = %e, "Skipping smart search rule"))
                            .ok()?,
                    ),
                    None => None,
                };
                Some(CompiledSmartSearch {
                    rule: rule.clone(),
                    pattern,
                })
            })
            .collect();
        // Stable: pattern-bearing rules first, configuration order otherwise.
        smart_search.sort_by_key(|s| s.pattern.is_none());

        let legacy_search = settings
            .smart_search_regex
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .and_then(|p| {
                Regex::new(p)
                    .map_err(|e| warn!(pattern = p, error = %e, "Ignoring smart search regex"))
                    .ok()
            });

        Self {
            rules: rules.into_iter().map(CompiledRule::compile).collect(),
            settings,
            global_search_replace,
            global_kept,
            global_statics,
            smart_search,
            legacy_search,
        }
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn settings(&self) -> &GlobalSettings {
        &self.settings
    }

    pub fn global_search_replace(&self) -> &[CompiledSearchReplace] {
        &self.global_search_replace
    }

    pub fn global_kept(&self) -> &[CompiledKept] {
        &self.global_kept
    }

    pub fn global_statics(&self) -> &[StaticEntry] {
        &self.global_statics
    }

    pub fn smart_search(&self) -> &[CompiledSmartSearch] {
        &self.smart_search
    }

    /// The single `smartSearchRegex` pattern, if configured and valid.
    pub fn legacy_search(&self) -> Option<&Regex> {
        self.legacy_search.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
