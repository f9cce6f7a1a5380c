#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use url_migrator::domain::engine::snapshot::CompiledSnapshot;
use url_migrator::domain::entities::{
    GlobalSettings, KeptQueryParam, RedirectType, SearchReplace, StaticQueryParam, UrlRule,
};

pub const NEW_DOMAIN: &str = "https://new.com";

/// Rule with a fixed creation time so tie-breaks are deterministic.
pub fn rule(id: &str, matcher: &str, redirect_type: RedirectType, target: Option<&str>) -> UrlRule {
    let mut rule = UrlRule::new(id, matcher, redirect_type, target.map(str::to_string));
    rule.created_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    rule
}

pub fn wildcard(id: &str, matcher: &str, target: &str) -> UrlRule {
    rule(id, matcher, RedirectType::Wildcard, Some(target))
}

pub fn partial(id: &str, matcher: &str, target: Option<&str>) -> UrlRule {
    rule(id, matcher, RedirectType::Partial, target)
}

pub fn with_discard(mut rule: UrlRule, kept: Vec<KeptQueryParam>) -> UrlRule {
    rule.discard_query_params = true;
    rule.kept_query_params = kept;
    rule
}

pub fn with_static(mut rule: UrlRule, key: &str, value: &str) -> UrlRule {
    rule.static_query_params.push(StaticQueryParam::new(key, value));
    rule
}

pub fn with_replace(mut rule: UrlRule, search: &str, replace: &str) -> UrlRule {
    rule.search_and_replace
        .push(SearchReplace::new(search, replace, false));
    rule
}

pub fn settings() -> GlobalSettings {
    GlobalSettings::with_domain(NEW_DOMAIN)
}

pub fn snapshot(rules: Vec<UrlRule>) -> CompiledSnapshot {
    CompiledSnapshot::compile(rules, settings())
}

pub const SNAPSHOT_JSON: &str = r#"{
    "rules": [
        {
            "id": "foo",
            "matcher": "/foo",
            "targetUrl": "https://new.com/bar",
            "redirectType": "wildcard",
            "discardQueryParams": true,
            "keptQueryParams": [{ "keyPattern": "^file$", "targetKey": "id" }],
            "staticQueryParams": [{ "key": "source", "value": "migration" }],
            "createdAt": "2024-01-01T00:00:00Z"
        },
        {
            "id": "sites",
            "matcher": "/sites",
            "targetUrl": "/sites",
            "redirectType": "partial",
            "searchAndReplace": [{ "search": "/sites", "replace": "/teams" }],
            "autoRedirect": true,
            "createdAt": "2024-01-02T00:00:00Z"
        },
        {
            "id": "broken",
            "matcher": "/broken",
            "redirectType": "wildcard",
            "createdAt": "2024-01-03T00:00:00Z"
        }
    ],
    "settings": {
        "defaultNewDomain": "https://new.com",
        "defaultRedirectMode": "domain",
        "globalStaticQueryParams": [
            { "id": "gs-lang", "key": "lang", "value": "en" }
        ]
    }
}"#;
