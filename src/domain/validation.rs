//! Configuration boundary for rules and settings.
//!
//! Malformed records (bad regex, incoherent target/type) are rejected here so
//! they never reach the engine. The engine still guards itself by skipping an
//! offending sub-rule.

use std::borrow::Cow;

use regex::Regex;
use serde_json::json;
use url::Url;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::domain::entities::{GlobalSettings, RedirectType, UrlRule};
use crate::error::AppError;

/// Characters accepted in a matcher (RFC 3986 unreserved, reserved and `%`).
fn is_matcher_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "-._~:/?#[]@!$&'()*+,;=%".contains(c)
}

fn error(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}

pub(crate) fn is_absolute_http(value: &str) -> bool {
    (value.starts_with("http://") || value.starts_with("https://")) && Url::parse(value).is_ok()
}

pub fn validate_regex_pattern(pattern: &str) -> Result<(), ValidationError> {
    Regex::new(pattern)
        .map(|_| ())
        .map_err(|e| error("invalid_regex", format!("Invalid regular expression: {e}")))
}

pub fn validate_matcher(matcher: &str) -> Result<(), ValidationError> {
    let trimmed = matcher.trim();
    if trimmed.is_empty() {
        return Err(error("empty_matcher", "Matcher cannot be empty"));
    }
    if !trimmed.chars().all(is_matcher_char) {
        return Err(error(
            "invalid_matcher",
            "Matcher contains characters outside the URL character set",
        ));
    }
    Ok(())
}

pub fn validate_optional_absolute_url(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || is_absolute_http(value) {
        return Ok(());
    }
    Err(error(
        "invalid_url",
        "Must be an absolute http:// or https:// URL",
    ))
}

/// Checks that the target URL is coherent with the redirect type.
///
/// - `wildcard`: absolute http(s) URL
/// - `domain`: absolute http(s) URL without a path
/// - `partial`: path fragment starting with `/` or absolute URL (may be absent)
pub fn validate_rule_target(rule: &UrlRule) -> Result<(), ValidationError> {
    let target = rule.target_url.as_deref().map(str::trim).unwrap_or("");

    match rule.redirect_type {
        RedirectType::Wildcard | RedirectType::Domain if !is_absolute_http(target) => Err(error(
            "invalid_target",
            format!(
                "A {} rule requires an absolute http:// or https:// target URL",
                rule.redirect_type.as_str()
            ),
        )),
        RedirectType::Domain => {
            let has_path = Url::parse(target)
                .map(|u| u.path() != "/" && !u.path().is_empty())
                .unwrap_or(false);
            if has_path {
                Err(error(
                    "invalid_target",
                    "A domain rule target must not contain a path",
                ))
            } else {
                Ok(())
            }
        }
        RedirectType::Partial
            if !target.is_empty() && !target.starts_with('/') && !is_absolute_http(target) =>
        {
            Err(error(
                "invalid_target",
                "A partial rule target must start with '/' or be an absolute URL",
            ))
        }
        _ => Ok(()),
    }
}

fn errors_to_json(errors: &ValidationErrors) -> serde_json::Value {
    serde_json::to_value(errors).unwrap_or_else(|_| json!(errors.to_string()))
}

/// Validates one rule at the configuration boundary.
///
/// # Errors
///
/// Returns [`AppError::Configuration`] with the field errors as details.
pub fn validate_rule(rule: &UrlRule) -> Result<(), AppError> {
    rule.validate().map_err(|e| {
        AppError::configuration(
            format!("Rule '{}' ({}) is invalid", rule.id, rule.matcher),
            json!({ "rule_id": rule.id, "errors": errors_to_json(&e) }),
        )
    })
}

/// Validates the settings record at the configuration boundary.
///
/// # Errors
///
/// Returns [`AppError::Configuration`] with the field errors as details.
pub fn validate_settings(settings: &GlobalSettings) -> Result<(), AppError> {
    settings.validate().map_err(|e| {
        AppError::configuration(
            "Global settings are invalid",
            json!({ "errors": errors_to_json(&e) }),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{GlobalEntry, KeptQueryParam};

    fn rule(redirect_type: RedirectType, target: Option<&str>) -> UrlRule {
        UrlRule::new("r1", "/foo", redirect_type, target.map(str::to_string))
    }

    #[test]
    fn test_wildcard_requires_absolute_target() {
        assert!(validate_rule(&rule(RedirectType::Wildcard, Some("https://new.com/bar"))).is_ok());
        assert!(validate_rule(&rule(RedirectType::Wildcard, Some("/bar"))).is_err());
        assert!(validate_rule(&rule(RedirectType::Wildcard, None)).is_err());
    }

    #[test]
    fn test_domain_rejects_path() {
        assert!(validate_rule(&rule(RedirectType::Domain, Some("https://new.com"))).is_ok());
        assert!(validate_rule(&rule(RedirectType::Domain, Some("https://new.com/"))).is_ok());
        assert!(validate_rule(&rule(RedirectType::Domain, Some("https://new.com/x"))).is_err());
    }

    #[test]
    fn test_partial_accepts_fragment_or_absolute() {
        assert!(validate_rule(&rule(RedirectType::Partial, Some("/teams"))).is_ok());
        assert!(validate_rule(&rule(RedirectType::Partial, Some("https://new.com/x"))).is_ok());
        assert!(validate_rule(&rule(RedirectType::Partial, None)).is_ok());
        assert!(validate_rule(&rule(RedirectType::Partial, Some("teams"))).is_err());
    }

    #[test]
    fn test_bad_kept_regex_rejected() {
        let mut r = rule(RedirectType::Partial, Some("/teams"));
        r.kept_query_params.push(KeptQueryParam::new("(unclosed"));

        let err = validate_rule(&r).unwrap_err();
        assert!(matches!(err, AppError::Configuration { .. }));
    }

    #[test]
    fn test_matcher_character_set() {
        assert!(validate_matcher("/sites/my-site").is_ok());
        assert!(validate_matcher("old.com/docs?lang=de").is_ok());
        assert!(validate_matcher("/with space").is_err());
        assert!(validate_matcher("   ").is_err());
    }

    #[test]
    fn test_settings_default_domain_must_be_absolute() {
        assert!(validate_settings(&GlobalSettings::with_domain("https://new.com")).is_ok());
        assert!(validate_settings(&GlobalSettings::with_domain("new.com")).is_err());
        assert!(validate_settings(&GlobalSettings::default()).is_ok());
    }

    #[test]
    fn test_settings_global_kept_regex_checked() {
        let mut settings = GlobalSettings::with_domain("https://new.com");
        settings
            .global_kept_query_params
            .push(GlobalEntry::new("k1", KeptQueryParam::new("[")));

        assert!(validate_settings(&settings).is_err());
    }
}
