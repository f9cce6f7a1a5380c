//! Rule selection: the most specific prefix match wins.
//!
//! Paths are compared after percent-decoding and collapsing repeated slashes,
//! and case is folded (Unicode lowercase) on both sides unless link detection
//! is case sensitive. The normalized form keeps a byte map back into the raw
//! path so partial rules can cut the raw suffix without re-encoding it.

use std::cmp::Ordering;

use tracing::debug;
use url::form_urlencoded;

use super::snapshot::CompiledRule;
use crate::domain::entities::UrlRule;
use crate::utils::url_parts::UrlParts;

/// Decoded, slash-collapsed path with offsets into the raw path.
#[derive(Debug, Clone)]
pub(crate) struct NormalizedPath {
    bytes: Vec<u8>,
    /// `offsets[i]` is the raw byte index where normalized byte `i` starts;
    /// the extra last entry is the raw length.
    offsets: Vec<usize>,
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

impl NormalizedPath {
    pub(crate) fn new(raw: &str) -> Self {
        if raw.is_empty() {
            return Self {
                bytes: vec![b'/'],
                offsets: vec![0, 0],
            };
        }

        let raw_bytes = raw.as_bytes();
        let mut bytes = Vec::with_capacity(raw_bytes.len());
        let mut offsets = Vec::with_capacity(raw_bytes.len() + 1);
        let mut i = 0;

        while i < raw_bytes.len() {
            let (b, next) = match raw_bytes[i] {
                b'%' => match raw_bytes
                    .get(i + 1)
                    .and_then(|h| hex_value(*h))
                    .zip(raw_bytes.get(i + 2).and_then(|l| hex_value(*l)))
                {
                    Some((h, l)) => (h * 16 + l, i + 3),
                    None => (b'%', i + 1),
                },
                other => (other, i + 1),
            };

            if !(b == b'/' && bytes.last() == Some(&b'/')) {
                bytes.push(b);
                offsets.push(i);
            }
            i = next;
        }
        offsets.push(raw_bytes.len());

        Self { bytes, offsets }
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Length ignoring trailing slashes.
    pub(crate) fn trimmed_len(&self) -> usize {
        let mut len = self.bytes.len();
        while len > 0 && self.bytes[len - 1] == b'/' {
            len -= 1;
        }
        len
    }

    /// Where `prefix` ends in the path, as `(normalized, raw)` byte offsets.
    pub(crate) fn prefix_end(&self, raw: &str, prefix: &[u8], case_sensitive: bool) -> Option<(usize, usize)> {
        let end = if case_sensitive {
            self.bytes.starts_with(prefix).then_some(prefix.len())?
        } else {
            folded_prefix_end(&self.bytes, prefix)?
        };

        let raw_end = self.offsets[end];
        raw.is_char_boundary(raw_end).then_some((end, raw_end))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Char(char),
    /// Decoded byte that is not part of valid UTF-8.
    Byte(u8),
}

/// Lowercased units, each paired with the byte offset right after the source
/// character it came from.
fn folded_units(bytes: &[u8]) -> Vec<(Unit, usize)> {
    let mut units = Vec::with_capacity(bytes.len());
    let mut pos = 0;

    for chunk in bytes.utf8_chunks() {
        for c in chunk.valid().chars() {
            pos += c.len_utf8();
            units.extend(c.to_lowercase().map(|lower| (Unit::Char(lower), pos)));
        }
        for b in chunk.invalid() {
            pos += 1;
            units.push((Unit::Byte(*b), pos));
        }
    }
    units
}

/// Case-insensitive prefix test; the match must end on a character boundary
/// of `path`.
fn folded_prefix_end(path: &[u8], prefix: &[u8]) -> Option<usize> {
    if path.starts_with(prefix) {
        return Some(prefix.len());
    }

    let path_units = folded_units(path);
    let prefix_units = folded_units(prefix);
    let n = prefix_units.len();
    if n == 0 {
        return Some(0);
    }
    if path_units.len() < n {
        return None;
    }

    let same = path_units
        .iter()
        .zip(&prefix_units)
        .all(|((a, _), (b, _))| a == b);
    if !same {
        return None;
    }

    let end = path_units[n - 1].1;
    // A character lowercasing to several units must be consumed whole.
    match path_units.get(n) {
        Some((_, next_end)) if *next_end == end => None,
        _ => Some(end),
    }
}

fn keys_equal(a: &str, b: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        a == b
    } else {
        a == b || a.to_lowercase() == b.to_lowercase()
    }
}

fn decode_pairs(query: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// An incoming URL prepared for matching.
#[derive(Debug, Clone)]
pub struct RequestUrl<'a> {
    pub raw: &'a str,
    pub parts: UrlParts<'a>,
    pub host: Option<String>,
    pub(crate) path: NormalizedPath,
    pub query: Vec<(String, String)>,
}

impl<'a> RequestUrl<'a> {
    pub fn parse(raw: &'a str) -> Self {
        let parts = UrlParts::parse(raw);
        Self {
            raw,
            host: parts.host(),
            path: NormalizedPath::new(parts.path),
            query: parts.query.map(decode_pairs).unwrap_or_default(),
            parts,
        }
    }
}

/// A parsed rule matcher.
///
/// `old.com/docs` is host qualified; `/search?lang=de` carries a query
/// constraint. Trailing `/` and `*` are not significant.
#[derive(Debug, Clone)]
pub struct Matcher {
    host: Option<String>,
    path: Vec<u8>,
    query: Vec<(String, String)>,
    specificity: usize,
}

impl Matcher {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let (location, query) = match trimmed.split_once('?') {
            Some((location, query)) => (location, Some(query)),
            None => (trimmed, None),
        };

        let (host, path) = if location.starts_with('/') {
            (None, location)
        } else {
            match location.find('/') {
                Some(idx) => (Some(location[..idx].to_ascii_lowercase()), &location[idx..]),
                None => (Some(location.to_ascii_lowercase()), ""),
            }
        };

        let mut path = if path.is_empty() {
            Vec::new()
        } else {
            NormalizedPath::new(path).bytes
        };
        while matches!(path.last(), Some(b'/') | Some(b'*')) {
            path.pop();
        }

        Self {
            host: host.filter(|h| !h.is_empty()),
            path,
            query: query.map(decode_pairs).unwrap_or_default(),
            specificity: trimmed.trim_end_matches(['/', '*']).chars().count(),
        }
    }

    /// Length of the matcher string, the primary specificity measure.
    pub fn specificity(&self) -> usize {
        self.specificity
    }

    fn query_satisfied(&self, request: &RequestUrl<'_>, case_sensitive: bool) -> bool {
        self.query.iter().all(|(key, value)| {
            request
                .query
                .iter()
                .any(|(k, v)| keys_equal(k, key, case_sensitive) && v == value)
        })
    }

    fn has_extra_query(&self, request: &RequestUrl<'_>) -> bool {
        request
            .query
            .iter()
            .any(|(k, _)| !self.query.iter().any(|(key, _)| keys_equal(key, k, false)))
    }

    /// Matches one request; `None` when the rule does not apply.
    pub(crate) fn apply(&self, request: &RequestUrl<'_>, case_sensitive: bool) -> Option<MatchSpan> {
        if let Some(host) = &self.host
            && request.host.as_deref() != Some(host.as_str())
        {
            return None;
        }

        let (matched_len, prefix_end) = request
            .path
            .prefix_end(request.parts.path, &self.path, case_sensitive)?;

        if !self.query_satisfied(request, case_sensitive) {
            return None;
        }

        let path_len = request.path.trimmed_len();

        Some(MatchSpan {
            prefix_end,
            matched_len,
            path_len,
            exact: matched_len >= path_len,
            extra_query: self.has_extra_query(request),
        })
    }
}

/// Where and how well a matcher covered the request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchSpan {
    /// Raw byte offset in the request path where the matched prefix ends.
    pub prefix_end: usize,
    pub matched_len: usize,
    pub path_len: usize,
    pub exact: bool,
    pub extra_query: bool,
}

/// The selected rule and its match span.
#[derive(Debug, Clone, Copy)]
pub struct RuleMatch<'s> {
    pub rule: &'s CompiledRule,
    pub span: MatchSpan,
}

/// Deterministic tie-break for equally specific rules: earlier `createdAt`,
/// then smaller `id`. Snapshot order decides what remains.
fn tie_break(candidate: &UrlRule, best: &UrlRule) -> Ordering {
    candidate
        .created_at
        .cmp(&best.created_at)
        .then_with(|| candidate.id.cmp(&best.id))
}

/// Selects the most specific rule applying to `request`.
pub fn select_rule<'s>(
    request: &RequestUrl<'_>,
    rules: &'s [CompiledRule],
    case_sensitive: bool,
) -> Option<RuleMatch<'s>> {
    let mut best: Option<RuleMatch<'s>> = None;

    for rule in rules {
        let Some(span) = rule.matcher.apply(request, case_sensitive) else {
            continue;
        };

        let replace = match &best {
            None => true,
            Some(current) => {
                let specificity = rule.matcher.specificity();
                let best_specificity = current.rule.matcher.specificity();
                if specificity != best_specificity {
                    specificity > best_specificity
                } else {
                    debug!(
                        candidate = %rule.rule.id,
                        selected = %current.rule.rule.id,
                        specificity,
                        "Equally specific rules match the same URL"
                    );
                    tie_break(&rule.rule, &current.rule.rule) == Ordering::Less
                }
            }
        };

        if replace {
            best = Some(RuleMatch { rule, span });
        }
    }

    best
}

/// Convenience wrapper returning only the selected rule.
pub fn match_rule<'s>(
    url: &str,
    rules: &'s [CompiledRule],
    case_sensitive: bool,
) -> Option<&'s UrlRule> {
    let request = RequestUrl::parse(url);
    select_rule(&request, rules, case_sensitive).map(|m| &m.rule.rule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::engine::snapshot::CompiledSnapshot;
    use crate::domain::entities::{GlobalSettings, RedirectType};
    use chrono::{TimeZone, Utc};

    fn rule(id: &str, matcher: &str) -> UrlRule {
        let mut rule = UrlRule::new(
            id,
            matcher,
            RedirectType::Partial,
            Some("/target".to_string()),
        );
        rule.created_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        rule
    }

    fn compile(rules: Vec<UrlRule>) -> CompiledSnapshot {
        CompiledSnapshot::compile(rules, GlobalSettings::with_domain("https://new.com"))
    }

    #[test]
    fn test_normalized_path_collapses_and_decodes() {
        let path = NormalizedPath::new("/a//b%20c/");
        assert_eq!(path.as_bytes(), b"/a/b c/");
        assert_eq!(path.trimmed_len(), 6);
    }

    #[test]
    fn test_prefix_end_maps_to_raw_offset() {
        let raw = "/Sites%2Dx//my-site";
        let path = NormalizedPath::new(raw);

        let (_, end) = path.prefix_end(raw, b"/sites-x", false).unwrap();
        assert_eq!(&raw[end..], "//my-site");
    }

    #[test]
    fn test_prefix_end_respects_case_sensitivity() {
        let raw = "/Sites/x";
        let path = NormalizedPath::new(raw);

        assert!(path.prefix_end(raw, b"/sites", true).is_none());
        assert!(path.prefix_end(raw, b"/Sites", true).is_some());
    }

    #[test]
    fn test_longest_matcher_wins() {
        let snapshot = compile(vec![rule("a", "/docs"), rule("b", "/docs/api"), rule("c", "/")]);

        let selected = match_rule("https://old.com/docs/api/v1", snapshot.rules(), false).unwrap();
        assert_eq!(selected.id, "b");

        let selected = match_rule("https://old.com/docs/guide", snapshot.rules(), false).unwrap();
        assert_eq!(selected.id, "a");

        let selected = match_rule("https://old.com/other", snapshot.rules(), false).unwrap();
        assert_eq!(selected.id, "c");
    }

    #[test]
    fn test_no_match_returns_none() {
        let snapshot = compile(vec![rule("a", "/docs")]);
        assert!(match_rule("https://old.com/unknown", snapshot.rules(), false).is_none());
    }

    #[test]
    fn test_case_folding() {
        let snapshot = compile(vec![rule("a", "/Docs")]);

        assert!(match_rule("https://old.com/docs/x", snapshot.rules(), false).is_some());
        assert!(match_rule("https://old.com/docs/x", snapshot.rules(), true).is_none());
        assert!(match_rule("https://old.com/Docs/x", snapshot.rules(), true).is_some());
    }

    #[test]
    fn test_case_folding_beyond_ascii() {
        let snapshot = compile(vec![rule("a", "/Über")]);

        assert!(match_rule("https://old.com/über/x", snapshot.rules(), false).is_some());
        assert!(match_rule("https://old.com/%C3%BCber/x", snapshot.rules(), false).is_some());
        assert!(match_rule("https://old.com/über/x", snapshot.rules(), true).is_none());
    }

    #[test]
    fn test_folded_prefix_maps_to_raw_offset() {
        let raw = "/%C3%9Cber/Straße";
        let path = NormalizedPath::new(raw);

        let (normalized, end) = path.prefix_end(raw, "/über".as_bytes(), false).unwrap();
        assert_eq!(normalized, "/Über".len());
        assert_eq!(&raw[end..], "/Straße");
    }

    #[test]
    fn test_folded_prefix_stops_on_character_boundary() {
        // 'İ' lowercases to two chars; a prefix holding only the first does not match.
        let path = NormalizedPath::new("/İx");
        assert!(path.prefix_end("/İx", b"/i", false).is_none());
        assert!(path.prefix_end("/İx", "/i\u{307}".as_bytes(), false).is_some());
    }

    #[test]
    fn test_tie_break_prefers_earlier_creation() {
        let mut older = rule("z-older", "/same");
        older.created_at = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let newer = rule("a-newer", "/SAME");

        let snapshot = compile(vec![newer, older]);
        let selected = match_rule("/same/page", snapshot.rules(), false).unwrap();
        assert_eq!(selected.id, "z-older");
    }

    #[test]
    fn test_tie_break_falls_back_to_id() {
        let snapshot = compile(vec![rule("b", "/same"), rule("a", "/same")]);
        let selected = match_rule("/same", snapshot.rules(), false).unwrap();
        assert_eq!(selected.id, "a");
    }

    #[test]
    fn test_host_qualified_matcher() {
        let snapshot = compile(vec![rule("host", "old.com/docs"), rule("path", "/docs")]);

        let selected = match_rule("https://OLD.com/docs/x", snapshot.rules(), false).unwrap();
        assert_eq!(selected.id, "host");

        let selected = match_rule("https://other.com/docs/x", snapshot.rules(), false).unwrap();
        assert_eq!(selected.id, "path");
    }

    #[test]
    fn test_query_constraint() {
        let snapshot = compile(vec![rule("de", "/search?lang=de"), rule("any", "/search")]);

        let selected = match_rule("/search?q=x&lang=de", snapshot.rules(), false).unwrap();
        assert_eq!(selected.id, "de");

        let selected = match_rule("/search?lang=en", snapshot.rules(), false).unwrap();
        assert_eq!(selected.id, "any");
    }

    #[test]
    fn test_trailing_slash_and_star_ignored() {
        let snapshot = compile(vec![rule("a", "/docs/*")]);
        assert!(match_rule("/docs", snapshot.rules(), false).is_some());
    }

    #[test]
    fn test_span_exact_and_extra_query() {
        let matcher = Matcher::parse("/docs");

        let request = RequestUrl::parse("https://old.com/docs/");
        let span = matcher.apply(&request, false).unwrap();
        assert!(span.exact);
        assert!(!span.extra_query);

        let request = RequestUrl::parse("https://old.com/docs?x=1");
        let span = matcher.apply(&request, false).unwrap();
        assert!(span.exact);
        assert!(span.extra_query);

        let request = RequestUrl::parse("https://old.com/docs/page");
        let span = matcher.apply(&request, false).unwrap();
        assert!(!span.exact);
        assert_eq!(span.matched_len, 5);
        assert_eq!(span.path_len, 10);
    }
}
