//! Match quality scoring.
//!
//! Scores are relative: an exact rule match beats any prefix match, any rule
//! match beats a smart search, and a smart search beats a bare domain swap.

use super::matcher::MatchSpan;
use crate::domain::entities::MatchLevel;

pub const EXACT_QUALITY: u8 = 100;
/// Exact path, but the request carries query parameters the matcher does not name.
pub const EXACT_WITH_QUERY_QUALITY: u8 = 75;
pub const PREFIX_BASE_QUALITY: u8 = 40;
pub const PREFIX_COVERAGE_RANGE: u8 = 48;
pub const SMART_SEARCH_QUALITY: u8 = 25;
pub const DOMAIN_FALLBACK_QUALITY: u8 = 10;
pub const FAILED_QUALITY: u8 = 0;

/// Scores a rule match: 100 exact, 75 exact with extra query, 40..=87 for
/// prefixes by path coverage.
pub fn score_match(span: &MatchSpan) -> u8 {
    if span.exact {
        return if span.extra_query {
            EXACT_WITH_QUERY_QUALITY
        } else {
            EXACT_QUALITY
        };
    }

    let path_len = span.path_len.max(1);
    let covered = span.matched_len.min(path_len);
    let bonus = (usize::from(PREFIX_COVERAGE_RANGE) * covered) / path_len;

    // covered < path_len here, so bonus stays below the range.
    PREFIX_BASE_QUALITY + bonus as u8
}

pub fn level(quality: u8) -> MatchLevel {
    MatchLevel::from_quality(quality)
}
