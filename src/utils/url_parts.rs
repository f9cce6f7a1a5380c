//! Lossless URL splitting.
//!
//! The engine must carry paths and queries verbatim, so URLs are split on
//! their delimiters instead of being re-serialized through [`url::Url`],
//! which would normalize escapes.

/// Borrowed components of a raw URL.
///
/// `origin` is `scheme://authority` (or a bare `authority` when the input had
/// no scheme), empty for path-only inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrlParts<'a> {
    pub origin: &'a str,
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub fragment: Option<&'a str>,
}

impl<'a> UrlParts<'a> {
    /// Splits a raw URL.
    ///
    /// Accepts absolute (`https://host/path?q#f`), host-relative
    /// (`host/path`) and path-only (`/path?q`) inputs.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let parts = UrlParts::parse("https://old.com/foo?x=1#top");
    /// assert_eq!(parts.origin, "https://old.com");
    /// assert_eq!(parts.path, "/foo");
    /// assert_eq!(parts.query, Some("x=1"));
    /// assert_eq!(parts.fragment, Some("top"));
    /// ```
    pub fn parse(raw: &'a str) -> Self {
        let raw = raw.trim();

        let (rest, fragment) = match raw.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment)),
            None => (raw, None),
        };
        let (rest, query) = match rest.split_once('?') {
            Some((rest, query)) => (rest, Some(query)),
            None => (rest, None),
        };

        let authority_start = if rest.starts_with("//") {
            2
        } else if rest.starts_with('/') || rest.is_empty() {
            return Self {
                origin: "",
                path: rest,
                query,
                fragment,
            };
        } else {
            match rest.find("://") {
                Some(idx) if is_scheme(&rest[..idx]) => idx + 3,
                _ => 0,
            }
        };

        let path_start = rest[authority_start..]
            .find('/')
            .map(|i| i + authority_start)
            .unwrap_or(rest.len());

        Self {
            origin: &rest[..path_start],
            path: &rest[path_start..],
            query,
            fragment,
        }
    }

    /// Lowercased host without scheme, userinfo or port.
    pub fn host(&self) -> Option<String> {
        let authority = match self.origin.find("://") {
            Some(idx) => &self.origin[idx + 3..],
            None => self.origin.trim_start_matches('/'),
        };
        let authority = authority.rsplit_once('@').map_or(authority, |(_, h)| h);

        let host = if authority.starts_with('[') {
            authority
                .find(']')
                .map_or(authority, |end| &authority[..=end])
        } else {
            authority.split(':').next().unwrap_or(authority)
        };

        (!host.is_empty()).then(|| host.to_ascii_lowercase())
    }

    /// Path, query and fragment exactly as written (`/` for an empty path).
    pub fn path_and_rest(&self) -> String {
        let mut out = String::with_capacity(self.path.len() + 16);
        out.push_str(if self.path.is_empty() { "/" } else { self.path });
        if let Some(query) = self.query {
            out.push('?');
            out.push_str(query);
        }
        if let Some(fragment) = self.fragment {
            out.push('#');
            out.push_str(fragment);
        }
        out
    }
}

fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Replaces the origin of `raw` with `new_origin`, keeping path, query and
/// fragment verbatim.
pub fn swap_origin(raw: &str, new_origin: &str) -> String {
    let parts = UrlParts::parse(raw);
    format!(
        "{}{}",
        new_origin.trim_end_matches('/'),
        parts.path_and_rest()
    )
}

/// Appends a serialized query (without leading `?`) to `url`.
///
/// Uses `&` when `url` already carries a query and keeps any fragment last.
pub fn append_query(url: &str, query: &str) -> String {
    if query.is_empty() {
        return url.to_string();
    }

    let (base, fragment) = match url.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (url, None),
    };
    let separator = if base.contains('?') { '&' } else { '?' };

    let mut out = format!("{base}{separator}{query}");
    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }
    out
}
