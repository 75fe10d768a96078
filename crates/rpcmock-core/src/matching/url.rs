//! RPC endpoint URL patterns and method extraction.

use glob::{MatchOptions, Pattern};
use url::Url;

const PATTERN_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Join `base_url` with path segments, normalizing one trailing slash.
pub fn request_path(base_url: &str, type_name: &str, method: &str) -> String {
    let base = base_url.strip_suffix('/').unwrap_or(base_url);
    format!("{base}/{type_name}/{method}")
}

/// Pattern for one method: `{base}/{service}/{method}`, all parts literal
pub fn method_pattern(base_url: &str, type_name: &str, method_name: &str) -> String {
    request_path(
        &Pattern::escape(base_url),
        &Pattern::escape(type_name),
        &Pattern::escape(method_name),
    )
}

/// Pattern for every method of a service: `{base}/{service}/*`
///
/// Only the trailing `*` is a wildcard.
pub fn service_pattern(base_url: &str, type_name: &str) -> String {
    request_path(&Pattern::escape(base_url), &Pattern::escape(type_name), "*")
}

/// Method wire name from the URL's trailing path segment.
///
/// Query string and fragment are ignored; the segment is percent-decoded.
pub fn method_name_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.next_back()?;
    if segment.is_empty() {
        return None;
    }
    urlencoding::decode(segment).ok().map(|s| s.into_owned())
}

/// Glob match of a URL against a rule pattern; `*` does not cross `/`.
///
/// The query string is not part of the match.
pub fn url_matches(pattern: &str, url: &str) -> bool {
    let Ok(pattern) = Pattern::new(pattern) else {
        return false;
    };
    let without_query = url.split(['?', '#']).next().unwrap_or("");
    pattern.matches_with(without_query, PATTERN_OPTIONS)
}
