//! Route pattern tokenizing.
//!
//! A pattern such as `/p/:lang/doc` or `/static/*filepath` is split into its
//! `/`-separated segments. Three kinds of token exist:
//!
//! - static text, matching only an identical segment
//! - `:name`, matching any single segment
//! - `*name`, matching the remainder of the path; it always ends the pattern

/// Leading character of a named parameter segment, e.g. `:lang`
pub const PARAM_PREFIX: char = ':';

/// Leading character of a wildcard segment, e.g. `*filepath`
pub const WILDCARD_PREFIX: char = '*';

/// Splits `pattern` into its segments.
///
/// Empty segments are dropped, so `/a//b/` and `/a/b` yield the same tokens.
/// Everything after the first wildcard segment is ignored. Never fails: an
/// empty pattern yields no tokens.
///
/// The same function splits concrete request paths before matching.
///
/// ```
/// use sprig_web::pattern::parse_pattern;
///
/// assert_eq!(parse_pattern("/p/:lang/doc"), vec!["p", ":lang", "doc"]);
/// assert_eq!(parse_pattern("/static/*filepath/ignored"), vec!["static", "*filepath"]);
/// ```
pub fn parse_pattern(pattern: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    for segment in pattern.split('/').filter(|segment| !segment.is_empty()) {
        tokens.push(segment);
        if is_wildcard(segment) {
            break;
        }
    }
    tokens
}

/// Whether `segment` is a `:name` or `*name` token.
#[inline]
pub fn is_dynamic(segment: &str) -> bool {
    segment.starts_with([PARAM_PREFIX, WILDCARD_PREFIX])
}

/// Whether `segment` is a `*name` token.
#[inline]
pub fn is_wildcard(segment: &str) -> bool {
    segment.starts_with(WILDCARD_PREFIX)
}
