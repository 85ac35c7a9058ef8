use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Distinguishes a broken pattern from a field that simply is not there.
/// A non-match is not an error: it comes back as `Ok(None)` and the caller
/// decides whether to skip the record.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid extraction pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("extracted value is not a valid integer: {0}")]
    Value(#[from] std::num::ParseIntError),
}

/// Extract the first capture group of `pattern` from `input` as an integer.
/// When multiple digit groups match, the first capture group wins.
#[allow(dead_code)]
pub fn extract_first_number(pattern: &str, input: &str) -> Result<Option<i64>, ExtractError> {
    let re = Regex::new(pattern)?;
    match re.captures(input).and_then(|caps| caps.get(1)) {
        Some(m) => Ok(Some(m.as_str().parse()?)),
        None => Ok(None),
    }
}

static APP_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/id=?([0-9]+)/?").expect("app id pattern"));

static PAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/page=([0-9]+)/").expect("page pattern"));

static AUTHOR_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/id([0-9]+)").expect("author id pattern"));

fn first_number(re: &Regex, input: &str) -> Option<i64> {
    let found = re
        .captures(input)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok());
    if found.is_none() {
        tracing::warn!("Unable to extract id using /{}/ from `{}`", re.as_str(), input);
    }
    found
}

/// App id from a store or feed URL, e.g. `.../id=389801252/json` or `.../id389801252`.
pub fn app_id_from_url(url: &str) -> Option<i64> {
    first_number(&APP_ID_RE, url)
}

/// Page number from a paginated feed URL, e.g. `.../page=3/id=.../json`.
pub fn page_from_url(url: &str) -> Option<i64> {
    first_number(&PAGE_RE, url)
}

/// Author id from an author profile URI, e.g. `.../reviews/id12345`.
pub fn author_id_from_uri(uri: &str) -> Option<i64> {
    first_number(&AUTHOR_ID_RE, uri)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_capture_group() {
        let n = extract_first_number(r"/page=([0-9]+)/id=([0-9]+)/", "/page=3/id=42/json")
            .unwrap();
        assert_eq!(n, Some(3));
    }

    #[test]
    fn missing_field_is_none_not_error() {
        let n = extract_first_number(r"/page=([0-9]+)/", "/id=42/json").unwrap();
        assert_eq!(n, None);
    }

    #[test]
    fn malformed_pattern_is_an_error() {
        let err = extract_first_number(r"(unclosed", "anything").unwrap_err();
        assert!(matches!(err, ExtractError::Pattern(_)));
    }

    #[test]
    fn app_id_accepts_both_url_shapes() {
        assert_eq!(
            app_id_from_url("http://itunes.apple.com/rss/customerreviews/id=389801252/json"),
            Some(389801252)
        );
        assert_eq!(
            app_id_from_url("https://itunes.apple.com/us/app/instagram/id389801252"),
            Some(389801252)
        );
        assert_eq!(app_id_from_url("https://example.com/no-id-here"), None);
    }

    #[test]
    fn page_and_author_ids() {
        assert_eq!(
            page_from_url("http://itunes.apple.com/us/rss/customerreviews/page=17/id=42/sortby=mostrecent/json"),
            Some(17)
        );
        assert_eq!(
            author_id_from_uri("https://itunes.apple.com/us/reviews/id52340561"),
            Some(52340561)
        );
    }
}
