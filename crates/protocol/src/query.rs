//! Query-suffix construction and removal.
//!
//! Every attempt appends `format=json` (and `version=<v>` when known) to the
//! target URL. The exact suffix text is kept so it can be removed again from
//! the transport's resolved URL, yielding the canonical URL reported to callers
//! regardless of how many redirects were followed.

use crate::ProtocolVersion;

/// The exact text appended to a target URL for one attempt, joiner included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySuffix(String);

impl QuerySuffix {
    /// Builds the suffix for `url`.
    ///
    /// The joiner is `&` when `url` already contains a `?`, otherwise `?`.
    /// The version is inserted verbatim.
    pub fn new(url: &str, version: Option<&ProtocolVersion>) -> Self {
        let joiner = if url.contains('?') { '&' } else { '?' };
        let mut suffix = format!("{joiner}format=json");
        if let Some(version) = version {
            suffix.push_str("&version=");
            suffix.push_str(version.as_str());
        }
        Self(suffix)
    }

    /// Returns the suffix text, joiner included.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `url` with the suffix appended.
    pub fn apply(&self, url: &str) -> String {
        format!("{url}{}", self.0)
    }

    /// Removes the first occurrence of the suffix from a resolved URL.
    ///
    /// Returns `resolved` unchanged when a redirect rewrote the query so the
    /// suffix no longer appears verbatim.
    pub fn strip(&self, resolved: &str) -> String {
        resolved.replacen(self.0.as_str(), "", 1)
    }
}

impl std::fmt::Display for QuerySuffix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Option<ProtocolVersion> {
        ProtocolVersion::new(s)
    }

    #[test]
    fn test_suffix_without_existing_query() {
        let suffix = QuerySuffix::new("https://x/y", None);
        assert_eq!(suffix.apply("https://x/y"), "https://x/y?format=json");
    }

    #[test]
    fn test_suffix_with_existing_query() {
        let suffix = QuerySuffix::new("https://x/y?a=1", None);
        assert_eq!(suffix.apply("https://x/y?a=1"), "https://x/y?a=1&format=json");
    }

    #[test]
    fn test_suffix_with_version() {
        let suffix = QuerySuffix::new("https://x/y", v("3").as_ref());
        assert_eq!(suffix.as_str(), "?format=json&version=3");
    }

    #[test]
    fn test_strip_after_redirect() {
        let suffix = QuerySuffix::new("https://x/old", v("3").as_ref());
        assert_eq!(suffix.strip("https://x/y?format=json&version=3"), "https://x/y");
    }

    #[test]
    fn test_strip_keeps_pre_existing_query() {
        let suffix = QuerySuffix::new("https://x/y?a=1", v("3").as_ref());
        assert_eq!(
            suffix.strip("https://x/y?a=1&format=json&version=3"),
            "https://x/y?a=1"
        );
    }

    #[test]
    fn test_strip_is_noop_when_suffix_was_rewritten() {
        let suffix = QuerySuffix::new("https://x/y?a=1", None);
        assert_eq!(suffix.strip("https://x/z?format=json"), "https://x/z?format=json");
    }

    #[test]
    fn test_strip_removes_only_first_occurrence() {
        let suffix = QuerySuffix::new("https://x/y", None);
        assert_eq!(
            suffix.strip("https://x/y?format=json#?format=json"),
            "https://x/y#?format=json"
        );
    }
}
