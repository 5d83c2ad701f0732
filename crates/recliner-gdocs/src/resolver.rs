//! Spreadsheet URL resolution.
//!
//! Turns the human-facing address of a published spreadsheet
//! (`https://docs.google.com/spreadsheet/ccc?key=XXXX#gid=0`) into the
//! list-feed address that returns JSON. Anything that does not look like a
//! spreadsheet address is handed back untouched, so callers may pass a feed
//! URL directly.

use std::sync::OnceLock;

use regex::Regex;

/// Default host serving spreadsheet list feeds
pub const DEFAULT_FEED_BASE: &str = "https://spreadsheets.google.com";

/// Worksheet addressed by resolved feed URLs (always the first one)
pub const DEFAULT_WORKSHEET: u32 = 1;

fn spreadsheet_re() -> &'static Regex {
    static SPREADSHEET_RE: OnceLock<Regex> = OnceLock::new();
    SPREADSHEET_RE.get_or_init(|| Regex::new(r".*spreadsheet/ccc?.*key=([^#?&+]+)").unwrap())
}

/// Rewrites spreadsheet URLs into list-feed URLs
#[derive(Debug, Clone)]
pub struct UrlResolver {
    feed_base: String,
}

impl Default for UrlResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlResolver {
    /// Resolver targeting the public feed host
    pub fn new() -> Self {
        Self::with_feed_base(DEFAULT_FEED_BASE)
    }

    /// Resolver targeting a custom feed host (mirrors, local test servers)
    pub fn with_feed_base(feed_base: impl Into<String>) -> Self {
        let feed_base = feed_base.into().trim_end_matches('/').to_string();
        Self { feed_base }
    }

    /// Get the feed host
    pub fn feed_base(&self) -> &str {
        &self.feed_base
    }

    /// Extract the spreadsheet key from a spreadsheet URL
    ///
    /// Returns `None` when the URL is not recognized.
    pub fn extract_key(url: &str) -> Option<&str> {
        spreadsheet_re()
            .captures(url)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Build the list-feed URL for a spreadsheet key
    pub fn feed_url(&self, key: &str) -> String {
        format!(
            "{}/feeds/list/{}/{}/public/values?alt=json",
            self.feed_base, key, DEFAULT_WORKSHEET
        )
    }

    /// Resolve a URL to its feed URL, or return it unchanged
    pub fn resolve(&self, url: &str) -> String {
        match Self::extract_key(url) {
            Some(key) => self.feed_url(key),
            None => url.to_string(),
        }
    }
}

/// Resolve a URL against the default feed host
///
/// # Example
/// ```
/// use recliner_gdocs::resolve;
///
/// let url = resolve("https://docs.google.com/spreadsheet/ccc?key=ABC123#gid=0");
/// assert_eq!(
///     url,
///     "https://spreadsheets.google.com/feeds/list/ABC123/1/public/values?alt=json"
/// );
/// ```
pub fn resolve(url: &str) -> String {
    UrlResolver::new().resolve(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_spreadsheet_url() {
        let url = resolve(
            "https://docs.google.com/spreadsheet/ccc?key=0Aon3JiuouxLUdGlQVDJnbjZRSU1tUUJWOUZXRG53VkE#gid=0",
        );
        assert_eq!(
            url,
            "https://spreadsheets.google.com/feeds/list/0Aon3JiuouxLUdGlQVDJnbjZRSU1tUUJWOUZXRG53VkE/1/public/values?alt=json"
        );
    }

    #[test]
    fn test_feed_url_passes_through() {
        let feed = "https://spreadsheets.google.com/feeds/list/0Aon3JiuouxLUdDQwZE1JdV94cUd6NWtuZ0IyWTBjLWc/od6/public/values?alt=json";
        assert_eq!(resolve(feed), feed);
    }

    #[test]
    fn test_unrelated_input_passes_through() {
        for input in ["", "not a url", "https://example.com/data.json", "key=abc"] {
            assert_eq!(resolve(input), input);
        }
    }

    #[test]
    fn test_key_stops_at_separators() {
        assert_eq!(
            UrlResolver::extract_key("https://docs.google.com/spreadsheet/ccc?key=abc&hl=en"),
            Some("abc")
        );
        assert_eq!(
            UrlResolver::extract_key("https://docs.google.com/spreadsheet/ccc?key=abc+def"),
            Some("abc")
        );
        assert_eq!(
            UrlResolver::extract_key("https://docs.google.com/spreadsheet/ccc?key=abc?x=1"),
            Some("abc")
        );
        assert_eq!(
            UrlResolver::extract_key("https://docs.google.com/spreadsheet/ccc?key=abc#gid=3"),
            Some("abc")
        );
    }

    #[test]
    fn test_key_not_first_parameter() {
        let url = "https://docs.google.com/spreadsheet/ccc?hl=en_US&key=XYZ789&output=html";
        assert_eq!(UrlResolver::extract_key(url), Some("XYZ789"));
        assert!(resolve(url).contains("/feeds/list/XYZ789/1/"));
    }

    #[test]
    fn test_short_path_variant() {
        // `ccc?` makes the trailing `c` optional
        assert_eq!(
            UrlResolver::extract_key("https://docs.google.com/spreadsheet/cc?key=K1"),
            Some("K1")
        );
    }

    #[test]
    fn test_last_key_wins() {
        let url = "https://docs.google.com/spreadsheet/ccc?key=first&other=1&key=second";
        assert_eq!(UrlResolver::extract_key(url), Some("second"));
    }

    #[test]
    fn test_empty_key_is_unrecognized() {
        let url = "https://docs.google.com/spreadsheet/ccc?key=#gid=0";
        assert_eq!(UrlResolver::extract_key(url), None);
        assert_eq!(resolve(url), url);
    }

    #[test]
    fn test_custom_feed_base() {
        let resolver = UrlResolver::with_feed_base("http://127.0.0.1:8080/");
        assert_eq!(resolver.feed_base(), "http://127.0.0.1:8080");
        assert_eq!(
            resolver.resolve("https://docs.google.com/spreadsheet/ccc?key=K"),
            "http://127.0.0.1:8080/feeds/list/K/1/public/values?alt=json"
        );
    }
}
