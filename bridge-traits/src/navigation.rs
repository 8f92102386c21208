//! Browser Navigation Abstraction
//!
//! The session core decides where to go; the host decides how to get there
//! (history API, webview, test recorder).

use serde::{Deserialize, Serialize};

/// Snapshot of the current browser location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserLocation {
    /// Path component, always starting with `/`
    pub path: String,
    /// Raw query string without the leading `?`
    pub query: String,
    /// Raw fragment without the leading `#`
    pub fragment: String,
}

impl BrowserLocation {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: String::new(),
            fragment: String::new(),
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.fragment = fragment.into();
        self
    }

    /// Whether this URL carries an identity-provider callback response:
    /// `code` or `error` in the query, or `access_token` in the fragment.
    ///
    /// Used to skip redirect completion entirely on ordinary page loads.
    pub fn carries_auth_callback(&self) -> bool {
        let query_has = |key: &str| {
            self.query
                .split('&')
                .any(|pair| pair.split('=').next() == Some(key))
        };
        query_has("code")
            || query_has("error")
            || self
                .fragment
                .split('&')
                .any(|pair| pair.split('=').next() == Some("access_token"))
    }
}

/// Navigation trait
pub trait Navigator: Send + Sync {
    /// Current browser location
    fn current_location(&self) -> BrowserLocation;

    /// Navigate to `path`. With `replace` the current history entry is
    /// replaced instead of pushed, so Back does not return to it.
    fn navigate(&self, path: &str, replace: bool);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_location_has_no_callback() {
        let location = BrowserLocation::new("/dashboard");
        assert!(!location.carries_auth_callback());
    }

    #[test]
    fn test_code_in_query_is_a_callback() {
        let location = BrowserLocation::new("/login").with_query("code=abc123&state=xyz");
        assert!(location.carries_auth_callback());
    }

    #[test]
    fn test_error_in_query_is_a_callback() {
        let location =
            BrowserLocation::new("/login").with_query("error=access_denied&state=xyz");
        assert!(location.carries_auth_callback());
    }

    #[test]
    fn test_access_token_in_fragment_is_a_callback() {
        let location = BrowserLocation::new("/").with_fragment("access_token=abc&type=bearer");
        assert!(location.carries_auth_callback());
    }

    #[test]
    fn test_lookalike_values_are_not_callbacks() {
        // "code" must be a parameter name, not a value or substring
        let location = BrowserLocation::new("/sensors").with_query("search=error+code");
        assert!(!location.carries_auth_callback());
    }
}
