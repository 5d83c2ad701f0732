//! Backend settings.
//!
//! Settings are usually loaded from `recliner.toml`:
//!
//! ```toml
//! [gdocs]
//! feed_base_url = "https://spreadsheets.google.com"
//! timeout_secs = 30
//! missing_fields = "omit"
//!
//! [gdocs.col_types]
//! price = "percent"
//! ```

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{GDocsError, Result};
use crate::parser::{MissingFieldPolicy, ParseOptions};
use crate::resolver::{UrlResolver, DEFAULT_FEED_BASE};

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Top-level settings structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Spreadsheet backend settings
    pub gdocs: GDocsSettings,
}

impl Settings {
    /// Parse settings from a TOML string
    ///
    /// `gdocs.timeout_secs = 0` is rejected: it would fail every request.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let settings: Self = toml::from_str(toml_str)?;
        if settings.gdocs.timeout_secs == 0 {
            return Err(GDocsError::Config(
                "gdocs.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(settings)
    }
}

/// Settings for the spreadsheet backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GDocsSettings {
    /// Host serving list feeds
    pub feed_base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// `User-Agent` header sent with feed requests
    pub user_agent: String,
    /// Handling of entries missing a discovered field
    pub missing_fields: MissingFieldPolicy,
    /// Field id -> type tag
    pub col_types: HashMap<String, String>,
    /// Restrict output to these fields
    pub columns: Option<Vec<String>>,
    /// Ignore `HTTP_PROXY`/`HTTPS_PROXY` and connect directly
    pub no_proxy: bool,
}

impl Default for GDocsSettings {
    fn default() -> Self {
        Self {
            feed_base_url: DEFAULT_FEED_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: default_user_agent(),
            missing_fields: MissingFieldPolicy::default(),
            col_types: HashMap::new(),
            columns: None,
            no_proxy: false,
        }
    }
}

impl GDocsSettings {
    /// Request timeout as a duration; zero falls back to the default
    pub fn timeout(&self) -> Duration {
        match self.timeout_secs {
            0 => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            secs => Duration::from_secs(secs),
        }
    }

    /// URL resolver for the configured feed host
    pub fn resolver(&self) -> UrlResolver {
        UrlResolver::with_feed_base(&self.feed_base_url)
    }

    /// Parser options derived from these settings
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            col_types: self.col_types.clone(),
            columns_to_use: self.columns.clone(),
            missing_fields: self.missing_fields,
        }
    }
}

/// `recliner/<version>`
pub fn default_user_agent() -> String {
    format!("recliner/{}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.gdocs.feed_base_url, DEFAULT_FEED_BASE);
        assert_eq!(settings.gdocs.timeout(), Duration::from_secs(30));
        assert!(settings.gdocs.user_agent.starts_with("recliner/"));
        assert_eq!(settings.gdocs.missing_fields, MissingFieldPolicy::Reject);
        assert!(settings.gdocs.col_types.is_empty());
    }

    #[test]
    fn test_load_settings_from_toml() {
        let toml = r#"
[gdocs]
feed_base_url = "http://localhost:9000/"
timeout_secs = 5
missing_fields = "omit"
columns = ["name", "price"]

[gdocs.col_types]
price = "percent"
"#;
        let settings = Settings::from_toml_str(toml).unwrap();

        assert_eq!(settings.gdocs.timeout_secs, 5);
        assert_eq!(settings.gdocs.missing_fields, MissingFieldPolicy::Omit);
        assert_eq!(settings.gdocs.resolver().feed_base(), "http://localhost:9000");

        let options = settings.gdocs.parse_options();
        assert_eq!(options.col_types.get("price").map(String::as_str), Some("percent"));
        assert_eq!(
            options.columns_to_use,
            Some(vec!["name".to_string(), "price".to_string()])
        );
    }

    #[test]
    fn test_partial_settings_keep_defaults() {
        let settings = Settings::from_toml_str("[gdocs]\ntimeout_secs = 2\n").unwrap();
        assert_eq!(settings.gdocs.timeout_secs, 2);
        assert_eq!(settings.gdocs.feed_base_url, DEFAULT_FEED_BASE);
    }

    #[test]
    fn test_empty_settings() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings.gdocs.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = Settings::from_toml_str("[gdocs]\ntimeout_secs = 0\n").unwrap_err();
        assert!(matches!(err, GDocsError::Config(ref msg) if msg.contains("timeout_secs")));
    }

    #[test]
    fn test_zero_timeout_uses_default() {
        let settings = GDocsSettings {
            timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(settings.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_no_proxy_setting() {
        assert!(!GDocsSettings::default().no_proxy);
        let settings = Settings::from_toml_str("[gdocs]\nno_proxy = true\n").unwrap();
        assert!(settings.gdocs.no_proxy);
    }

    #[test]
    fn test_invalid_settings() {
        let err = Settings::from_toml_str("[gdocs]\nmissing_fields = \"sometimes\"\n").unwrap_err();
        assert!(matches!(err, GDocsError::Config(_)));
    }
}
