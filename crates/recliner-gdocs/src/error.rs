//! Error types for the spreadsheet backend.

use thiserror::Error;

/// Result type for backend operations
pub type Result<T> = std::result::Result<T, GDocsError>;

/// Errors that can occur while fetching or normalizing a spreadsheet feed
#[derive(Debug, Error)]
pub enum GDocsError {
    /// HTTP request did not complete (unreachable host, timeout, TLS, ...)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Feed host answered with a non-success status
    #[error("Feed request to {url} failed ({status}): {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    /// Response body is not valid JSON
    #[error("Invalid JSON in feed: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON is valid but not shaped as `{ feed: { entry: [...] } }`
    #[error("Unexpected feed shape: {0}")]
    UnexpectedShape(String),

    /// A column key is present but its value wrapper carries no text
    #[error("Malformed cell for field '{field}' in entry {entry_index}")]
    MalformedCell { field: String, entry_index: usize },

    /// An entry lacks a column discovered from the first entry
    #[error("Entry {entry_index} has no value for field '{field}'")]
    SchemaInconsistency { field: String, entry_index: usize },

    /// The spawned fetch ended without delivering a result
    #[error("Fetch task did not complete: {0}")]
    Runtime(String),

    /// No backend registered under the requested type tag
    #[error("No backend registered for type: {0}")]
    UnknownBackend(String),

    /// Settings could not be parsed
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl GDocsError {
    /// True for failures of the network round trip itself
    pub fn is_network_failure(&self) -> bool {
        matches!(self, GDocsError::Http(_) | GDocsError::Status { .. })
    }

    /// True when the response arrived but could not be turned into a feed
    pub fn is_decode_failure(&self) -> bool {
        matches!(
            self,
            GDocsError::Json(_) | GDocsError::UnexpectedShape(_) | GDocsError::MalformedCell { .. }
        )
    }
}

impl From<toml::de::Error> for GDocsError {
    fn from(err: toml::de::Error) -> Self {
        GDocsError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let status = GDocsError::Status {
            status: 404,
            url: "http://localhost/feed".to_string(),
            body: "not found".to_string(),
        };
        assert!(status.is_network_failure());
        assert!(!status.is_decode_failure());

        let shape = GDocsError::UnexpectedShape("missing feed".to_string());
        assert!(shape.is_decode_failure());
        assert!(!shape.is_network_failure());

        let missing = GDocsError::SchemaInconsistency {
            field: "price".to_string(),
            entry_index: 2,
        };
        assert!(!missing.is_decode_failure());
        assert!(!missing.is_network_failure());
    }

    #[test]
    fn test_messages_name_field_and_entry() {
        let err = GDocsError::SchemaInconsistency {
            field: "price".to_string(),
            entry_index: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("price"));
        assert!(msg.contains('3'));
    }
}
