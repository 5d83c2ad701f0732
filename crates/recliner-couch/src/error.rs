//! Error types for design document handling

use thiserror::Error;

/// Errors that can occur while building or reading design documents
#[derive(Error, Debug)]
pub enum CouchError {
    /// JSON (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A rewrite rule is not usable
    #[error("Invalid rewrite rule '{from}': {reason}")]
    InvalidRewrite { from: String, reason: String },
}

/// Result type for design document operations
pub type Result<T> = std::result::Result<T, CouchError>;
