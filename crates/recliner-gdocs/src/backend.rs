//! Backend abstraction and registry.
//!
//! A data-grid consumer is handed a [`BackendRegistry`] (or a single
//! [`Backend`]) at construction time and looks backends up by the type tag a
//! dataset carries.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::GDocsSettings;
use crate::error::{GDocsError, Result};
use crate::fetcher::{FeedClient, PendingFetch};
use crate::table::FetchResult;

/// Type tag of the published spreadsheet backend
pub const GDOCS_BACKEND: &str = "gdocs";

/// A dataset descriptor supplied by the caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Spreadsheet URL or feed URL
    pub url: String,
    /// Backend type tag (defaults to `gdocs` when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    /// Field id -> type tag, applied on top of the backend's own options
    #[serde(default, rename = "colTypes", skip_serializing_if = "HashMap::is_empty")]
    pub col_types: HashMap<String, String>,
}

impl Dataset {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Tag a field as a percentage column
    pub fn with_percent(mut self, field: impl Into<String>) -> Self {
        self.col_types
            .insert(field.into(), crate::parser::PERCENT_TAG.to_string());
        self
    }

    /// Backend tag, falling back to `gdocs`
    pub fn backend_type(&self) -> &str {
        self.backend.as_deref().unwrap_or(GDOCS_BACKEND)
    }
}

/// Something that can turn a dataset into a resident table
#[async_trait]
pub trait Backend: Send + Sync {
    /// Type tag datasets use to select this backend
    fn type_name(&self) -> &str;

    /// Fetch the whole dataset
    async fn fetch(&self, dataset: &Dataset) -> Result<FetchResult>;
}

/// Published spreadsheet backend
#[derive(Debug, Clone)]
pub struct GDocsBackend {
    client: FeedClient,
}

impl GDocsBackend {
    /// Backend with default settings
    pub fn new() -> Result<Self> {
        Ok(Self::with_client(FeedClient::new()?))
    }

    /// Backend configured from settings
    pub fn from_settings(settings: &GDocsSettings) -> Result<Self> {
        Ok(Self::with_client(FeedClient::from_settings(settings)?))
    }

    /// Backend around an existing client
    pub fn with_client(client: FeedClient) -> Self {
        Self { client }
    }

    /// Get the feed client
    pub fn client(&self) -> &FeedClient {
        &self.client
    }

    /// Start a background fetch
    pub fn spawn(&self, dataset: Dataset) -> PendingFetch {
        self.client.spawn(dataset)
    }
}

#[async_trait]
impl Backend for GDocsBackend {
    fn type_name(&self) -> &str {
        GDOCS_BACKEND
    }

    async fn fetch(&self, dataset: &Dataset) -> Result<FetchResult> {
        self.client.fetch(dataset).await
    }
}

/// Explicit set of backends, keyed by type tag
#[derive(Clone, Default)]
pub struct BackendRegistry {
    backends: HashMap<String, Arc<dyn Backend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend under its type name, replacing any previous one
    pub fn register(&mut self, backend: Arc<dyn Backend>) -> &mut Self {
        self.backends
            .insert(backend.type_name().to_string(), backend);
        self
    }

    /// Look up a backend by type tag
    pub fn get(&self, type_name: &str) -> Option<Arc<dyn Backend>> {
        self.backends.get(type_name).cloned()
    }

    /// Registered type tags, sorted
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.backends.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Fetch a dataset with the backend its tag selects
    pub async fn fetch(&self, dataset: &Dataset) -> Result<FetchResult> {
        let backend = self
            .get(dataset.backend_type())
            .ok_or_else(|| GDocsError::UnknownBackend(dataset.backend_type().to_string()))?;
        backend.fetch(dataset).await
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("backends", &self.type_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Field, ParsedTable};

    struct StaticBackend;

    #[async_trait]
    impl Backend for StaticBackend {
        fn type_name(&self) -> &str {
            "static"
        }

        async fn fetch(&self, _dataset: &Dataset) -> Result<FetchResult> {
            Ok(FetchResult::from(ParsedTable {
                fields: vec![Field::new("only")],
                records: Vec::new(),
            }))
        }
    }

    #[test]
    fn test_dataset_defaults_to_gdocs() {
        let dataset = Dataset::new("https://docs.google.com/spreadsheet/ccc?key=K");
        assert_eq!(dataset.backend_type(), GDOCS_BACKEND);
    }

    #[test]
    fn test_dataset_from_json() {
        let dataset: Dataset = serde_json::from_str(
            r#"{"url": "https://example.com/feed", "backend": "gdocs", "colTypes": {"score": "percent"}}"#,
        )
        .unwrap();
        assert_eq!(dataset.url, "https://example.com/feed");
        assert_eq!(dataset.col_types.get("score").map(String::as_str), Some("percent"));
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = BackendRegistry::new();
        registry
            .register(Arc::new(GDocsBackend::new().unwrap()))
            .register(Arc::new(StaticBackend));

        assert_eq!(registry.type_names(), vec!["gdocs", "static"]);
        assert!(registry.get("gdocs").is_some());
        assert!(registry.get("csv").is_none());
    }

    #[tokio::test]
    async fn test_registry_dispatch() {
        let mut registry = BackendRegistry::new();
        registry.register(Arc::new(StaticBackend));

        let mut dataset = Dataset::new("memory://");
        dataset.backend = Some("static".to_string());
        let result = registry.fetch(&dataset).await.unwrap();
        assert_eq!(result.fields, vec![Field::new("only")]);
        assert!(result.use_memory_store);
    }

    #[tokio::test]
    async fn test_registry_unknown_backend() {
        let registry = BackendRegistry::new();
        let err = registry.fetch(&Dataset::new("x")).await.unwrap_err();
        assert!(matches!(err, GDocsError::UnknownBackend(ref t) if t == "gdocs"));
    }
}
