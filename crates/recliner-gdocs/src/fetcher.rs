//! Feed fetching.
//!
//! [`FeedClient`] resolves a dataset URL, issues exactly one GET against the
//! feed host and parses the JSON body. Callers inside a runtime can `await`
//! [`FeedClient::fetch`] directly; [`FeedClient::spawn`] starts the request in
//! the background and hands back a [`PendingFetch`] that completes once.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use reqwest::header::ACCEPT;
use reqwest::Client;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::debug;

use crate::backend::Dataset;
use crate::config::GDocsSettings;
use crate::error::{GDocsError, Result};
use crate::parser::{self, ParseOptions};
use crate::resolver::UrlResolver;
use crate::table::FetchResult;

/// Client for published spreadsheet feeds
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct FeedClient {
    /// HTTP client
    client: Client,
    /// Spreadsheet URL -> feed URL
    resolver: UrlResolver,
    /// Parser options applied to every fetch
    options: ParseOptions,
}

impl FeedClient {
    /// Create a client with default settings
    pub fn new() -> Result<Self> {
        Self::from_settings(&GDocsSettings::default())
    }

    /// Create a client from backend settings
    pub fn from_settings(settings: &GDocsSettings) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(settings.timeout())
            .user_agent(settings.user_agent.as_str());
        if settings.no_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            resolver: settings.resolver(),
            options: settings.parse_options(),
        })
    }

    /// Replace the URL resolver
    pub fn with_resolver(mut self, resolver: UrlResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replace the parser options
    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// Get the URL resolver
    pub fn resolver(&self) -> &UrlResolver {
        &self.resolver
    }

    /// Get the parser options
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// GET a URL and decode the body as JSON
    ///
    /// Non-2xx answers become [`GDocsError::Status`] carrying the body text.
    pub async fn fetch_json(&self, url: &str) -> Result<Value> {
        debug!(%url, "requesting feed");

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GDocsError::Status {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        debug!(%url, status = status.as_u16(), bytes = bytes.len(), "feed received");

        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Fetch and normalize a dataset
    ///
    /// # Returns
    /// Fields, records and `use_memory_store = true`
    pub async fn fetch(&self, dataset: &Dataset) -> Result<FetchResult> {
        let url = self.resolver.resolve(&dataset.url);
        let doc = self.fetch_json(&url).await?;

        let options = self.options_for(dataset);
        let table = parser::parse(&doc, &options)?;
        debug!(
            fields = table.fields.len(),
            records = table.records.len(),
            "feed parsed"
        );

        Ok(FetchResult::from(table))
    }

    /// Start fetching in the background
    ///
    /// Must be called from within a tokio runtime; otherwise the returned
    /// handle resolves to [`GDocsError::Runtime`]. Dropping the handle does
    /// not abort the request.
    pub fn spawn(&self, dataset: Dataset) -> PendingFetch {
        let (tx, rx) = oneshot::channel();

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let client = self.clone();
                handle.spawn(async move {
                    let result = client.fetch(&dataset).await;
                    // Receiver may be gone; the result is then discarded
                    let _ = tx.send(result);
                });
            }
            Err(e) => {
                let _ = tx.send(Err(GDocsError::Runtime(e.to_string())));
            }
        }

        PendingFetch { rx }
    }

    /// Client options overlaid with the dataset's own column types
    fn options_for(&self, dataset: &Dataset) -> ParseOptions {
        if dataset.col_types.is_empty() {
            return self.options.clone();
        }

        let mut options = self.options.clone();
        options.col_types.extend(
            dataset
                .col_types
                .iter()
                .map(|(field, tag)| (field.clone(), tag.clone())),
        );
        options
    }
}

/// Handle to a fetch started with [`FeedClient::spawn`]
///
/// Resolves exactly once, with the table or with the failure.
#[derive(Debug)]
pub struct PendingFetch {
    rx: oneshot::Receiver<Result<FetchResult>>,
}

impl PendingFetch {
    /// Block the current thread until the fetch completes
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context
    /// (inside a tokio runtime). Await the handle there instead.
    pub fn wait_blocking(self) -> Result<FetchResult> {
        self.rx.blocking_recv().unwrap_or_else(|_| Err(task_dropped()))
    }
}

impl Future for PendingFetch {
    type Output = Result<FetchResult>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or_else(|_| Err(task_dropped())))
    }
}

fn task_dropped() -> GDocsError {
    GDocsError::Runtime("fetch task ended without a result".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::DEFAULT_FEED_BASE;

    #[test]
    fn test_client_default() {
        let client = FeedClient::new().unwrap();
        assert_eq!(client.resolver().feed_base(), DEFAULT_FEED_BASE);
        assert!(client.options().col_types.is_empty());
    }

    #[test]
    fn test_dataset_col_types_overlay() {
        let client = FeedClient::new()
            .unwrap()
            .with_options(ParseOptions::default().with_percent("a").with_col_type("b", "text"));

        let mut dataset = Dataset::new("http://localhost/feed");
        dataset.col_types.insert("b".to_string(), "percent".to_string());

        let options = client.options_for(&dataset);
        assert_eq!(options.col_types.get("a").map(String::as_str), Some("percent"));
        assert_eq!(options.col_types.get("b").map(String::as_str), Some("percent"));
    }

    #[test]
    fn test_spawn_outside_runtime() {
        let client = FeedClient::new().unwrap();
        let pending = client.spawn(Dataset::new("http://localhost/feed"));
        let err = pending.wait_blocking().unwrap_err();
        assert!(matches!(err, GDocsError::Runtime(_)));
    }

    #[tokio::test]
    #[should_panic]
    async fn test_wait_blocking_inside_runtime_panics() {
        let client = FeedClient::new().unwrap();
        let pending = client.spawn(Dataset::new("http://127.0.0.1:9/feed"));
        let _ = pending.wait_blocking();
    }
}
