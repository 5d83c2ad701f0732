//! # recliner-gdocs
//!
//! Published spreadsheet backend for recliner - fetch a spreadsheet's list
//! feed and normalize it into fields and records for a data grid.
//!
//! ## Features
//!
//! - **URL Resolution**: `.../spreadsheet/ccc?key=XXXX` becomes the JSON list
//!   feed of the first worksheet; feed URLs pass through untouched
//! - **Fetching**: one async GET per dataset, awaited directly or spawned
//! - **Normalization**: fields from the first entry's `gsx$` keys, one record
//!   per entry, percentage columns coerced to fractions
//!
//! ## Example
//!
//! ```rust,no_run
//! use recliner_gdocs::{Dataset, FeedClient};
//!
//! # async fn run() -> recliner_gdocs::Result<()> {
//! let client = FeedClient::new()?;
//! let dataset = Dataset::new("https://docs.google.com/spreadsheet/ccc?key=XXXX#gid=0")
//!     .with_percent("share");
//!
//! let result = client.fetch(&dataset).await?;
//! for field in &result.fields {
//!     println!("{}", field.id);
//! }
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod parser;
pub mod resolver;
pub mod table;

// Re-exports
pub use backend::{Backend, BackendRegistry, Dataset, GDocsBackend, GDOCS_BACKEND};
pub use config::{GDocsSettings, Settings};
pub use error::{GDocsError, Result};
pub use fetcher::{FeedClient, PendingFetch};
pub use parser::{parse, parse_slice, parse_str, ColumnType, MissingFieldPolicy, ParseOptions};
pub use resolver::{resolve, UrlResolver, DEFAULT_FEED_BASE};
pub use table::{CellValue, FetchResult, Field, ParsedTable, Record};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
