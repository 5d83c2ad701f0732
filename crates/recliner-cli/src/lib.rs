//! recliner CLI - Command-line interface library
//!
//! This library provides the CLI functionality for recliner, including:
//! - Resolve: Turn a spreadsheet URL into its list-feed URL
//! - Fetch: Download a published spreadsheet and print it as a table
//! - Parse: Normalize a feed document saved on disk
//! - Ddoc: Print the design document
//!
//! # Binary Usage
//!
//! ```bash
//! # Show the feed URL for a spreadsheet
//! recliner resolve "https://docs.google.com/spreadsheet/ccc?key=XXXX#gid=0"
//!
//! # Fetch it, coercing a percentage column, as JSON
//! recliner fetch "https://docs.google.com/spreadsheet/ccc?key=XXXX" --percent share --format json
//!
//! # Parse a saved feed
//! recliner parse feed.json --omit-missing
//! ```

pub mod app;

// Re-export main entry point and types
pub use app::{
    ddoc_command, fetch_command, load_settings, parse_command, render_result, resolve_command,
};
pub use app::{run_cli, OutputFormat, TableArgs};
