//! CLI Application logic
//!
//! Contains the command-line interface implementation.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use tracing::{debug, info, warn};

use recliner_couch::DesignDocument;
use recliner_gdocs::{
    parse_str, Dataset, FeedClient, FetchResult, MissingFieldPolicy, Settings, UrlResolver,
};

/// Output format for fetched tables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Tab-separated text with a header row
    #[default]
    Text,
    /// `{ records, fields, useMemoryStore }` JSON
    Json,
}

#[derive(Parser)]
#[command(name = "recliner")]
#[command(author, version, about = "Published spreadsheets as data tables", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the list-feed URL for a spreadsheet URL
    Resolve {
        /// Spreadsheet or feed URL
        url: String,
    },

    /// Fetch a published spreadsheet and print it
    Fetch {
        /// Spreadsheet or feed URL
        url: String,

        #[command(flatten)]
        table: TableArgs,
    },

    /// Normalize a feed document saved on disk
    Parse {
        /// Feed JSON file
        input: PathBuf,

        #[command(flatten)]
        table: TableArgs,
    },

    /// Print the design document as JSON
    Ddoc,
}

/// Options shared by commands producing a table
#[derive(Debug, Clone, Default, Args)]
pub struct TableArgs {
    /// Treat a field as a percentage column (repeatable)
    #[arg(short, long = "percent", value_name = "FIELD")]
    pub percent: Vec<String>,

    /// Only keep these fields (repeatable)
    #[arg(long = "columns", value_name = "FIELD")]
    pub columns: Vec<String>,

    /// Leave out fields an entry lacks instead of failing
    #[arg(long)]
    pub omit_missing: bool,

    /// Output format (text or json)
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl TableArgs {
    /// Overlay command-line flags on loaded settings
    fn apply(&self, settings: &mut Settings) {
        for field in &self.percent {
            settings
                .gdocs
                .col_types
                .insert(field.clone(), "percent".to_string());
        }
        if !self.columns.is_empty() {
            settings.gdocs.columns = Some(self.columns.clone());
        }
        if self.omit_missing {
            settings.gdocs.missing_fields = MissingFieldPolicy::Omit;
        }
    }
}

/// Run the CLI application
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = load_settings(cli.config.as_deref())?;

    let output = match cli.command {
        Commands::Resolve { url } => resolve_command(&url, &settings),
        Commands::Fetch { url, table } => {
            let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
            runtime.block_on(fetch_command(&url, &table, settings))?
        }
        Commands::Parse { input, table } => parse_command(&input, &table, settings)?,
        Commands::Ddoc => ddoc_command()?,
    };

    println!("{}", output);
    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// Resolve a spreadsheet URL against the configured feed host
pub fn resolve_command(url: &str, settings: &Settings) -> String {
    if UrlResolver::extract_key(url).is_none() {
        info!("URL not recognized as a spreadsheet address, using it as is");
    }
    settings.gdocs.resolver().resolve(url)
}

/// Fetch a spreadsheet and render it
pub async fn fetch_command(url: &str, table: &TableArgs, mut settings: Settings) -> Result<String> {
    table.apply(&mut settings);

    let client = FeedClient::from_settings(&settings.gdocs).context("Failed to build HTTP client")?;
    let result = client
        .fetch(&Dataset::new(url))
        .await
        .with_context(|| format!("Failed to fetch spreadsheet: {}", url))?;

    debug!(
        fields = result.fields.len(),
        records = result.records.len(),
        "spreadsheet fetched"
    );
    render_result(&result, table.format)
}

/// Parse a feed file and render it
pub fn parse_command(input: &Path, table: &TableArgs, mut settings: Settings) -> Result<String> {
    table.apply(&mut settings);

    let content = fs::read_to_string(input)
        .with_context(|| format!("Failed to read feed: {}", input.display()))?;
    let parsed = parse_str(&content, &settings.gdocs.parse_options())
        .with_context(|| format!("Failed to parse feed: {}", input.display()))?;

    render_result(&FetchResult::from(parsed), table.format)
}

/// Render the design document
pub fn ddoc_command() -> Result<String> {
    let ddoc = DesignDocument::new();
    ddoc.validate().context("Invalid design document")?;
    ddoc.to_json().context("Failed to serialize design document")
}

/// Render a fetched table in the requested format
pub fn render_result(result: &FetchResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(result).context("Failed to serialize table")
        }
        OutputFormat::Text => Ok(render_text(result)),
    }
}

fn render_text(result: &FetchResult) -> String {
    let mut lines = Vec::with_capacity(result.records.len() + 2);

    lines.push(
        result
            .fields
            .iter()
            .map(|f| f.id.as_str())
            .collect::<Vec<_>>()
            .join("\t"),
    );

    for record in &result.records {
        let row: Vec<String> = result
            .fields
            .iter()
            .map(|f| record.get(&f.id).map(ToString::to_string).unwrap_or_default())
            .collect();
        lines.push(row.join("\t"));
    }

    lines.push(format!(
        "{} fields, {} records",
        result.fields.len(),
        result.records.len()
    ));
    lines.join("\n")
}

/// Load settings from a config file, or from `recliner.toml` if present
pub fn load_settings(config_path: Option<&Path>) -> Result<Settings> {
    match config_path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            Settings::from_toml_str(&content)
                .with_context(|| format!("Failed to parse config: {}", path.display()))
        }
        None => {
            let candidates = ["recliner.toml", ".recliner.toml"];
            for candidate in candidates {
                if Path::new(candidate).exists() {
                    let content = fs::read_to_string(candidate)?;
                    match Settings::from_toml_str(&content) {
                        Ok(settings) => return Ok(settings),
                        Err(e) => warn!("Ignoring {}: {}", candidate, e),
                    }
                }
            }
            Ok(Settings::default())
        }
    }
}
