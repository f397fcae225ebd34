//! # Gallery CLI (`gallery`)
//!
//! ## Usage
//!
//! ```bash
//! gallery --config ./config/gallery.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `gallery init` | Create the SQLite database and schema |
//! | `gallery ingest` | Fetch projects and images from the portfolio API |
//! | `gallery serve` | Start the HTTP query server |
//! | `gallery run` | Ingest, open the browser, then serve |
//! | `gallery query` | Look up the first record matching the given fields |
//! | `gallery export` | Dump all records as JSON |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gallery::config::{self, Config};
use gallery::models::RecordQuery;
use gallery::store::{RecordStore, SqliteRecordStore};
use gallery::{browser, export, ingest, migrate, server};

/// Gallery — fetch portfolio projects and serve them over HTTP.
#[derive(Parser)]
#[command(name = "gallery", version, about)]
struct Cli {
    /// Path to configuration file (TOML). Built-in defaults are used when
    /// the file does not exist.
    #[arg(long, global = true, default_value = "./config/gallery.toml")]
    config: PathBuf,

    /// Enable debug logging (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Idempotent.
    Init,

    /// Run the ingestion loop once and print a summary.
    ///
    /// Records are appended; nothing already stored is skipped.
    Ingest {
        /// Number of creator pages to walk (overrides `api.pages`).
        #[arg(long)]
        pages: Option<u32>,

        /// Portfolio API key (overrides `api.api_key`).
        #[arg(long, env = "GALLERY_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },

    /// Start the HTTP server.
    Serve,

    /// Ingest, open the configured browser URLs, then serve indefinitely.
    Run {
        /// Skip opening browser tabs.
        #[arg(long)]
        no_browser: bool,

        /// Portfolio API key (overrides `api.api_key`).
        #[arg(long, env = "GALLERY_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },

    /// Print the first record matching every given field, as JSON.
    ///
    /// Prints a zero-valued record when nothing matches.
    Query {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        filename: Option<String>,
        #[arg(long)]
        source_url: Option<String>,
    },

    /// Dump all records as JSON.
    Export {
        /// Output file. Writes to stdout when omitted.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn open_store(cfg: &Config) -> anyhow::Result<Arc<SqliteRecordStore>> {
    Ok(Arc::new(SqliteRecordStore::open(cfg).await?))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut cfg = config::load_config_or_default(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Ingest { pages, api_key } => {
            if let Some(pages) = pages {
                cfg.api.pages = pages;
            }
            if let Some(key) = api_key {
                cfg.api.api_key = key;
            }
            config::validate(&cfg)?;

            let store = open_store(&cfg).await?;
            let report = ingest::run_ingest(&cfg, store.clone()).await?;
            ingest::print_report(&report);
            store.pool().close().await;
        }
        Commands::Serve => {
            let store = open_store(&cfg).await?;
            server::run_server(&cfg, store).await?;
        }
        Commands::Run {
            no_browser,
            api_key,
        } => {
            if let Some(key) = api_key {
                cfg.api.api_key = key;
            }

            let store = open_store(&cfg).await?;
            let report = ingest::run_ingest(&cfg, store.clone()).await?;
            ingest::print_report(&report);
            println!(
                "Done! Now you may access the server via http://{}",
                cfg.server.bind
            );

            if cfg.browser.open && !no_browser {
                browser::open_all(&cfg.browser.urls);
            }

            server::run_server(&cfg, store).await?;
        }
        Commands::Query {
            title,
            description,
            filename,
            source_url,
        } => {
            let store = open_store(&cfg).await?;
            let query = RecordQuery {
                title,
                description,
                filename,
                source_url,
            };
            let record = store.find_first(&query).await?.unwrap_or_default();
            println!("{}", serde_json::to_string_pretty(&record)?);
            store.pool().close().await;
        }
        Commands::Export { output } => {
            let store = open_store(&cfg).await?;
            export::run_export(store.clone(), output.as_deref()).await?;
            store.pool().close().await;
        }
    }

    Ok(())
}
