//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use super::ingest_cmd;
use super::output::{Output, OutputFormat};
use crate::storage::Config;

#[derive(Parser)]
#[command(name = "ege-ingest")]
#[command(author, version, about = "Load exam-problem Markdown documents into a PocketBase task bank")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Config file (defaults to ./ege-ingest.toml, then the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// PocketBase URL
    #[arg(long, global = true, env = "EGE_PB_URL")]
    pub url: Option<String>,

    /// Superuser email
    #[arg(long, global = true, env = "EGE_PB_IDENTITY")]
    pub identity: Option<String>,

    /// Superuser password
    #[arg(long, global = true, env = "EGE_PB_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Fail instead of prompting when the topic is ambiguous
    #[arg(long, global = true)]
    pub non_interactive: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ingest a document, matching its topic against existing topics
    Ingest {
        /// File name in the sources directory (".md" optional) or a path
        document: String,
    },

    /// Ingest a textbook paragraph file, creating its topic if needed
    Paragraph {
        /// Paragraph number (reads <paragraph_dir>/<N>.md)
        number: String,
    },

    /// Parse a document without touching the store
    Parse {
        /// File name in the sources directory (".md" optional) or a path
        document: String,
    },

    /// Print the next free task code for a topic
    NextCode {
        /// Topic record id
        topic_id: String,

        /// Only count codes starting with this prefix (e.g. M14)
        #[arg(long)]
        prefix: Option<String>,
    },
}

/// Installs the stderr log subscriber. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "ege_ingest=debug"
    } else {
        "ege_ingest=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let output = Output::new(cli.format);

    let config = Config::load(cli.config.as_deref())?.with_store_overrides(
        cli.url,
        cli.identity,
        cli.password,
    );
    tracing::debug!(url = %config.store.url, sources = %config.sources.dir.display(), "Configuration ready");

    match cli.command {
        Commands::Ingest { document } => {
            ingest_cmd::ingest(&output, &config, &document, cli.non_interactive)?
        }
        Commands::Paragraph { number } => {
            ingest_cmd::paragraph(&output, &config, &number, cli.non_interactive)?
        }
        Commands::Parse { document } => ingest_cmd::parse(&output, &config, &document)?,
        Commands::NextCode { topic_id, prefix } => {
            ingest_cmd::next_code(&output, &config, &topic_id, prefix.as_deref())?
        }
    }

    Ok(())
}
