//! # Context Recall CLI (`recall`)
//!
//! Loads a corpus from disk into the in-memory retrieval engine and runs a
//! single query or report against it.
//!
//! ## Usage
//!
//! ```bash
//! recall --config ./config/recall.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `recall search "<query>"` | Print ranked passages |
//! | `recall context "<query>"` | Print the assembled context block |
//! | `recall stats` | Document, passage, and cache counts |
//! | `recall documents` | List loaded documents |

use clap::{Parser, Subcommand};
use context_recall::{config, logging, search, stats};
use std::path::PathBuf;

/// Context Recall CLI: passage retrieval and budgeted context assembly.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/recall.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "recall",
    about = "Context Recall: passage retrieval and budgeted context assembly",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/recall.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the corpus and print ranked passages.
    Search {
        /// The search query string.
        query: String,

        /// Maximum number of results (defaults to `retrieval.default_top_k`).
        #[arg(long)]
        limit: Option<usize>,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the context block a prompt would receive for a query.
    Context {
        /// The query string.
        query: String,

        /// Character budget (defaults to `context.max_chars`).
        #[arg(long)]
        max_chars: Option<usize>,
    },

    /// Show index statistics.
    Stats {
        /// Print statistics as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List loaded documents with passage counts.
    Documents,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load_config(&cli.config)?;
    logging::init(&cfg.logging);

    match cli.command {
        Commands::Search { query, limit, json } => {
            search::run_search(&cfg, &query, limit, json).await?;
        }
        Commands::Context { query, max_chars } => {
            search::run_context(&cfg, &query, max_chars).await?;
        }
        Commands::Stats { json } => {
            stats::run_stats(&cfg, json).await?;
        }
        Commands::Documents => {
            stats::run_documents(&cfg).await?;
        }
    }

    Ok(())
}
