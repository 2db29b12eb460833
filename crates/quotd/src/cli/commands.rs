//! CLI command definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// quotd - quote of the day with provider failover and an offline cache
#[derive(Parser, Debug)]
#[command(name = "quotd")]
#[command(about = "Quote of the day with provider failover and an offline cache", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (replaces the user and local overrides)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch today's quote, falling back to the cache
    Today {
        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// List cached quotes, newest first
    Cached {
        /// Only quotes in this category
        #[arg(long)]
        category: Option<String>,

        /// Only quotes by this author
        #[arg(long)]
        author: Option<String>,

        /// Only quotes containing this text
        #[arg(long)]
        text: Option<String>,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Show cache statistics
    Stats,

    /// Remove every cached quote
    Clear,

    /// Show rate limit buckets for each provider
    Status,
}

/// Output format options
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
}
