//! quotd CLI binary.
//!
//! - Fetch today's quote through the provider failover chain
//! - Inspect, query and clear the offline cache
//! - Show rate limiter state

use clap::Parser;
use quotd::{CacheQuery, QuotdConfig, QuoteService};

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use cli::{Cli, Commands};

    let cli = Cli::parse();
    quotd::telemetry::init_tracing(cli.verbose)?;

    let config = match &cli.config {
        Some(path) => QuotdConfig::from_file(path)?,
        None => QuotdConfig::load()?,
    };
    let service = QuoteService::from_config(&config)?;

    match cli.command {
        Commands::Today { format } => cli::today(&service, format).await?,
        Commands::Cached {
            category,
            author,
            text,
            format,
        } => {
            let query = CacheQuery {
                category,
                author,
                text,
            };
            cli::cached(&service, query, format).await;
        }
        Commands::Stats => cli::stats(&service).await,
        Commands::Clear => cli::clear(&service).await,
        Commands::Status => cli::status(&service),
    }

    Ok(())
}
