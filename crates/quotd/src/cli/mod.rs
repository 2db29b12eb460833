//! Command-line interface module.
//!
//! Handlers print to stdout; diagnostics go through `tracing` to stderr.

mod commands;

pub use commands::{Cli, Commands, OutputFormat};

use quotd::{CacheEntry, CacheQuery, FetchedQuote, QuotdResult, QuoteService};
use tracing::instrument;

/// Fetch and print today's quote.
#[instrument(skip(service))]
pub async fn today(service: &QuoteService, format: OutputFormat) -> QuotdResult<()> {
    let FetchedQuote { quote, origin } = service.fetch_quote().await?;
    match format {
        OutputFormat::Human => {
            println!("\"{}\"", quote.text());
            println!("    - {}", quote.author());
            println!();
            println!("(source: {})", origin);
        }
        OutputFormat::Json => print_json(&serde_json::json!({
            "quote": quote,
            "origin": origin.to_string(),
        })),
    }
    Ok(())
}

/// Print cached quotes matching `query`.
#[instrument(skip(service))]
pub async fn cached(service: &QuoteService, query: CacheQuery, format: OutputFormat) {
    let cache = service.cache().lock().await;
    let unfiltered = query == CacheQuery::default();
    let entries: Vec<&CacheEntry> = if unfiltered {
        cache.get_all()
    } else {
        cache.query(&query)
    };

    match format {
        OutputFormat::Human => {
            if entries.is_empty() {
                println!("No cached quotes.");
            }
            for entry in entries {
                let quote = entry.quote();
                println!("{:<28} {} - {}", entry.id(), quote.text(), quote.author());
            }
        }
        OutputFormat::Json => print_json(&entries),
    }
}

/// Print cache statistics.
pub async fn stats(service: &QuoteService) {
    let stats = service.cache().lock().await.stats();
    println!("Entries:     {}", stats.count);
    println!("Size:        {} bytes", stats.total_bytes);
    if let (Some(oldest), Some(newest)) = (stats.oldest, stats.newest) {
        println!("Oldest:      {}", oldest.to_rfc3339());
        println!("Newest:      {}", newest.to_rfc3339());
    }
    if !stats.categories.is_empty() {
        println!("Categories:");
        for (category, count) in &stats.categories {
            println!("  {:<20} {}", category, count);
        }
    }
}

/// Empty the cache.
pub async fn clear(service: &QuoteService) {
    let mut cache = service.cache().lock().await;
    let removed = cache.len();
    cache.clear();
    println!("Removed {} cached quote(s).", removed);
}

/// Print the rate limit bucket of each provider.
pub fn status(service: &QuoteService) {
    let status = service.status();
    for provider in service.providers() {
        let key = service.limiter().bucket_key(provider.endpoint());
        if let Some(bucket) = status.get(&key) {
            println!(
                "{:<12} {:>3}/{} tokens, {} queued  ({})",
                provider.name(),
                bucket.tokens,
                bucket.capacity,
                bucket.queue_length,
                key
            );
        }
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => tracing::error!(error = %e, "Failed to serialize output"),
    }
}
