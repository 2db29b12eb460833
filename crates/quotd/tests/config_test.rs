//! Tests for configuration loading.

use quotd::{BucketMode, ProviderKind, QuotdConfig};
use std::io::Write;

#[test]
fn test_partial_document_uses_defaults() {
    let config = QuotdConfig::from_toml(
        r#"
        [rate_limit]
        capacity = 2
        mode = "global"

        [[providers]]
        name = "zen"
        kind = "zenquotes"
        url = "https://zenquotes.io/api/random"
        "#,
    )
    .unwrap();

    assert_eq!(*config.rate_limit().capacity(), 2);
    assert_eq!(*config.rate_limit().mode(), BucketMode::Global);
    assert_eq!(*config.rate_limit().queue_timeout_ms(), 5_000);
    assert_eq!(*config.cache().max_size(), 100);
    assert_eq!(*config.retry().max_retries(), 3);

    let provider = &config.providers()[0];
    assert_eq!(*provider.kind(), ProviderKind::ZenQuotes);
    assert_eq!(*provider.timeout_ms(), 5_000);
}

#[test]
fn test_file_overrides_bundled_defaults() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[cache]\nmax_size = 5\n\n[retry]\nbase_delay_ms = 250").unwrap();

    let config = QuotdConfig::from_file(file.path()).unwrap();

    assert_eq!(*config.cache().max_size(), 5);
    assert_eq!(*config.retry().base_delay_ms(), 250);
    // Untouched sections come from the bundled file
    assert_eq!(config.providers().len(), 3);
    assert_eq!(config.providers()[0].name(), "quotable");
    assert_eq!(*config.cache().decay_factor(), 0.9);
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(QuotdConfig::from_file(dir.path().join("absent.toml")).is_err());
}

#[test]
fn test_invalid_values_are_rejected() {
    assert!(QuotdConfig::from_toml("[rate_limit]\ncapacity = 0").is_err());
    assert!(QuotdConfig::from_toml("[cache]\ndecay_factor = 2.0").is_err());
    assert!(
        QuotdConfig::from_toml(
            "[[providers]]\nname = \"bad\"\nkind = \"quotable\"\nurl = \"nowhere\""
        )
        .is_err()
    );
    assert!(
        QuotdConfig::from_toml(
            "[[providers]]\nname = \"bad\"\nkind = \"fortune\"\nurl = \"https://x.example\""
        )
        .is_err()
    );
}

#[test]
fn test_empty_document_is_all_defaults() {
    let config = QuotdConfig::from_toml("").unwrap();
    assert_eq!(config, QuotdConfig::default());
    assert!(config.providers().is_empty());
}
