//! Upstream quote providers.
//!
//! Each provider answers a GET with JSON in its own shape. Responses are
//! decoded into [`ProviderResponse`] and adapted into a validated [`Quote`].

use crate::ProviderConfig;
use async_trait::async_trait;
use quotd_core::{Quote, QuoteSource};
use quotd_error::{ConfigError, FetchError, FetchErrorKind, HttpError};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Response shapes quotd understands.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProviderKind {
    /// `{ "_id", "content", "author", "tags" }`
    Quotable,
    /// `[{ "q", "a" }]`
    ZenQuotes,
    /// `{ "quoteText", "quoteAuthor" }`
    Forismatic,
}

impl ProviderKind {
    /// Source recorded on quotes from this kind of provider.
    pub fn source(self) -> QuoteSource {
        match self {
            ProviderKind::Quotable => QuoteSource::Quotable,
            ProviderKind::ZenQuotes => QuoteSource::ZenQuotes,
            ProviderKind::Forismatic => QuoteSource::Forismatic,
        }
    }
}

/// Body of a Quotable response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuotableQuote {
    /// Provider-assigned identifier
    #[serde(rename = "_id")]
    pub id: String,
    /// Quote text
    pub content: String,
    /// Author name
    #[serde(default)]
    pub author: String,
    /// Topic tags
    #[serde(default)]
    pub tags: Vec<String>,
}

/// One element of a ZenQuotes response array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ZenQuote {
    /// Quote text
    pub q: String,
    /// Author name
    #[serde(default)]
    pub a: String,
}

/// Body of a Forismatic response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForismaticQuote {
    /// Quote text
    pub quote_text: String,
    /// Author name, often empty
    #[serde(default)]
    pub quote_author: String,
}

/// A decoded provider response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderResponse {
    /// Quotable object
    Quotable(QuotableQuote),
    /// ZenQuotes array
    ZenQuotes(Vec<ZenQuote>),
    /// Forismatic object
    Forismatic(ForismaticQuote),
}

impl ProviderResponse {
    /// Decode `body` according to `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchErrorKind::Decode`] if the body does not match the
    /// provider's shape.
    pub fn decode(kind: ProviderKind, body: &str) -> Result<Self, FetchError> {
        let decoded = match kind {
            ProviderKind::Quotable => serde_json::from_str(body).map(Self::Quotable),
            ProviderKind::ZenQuotes => serde_json::from_str(body).map(Self::ZenQuotes),
            ProviderKind::Forismatic => serde_json::from_str(body).map(Self::Forismatic),
        };
        decoded.map_err(|e| {
            FetchError::new(FetchErrorKind::Decode(format!("{} response: {}", kind, e)))
        })
    }

    /// Adapt the response into a validated quote.
    ///
    /// # Errors
    ///
    /// Returns [`FetchErrorKind::Decode`] for an empty ZenQuotes array and
    /// [`FetchErrorKind::Validation`] if the quote fails validation.
    pub fn into_quote(self) -> Result<Quote, FetchError> {
        let quote = match self {
            ProviderResponse::Quotable(body) => Quote::new(
                format!("{}-{}", QuoteSource::Quotable, body.id),
                &body.content,
                &body.author,
                QuoteSource::Quotable,
            )?
            .with_tags(body.tags),
            ProviderResponse::ZenQuotes(body) => {
                let first = body.into_iter().next().ok_or_else(|| {
                    FetchError::new(FetchErrorKind::Decode(
                        "zenquotes response: empty array".to_string(),
                    ))
                })?;
                Quote::with_derived_id(&first.q, &first.a, QuoteSource::ZenQuotes)?
            }
            ProviderResponse::Forismatic(body) => Quote::with_derived_id(
                &body.quote_text,
                &body.quote_author,
                QuoteSource::Forismatic,
            )?,
        };
        Ok(quote)
    }
}

/// Anything that can produce a quote on demand.
///
/// Implementations report failures as [`FetchError`]s so the retry policy
/// can classify them.
#[async_trait]
pub trait QuoteProvider: Send + Sync + std::fmt::Debug {
    /// Display name
    fn name(&self) -> &str;

    /// Source recorded on fetched quotes
    fn source(&self) -> QuoteSource;

    /// Endpoint, used as the rate-limit bucket key
    fn endpoint(&self) -> &Url;

    /// Fetch one quote.
    async fn fetch(&self) -> Result<Quote, FetchError>;
}

/// Provider backed by a plain HTTP GET.
#[derive(Debug, Clone)]
pub struct HttpProvider {
    name: String,
    kind: ProviderKind,
    url: Url,
    timeout: Duration,
    client: Client,
}

impl HttpProvider {
    /// Build a provider from configuration, sharing `client`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured URL does not parse.
    pub fn new(config: &ProviderConfig, client: Client) -> Result<Self, ConfigError> {
        let url = Url::parse(config.url()).map_err(|e| {
            ConfigError::invalid(format!("providers.{}.url", config.name()), e.to_string())
        })?;
        Ok(Self {
            name: config.name().clone(),
            kind: *config.kind(),
            url,
            timeout: config.timeout(),
            client,
        })
    }

    /// Default HTTP client for providers.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend fails to initialize.
    pub fn client() -> Result<Client, HttpError> {
        Client::builder()
            .user_agent(concat!("quotd/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HttpError::new(format!("Failed to build HTTP client: {}", e)))
    }

    /// Response shape this provider decodes.
    pub fn kind(&self) -> ProviderKind {
        self.kind
    }
}

#[async_trait]
impl QuoteProvider for HttpProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn source(&self) -> QuoteSource {
        self.kind.source()
    }

    fn endpoint(&self) -> &Url {
        &self.url
    }

    #[instrument(skip(self), fields(provider = %self.name, url = %self.url))]
    async fn fetch(&self) -> Result<Quote, FetchError> {
        debug!("Requesting quote");

        let response = self
            .client
            .get(self.url.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Request failed");
                FetchError::new(FetchErrorKind::Network(e.to_string()))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Provider returned error status");
            return Err(FetchError::new(FetchErrorKind::from_status(
                status.as_u16(),
                body,
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::new(FetchErrorKind::Network(e.to_string())))?;

        let quote = ProviderResponse::decode(self.kind, &body)?.into_quote()?;
        debug!(id = %quote.id(), length = quote.length(), "Received quote");
        Ok(quote)
    }
}
