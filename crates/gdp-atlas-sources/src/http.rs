// crates/gdp-atlas-sources/src/http.rs
// ============================================================================
// Module: GDP Atlas HTTP Source Gateway
// Description: Bounded reqwest fetches for rates and country data.
// Purpose: Fetch and decode upstream payloads with fail-closed limits.
// Dependencies: gdp-atlas-core, reqwest, serde, serde_json
// ============================================================================

//! ## Overview
//! The gateway wraps one reqwest client configured with the request timeout
//! and user agent from [`HttpSourceConfig`]. Response bodies are read in
//! chunks against a byte limit so an oversized upstream cannot exhaust
//! memory. Decode failures and transport failures map to the same stable
//! error carrying the source's display name.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use gdp_atlas_core::RateTable;
use gdp_atlas_core::RawCountry;
use gdp_atlas_core::SourceError;
use gdp_atlas_core::SourceGateway;
use serde::Deserialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Display name for the exchange-rate source, surfaced in API errors.
pub const RATES_SOURCE_NAME: &str = "Exchange Rates API";

/// Display name for the country-data source, surfaced in API errors.
pub const COUNTRIES_SOURCE_NAME: &str = "RestCountries API";

/// Default exchange-rate endpoint.
const DEFAULT_RATES_URL: &str = "https://open.er-api.com/v6/latest/USD";

/// Default country-data endpoint, restricted to the fields the cache uses.
const DEFAULT_COUNTRIES_URL: &str =
    "https://restcountries.com/v2/all?fields=name,capital,region,population,flag,currencies";

/// Default request timeout in milliseconds.
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Default response size limit in bytes.
const DEFAULT_MAX_RESPONSE_BYTES: usize = 8 * 1024 * 1024;

/// Default user agent string.
const DEFAULT_USER_AGENT: &str = "gdp-atlas/0.1";

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Source gateway configuration.
///
/// # Invariants
/// - `timeout_ms` is a positive request deadline.
/// - `max_response_bytes` bounds every response body read.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HttpSourceConfig {
    /// Exchange-rate endpoint URL.
    pub rates_url: String,
    /// Country-data endpoint URL.
    pub countries_url: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Response size limit in bytes.
    pub max_response_bytes: usize,
    /// User agent sent on every request.
    pub user_agent: String,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            rates_url: DEFAULT_RATES_URL.to_owned(),
            countries_url: DEFAULT_COUNTRIES_URL.to_owned(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

// ============================================================================
// SECTION: Gateway
// ============================================================================

/// Rate-table payload envelope; rates sit under a `rates` key.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RatesEnvelope {
    /// Currency-to-USD rate table.
    rates: RateTable,
}

/// HTTP implementation of the source gateway seam.
pub struct HttpSourceGateway {
    /// Gateway configuration.
    config: HttpSourceConfig,
    /// Shared reqwest client with timeout and user agent applied.
    client: reqwest::Client,
}

impl HttpSourceGateway {
    /// Builds a gateway and its underlying HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the client cannot be constructed.
    pub fn new(config: HttpSourceConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|err| unavailable("HTTP client", format!("build failed: {err}")))?;
        Ok(Self { config, client })
    }

    /// Fetches one URL, enforcing status and size limits.
    async fn fetch_body(&self, url: &str, source: &str) -> Result<Vec<u8>, SourceError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| unavailable(source, format!("request failed: {err}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(source, format!("unexpected status {status}")));
        }
        let limit = self.config.max_response_bytes;
        if let Some(length) = response.content_length()
            && length > u64::try_from(limit).unwrap_or(u64::MAX)
        {
            return Err(unavailable(source, "response exceeds size limit"));
        }
        let mut body = Vec::new();
        loop {
            let chunk = response
                .chunk()
                .await
                .map_err(|err| unavailable(source, format!("read failed: {err}")))?;
            let Some(chunk) = chunk else {
                break;
            };
            if body.len().saturating_add(chunk.len()) > limit {
                return Err(unavailable(source, "response exceeds size limit"));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

/// Builds the stable unavailable error for one source.
fn unavailable(source: &str, details: impl Into<String>) -> SourceError {
    SourceError::Unavailable {
        source: source.to_owned(),
        details: details.into(),
    }
}

#[async_trait]
impl SourceGateway for HttpSourceGateway {
    async fn fetch_exchange_rates(&self) -> Result<RateTable, SourceError> {
        let body = self
            .fetch_body(&self.config.rates_url, RATES_SOURCE_NAME)
            .await?;
        let envelope: RatesEnvelope = serde_json::from_slice(&body)
            .map_err(|err| unavailable(RATES_SOURCE_NAME, format!("undecodable body: {err}")))?;
        Ok(envelope.rates)
    }

    async fn fetch_countries(&self) -> Result<Vec<RawCountry>, SourceError> {
        let body = self
            .fetch_body(&self.config.countries_url, COUNTRIES_SOURCE_NAME)
            .await?;
        serde_json::from_slice(&body)
            .map_err(|err| unavailable(COUNTRIES_SOURCE_NAME, format!("undecodable body: {err}")))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
