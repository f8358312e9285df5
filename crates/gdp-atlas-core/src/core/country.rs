// crates/gdp-atlas-core/src/core/country.rs
// ============================================================================
// Module: GDP Atlas Country Model
// Description: Country cache records, refresh inputs, and query parameters.
// Purpose: Define the canonical shapes stored, served, and merged by GDP Atlas.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! A `Country` is one cached row: identity data from the countries source,
//! the USD exchange rate for its first listed currency, and the derived GDP
//! estimate. `CountryCreate` is the same record before the store assigns an
//! identifier. `RawCountry` mirrors the upstream source payload and is the
//! only place upstream field optionality leaks into the crate; the refresh
//! pipeline normalizes it away.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default page size for country listings.
pub const DEFAULT_LIST_LIMIT: u64 = 100;

/// Currency-to-USD rate table keyed by ISO-style currency code.
///
/// A `BTreeMap` keeps iteration deterministic for logs and tests.
pub type RateTable = BTreeMap<String, f64>;

// ============================================================================
// SECTION: Cached Records
// ============================================================================

/// One cached country row.
///
/// # Invariants
/// - `name` is non-empty and unique case-insensitively across the store.
/// - `currency_code`, `exchange_rate`, and `estimated_gdp` follow the
///   estimation decision table; a `None` rate always pairs with a `None` GDP.
/// - `last_refreshed_at` is UTC and serializes as RFC 3339 on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    /// Store-assigned identifier, stable across refreshes of the same name.
    pub id: i64,
    /// Country name as reported by the countries source.
    pub name: String,
    /// Capital city, when the source reports one.
    pub capital: Option<String>,
    /// Geographic region, when the source reports one.
    pub region: Option<String>,
    /// Population count.
    pub population: u64,
    /// First currency code listed by the source, when any.
    pub currency_code: Option<String>,
    /// USD exchange rate for `currency_code`, when known.
    pub exchange_rate: Option<f64>,
    /// Derived GDP estimate in USD, when computable.
    pub estimated_gdp: Option<f64>,
    /// Flag image URL, when the source reports a well-formed one.
    pub flag_url: Option<String>,
    /// When this row was last written by a refresh or direct upsert.
    #[serde(with = "time::serde::rfc3339")]
    pub last_refreshed_at: OffsetDateTime,
}

/// A country record ready to be upserted, before identifier assignment.
///
/// # Invariants
/// - `name` is non-empty.
/// - `currency_code`, when present, is at most ten characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryCreate {
    /// Country name.
    pub name: String,
    /// Capital city.
    pub capital: Option<String>,
    /// Geographic region.
    pub region: Option<String>,
    /// Population count.
    pub population: u64,
    /// First listed currency code.
    pub currency_code: Option<String>,
    /// USD exchange rate for `currency_code`.
    pub exchange_rate: Option<f64>,
    /// Derived GDP estimate in USD.
    pub estimated_gdp: Option<f64>,
    /// Flag image URL.
    pub flag_url: Option<String>,
}

/// Singleton application status row.
///
/// # Invariants
/// - `last_refreshed_at` is `None` until the first successful refresh commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppStatus {
    /// Completion time of the most recent successful refresh.
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_refreshed_at: Option<OffsetDateTime>,
}

// ============================================================================
// SECTION: Query Parameters
// ============================================================================

/// Sort orders accepted by country listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Ascending by name.
    #[default]
    NameAsc,
    /// Descending by estimated GDP, rows without an estimate last.
    GdpDesc,
}

/// Filter, sort, and pagination parameters for country listings.
///
/// # Invariants
/// - `region` and `currency_code` filters are exact matches.
/// - `limit` is a positive page size; callers validate ranges before building
///   a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryQuery {
    /// Exact region filter.
    pub region: Option<String>,
    /// Exact currency code filter.
    pub currency_code: Option<String>,
    /// Sort order.
    pub sort: SortOrder,
    /// Rows to skip.
    pub offset: u64,
    /// Maximum rows to return.
    pub limit: u64,
}

impl Default for CountryQuery {
    fn default() -> Self {
        Self {
            region: None,
            currency_code: None,
            sort: SortOrder::default(),
            offset: 0,
            limit: DEFAULT_LIST_LIMIT,
        }
    }
}

// ============================================================================
// SECTION: Source Payloads
// ============================================================================

/// One country entry as reported by the countries source.
///
/// Every field is optional at this layer; the refresh pipeline skips entries
/// missing a name or population and normalizes the rest.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct RawCountry {
    /// Country name.
    pub name: Option<String>,
    /// Capital city.
    pub capital: Option<String>,
    /// Geographic region.
    pub region: Option<String>,
    /// Population count.
    pub population: Option<u64>,
    /// Currencies in source order; only the first is used.
    pub currencies: Vec<RawCurrency>,
    /// Flag image URL.
    pub flag: Option<String>,
}

impl RawCountry {
    /// Returns the first listed currency code, when any entry carries one.
    #[must_use]
    pub fn first_currency_code(&self) -> Option<&str> {
        self.currencies.first().and_then(|currency| currency.code.as_deref())
    }
}

/// One currency entry within a [`RawCountry`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct RawCurrency {
    /// Currency code, for example `NGN`.
    pub code: Option<String>,
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::panic,
        clippy::missing_docs_in_private_items,
        reason = "Tests use unwrap/panic for assertion clarity"
    )]

    use super::*;

    #[test]
    fn first_currency_code_uses_source_order() {
        let raw = RawCountry {
            name: Some("Nigeria".to_owned()),
            currencies: vec![
                RawCurrency {
                    code: Some("NGN".to_owned()),
                },
                RawCurrency {
                    code: Some("USD".to_owned()),
                },
            ],
            ..RawCountry::default()
        };
        assert_eq!(raw.first_currency_code(), Some("NGN"));
    }

    #[test]
    fn first_currency_code_is_none_for_codeless_first_entry() {
        let raw = RawCountry {
            currencies: vec![RawCurrency { code: None }],
            ..RawCountry::default()
        };
        assert_eq!(raw.first_currency_code(), None);
        assert_eq!(RawCountry::default().first_currency_code(), None);
    }

    #[test]
    fn raw_country_tolerates_unknown_and_missing_fields() {
        let raw: RawCountry = serde_json::from_str(
            r#"{"name":"Ghana","population":33000000,"currencies":[{"code":"GHS","name":"Cedi"}],"cioc":"GHA"}"#,
        )
        .unwrap();
        assert_eq!(raw.name.as_deref(), Some("Ghana"));
        assert_eq!(raw.population, Some(33_000_000));
        assert_eq!(raw.first_currency_code(), Some("GHS"));
        assert_eq!(raw.capital, None);
    }

    #[test]
    fn country_serializes_rfc3339_timestamp() {
        let country = Country {
            id: 1,
            name: "Ghana".to_owned(),
            capital: Some("Accra".to_owned()),
            region: Some("Africa".to_owned()),
            population: 33_000_000,
            currency_code: Some("GHS".to_owned()),
            exchange_rate: Some(15.0),
            estimated_gdp: Some(3_300_000_000.0),
            flag_url: None,
            last_refreshed_at: OffsetDateTime::UNIX_EPOCH,
        };
        let json = serde_json::to_value(&country).unwrap();
        assert_eq!(json["last_refreshed_at"], "1970-01-01T00:00:00Z");
        assert_eq!(json["flag_url"], serde_json::Value::Null);
    }
}
