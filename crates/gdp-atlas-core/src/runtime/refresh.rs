// crates/gdp-atlas-core/src/runtime/refresh.rs
// ============================================================================
// Module: GDP Atlas Refresh Orchestrator
// Description: Fetch, merge, and persist one refresh cycle.
// Purpose: Coordinate sources, estimation, atomic storage, and summary output.
// Dependencies: crate::core, crate::interfaces, tokio, url
// ============================================================================

//! ## Overview
//! A refresh cycle fetches the rate table and country list concurrently,
//! normalizes the raw entries through the estimation decision table, applies
//! the whole batch atomically with one shared timestamp, and then renders the
//! summary artifact best-effort. Either fetch failing aborts the cycle before
//! any write; a summary failure never rolls back the committed data.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use url::Url;

use crate::core::country::CountryCreate;
use crate::core::country::RateTable;
use crate::core::country::RawCountry;
use crate::core::estimate::DEFAULT_GDP_MULTIPLIER;
use crate::core::estimate::estimate_gdp;
use crate::core::time::now_utc;
use crate::interfaces::CountryStore;
use crate::interfaces::SourceError;
use crate::interfaces::SourceGateway;
use crate::interfaces::StoreError;
use crate::interfaces::SummaryReporter;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Number of top-GDP countries listed in the summary artifact.
pub const TOP_GDP_SUMMARY_COUNT: u64 = 5;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Tunable parameters of the refresh pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefreshConfig {
    /// Multiplier used by the GDP estimation formula.
    pub gdp_multiplier: f64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            gdp_multiplier: DEFAULT_GDP_MULTIPLIER,
        }
    }
}

// ============================================================================
// SECTION: Outcome and Errors
// ============================================================================

/// Result of one successful refresh cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshOutcome {
    /// Shared timestamp stamped on every record and the status row.
    pub refreshed_at: OffsetDateTime,
    /// Number of records applied after skipping incomplete entries.
    pub records_applied: usize,
    /// Failure description when the best-effort summary step failed.
    pub summary_error: Option<String>,
}

/// Refresh cycle errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling; summary failures are
///   reported through [`RefreshOutcome::summary_error`], never here.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// An external source could not be fetched or decoded.
    #[error(transparent)]
    Source(#[from] SourceError),
    /// The store rejected the refresh batch.
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// SECTION: Orchestrator
// ============================================================================

/// Drives refresh cycles over the configured backends.
pub struct RefreshOrchestrator {
    /// Gateway to the rate and country sources.
    gateway: Arc<dyn SourceGateway>,
    /// Durable country cache.
    store: Arc<dyn CountryStore>,
    /// Post-refresh summary renderer.
    reporter: Arc<dyn SummaryReporter>,
    /// Pipeline parameters.
    config: RefreshConfig,
}

impl RefreshOrchestrator {
    /// Creates an orchestrator over the given backends.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn SourceGateway>,
        store: Arc<dyn CountryStore>,
        reporter: Arc<dyn SummaryReporter>,
        config: RefreshConfig,
    ) -> Self {
        Self {
            gateway,
            store,
            reporter,
            config,
        }
    }

    /// Runs one refresh cycle.
    ///
    /// # Errors
    ///
    /// Returns [`RefreshError::Source`] when either fetch fails, leaving the
    /// store untouched, and [`RefreshError::Store`] when the atomic apply
    /// fails.
    pub async fn run(&self) -> Result<RefreshOutcome, RefreshError> {
        let (rates, countries) = tokio::join!(
            self.gateway.fetch_exchange_rates(),
            self.gateway.fetch_countries()
        );
        let rates = rates?;
        let countries = countries?;
        let refreshed_at = now_utc();
        let records = build_refresh_records(&countries, &rates, self.config.gdp_multiplier);
        self.store.apply_refresh(&records, refreshed_at)?;
        let summary_error = self.render_summary().err().map(|err| err.to_string());
        Ok(RefreshOutcome {
            refreshed_at,
            records_applied: records.len(),
            summary_error,
        })
    }

    /// Renders the summary artifact from post-commit store aggregates.
    fn render_summary(&self) -> Result<(), SummaryStepError> {
        let total = self.store.count()?;
        let top = self.store.top_by_gdp(TOP_GDP_SUMMARY_COUNT)?;
        let last_refreshed_at = self
            .store
            .status()?
            .and_then(|status| status.last_refreshed_at);
        self.reporter.render(total, &top, last_refreshed_at)?;
        Ok(())
    }
}

/// Failure of the best-effort summary step, from either seam.
#[derive(Debug, Error)]
enum SummaryStepError {
    /// Reading aggregates back from the store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Rendering or writing the artifact failed.
    #[error(transparent)]
    Report(#[from] crate::interfaces::ReportError),
}

// ============================================================================
// SECTION: Record Normalization
// ============================================================================

/// Normalizes raw source entries into upsert-ready records.
///
/// Entries missing a name or population are skipped. Flag URLs that fail to
/// parse are dropped to `None` rather than failing the cycle.
fn build_refresh_records(
    countries: &[RawCountry],
    rates: &RateTable,
    multiplier: f64,
) -> Vec<CountryCreate> {
    countries
        .iter()
        .filter_map(|raw| build_record(raw, rates, multiplier))
        .collect()
}

/// Builds one record, returning `None` for incomplete entries.
fn build_record(raw: &RawCountry, rates: &RateTable, multiplier: f64) -> Option<CountryCreate> {
    let name = raw.name.as_deref()?.trim();
    if name.is_empty() {
        return None;
    }
    let population = raw.population?;
    let estimate = estimate_gdp(population, raw.first_currency_code(), rates, multiplier);
    let flag_url = raw
        .flag
        .as_deref()
        .filter(|candidate| Url::parse(candidate).is_ok())
        .map(str::to_owned);
    Some(CountryCreate {
        name: name.to_owned(),
        capital: raw.capital.clone(),
        region: raw.region.clone(),
        population,
        currency_code: estimate.currency_code,
        exchange_rate: estimate.exchange_rate,
        estimated_gdp: estimate.estimated_gdp,
        flag_url,
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::panic,
        clippy::float_cmp,
        clippy::missing_docs_in_private_items,
        reason = "Tests use unwrap/panic and exact float comparison for clarity"
    )]

    use async_trait::async_trait;

    use super::*;
    use crate::core::country::Country;
    use crate::core::country::RawCurrency;
    use crate::runtime::memory::InMemoryCountryStore;

    /// Gateway stub returning canned payloads or failures.
    struct StubGateway {
        /// Canned rate table result.
        rates: Result<RateTable, String>,
        /// Canned country list result.
        countries: Result<Vec<RawCountry>, String>,
    }

    #[async_trait]
    impl SourceGateway for StubGateway {
        async fn fetch_exchange_rates(&self) -> Result<RateTable, SourceError> {
            self.rates
                .clone()
                .map_err(|details| SourceError::Unavailable {
                    source: "Exchange Rates API".to_owned(),
                    details,
                })
        }

        async fn fetch_countries(&self) -> Result<Vec<RawCountry>, SourceError> {
            self.countries
                .clone()
                .map_err(|details| SourceError::Unavailable {
                    source: "RestCountries API".to_owned(),
                    details,
                })
        }
    }

    /// Reporter stub recording whether it ran.
    struct NoopReporter;

    impl SummaryReporter for NoopReporter {
        fn render(
            &self,
            _total_countries: u64,
            _top_by_gdp: &[Country],
            _last_refreshed_at: Option<OffsetDateTime>,
        ) -> Result<(), crate::interfaces::ReportError> {
            Ok(())
        }
    }

    /// Reporter stub that always fails.
    struct FailingReporter;

    impl SummaryReporter for FailingReporter {
        fn render(
            &self,
            _total_countries: u64,
            _top_by_gdp: &[Country],
            _last_refreshed_at: Option<OffsetDateTime>,
        ) -> Result<(), crate::interfaces::ReportError> {
            Err(crate::interfaces::ReportError::Render("no canvas".to_owned()))
        }
    }

    fn raw(name: &str, population: Option<u64>, code: Option<&str>) -> RawCountry {
        RawCountry {
            name: Some(name.to_owned()),
            capital: Some("Capital".to_owned()),
            region: Some("Region".to_owned()),
            population,
            currencies: code
                .map(|code| {
                    vec![RawCurrency {
                        code: Some(code.to_owned()),
                    }]
                })
                .unwrap_or_default(),
            flag: None,
        }
    }

    fn orchestrator(
        gateway: StubGateway,
        store: Arc<dyn CountryStore>,
        reporter: Arc<dyn SummaryReporter>,
    ) -> RefreshOrchestrator {
        RefreshOrchestrator::new(Arc::new(gateway), store, reporter, RefreshConfig::default())
    }

    #[tokio::test]
    async fn refresh_skips_incomplete_entries_and_stamps_status() {
        let mut rates = RateTable::new();
        rates.insert("NGN".to_owned(), 1600.0);
        let gateway = StubGateway {
            rates: Ok(rates),
            countries: Ok(vec![
                raw("Nigeria", Some(200_000_000), Some("NGN")),
                raw("Atlantis", None, Some("ATL")),
                RawCountry {
                    population: Some(5),
                    ..RawCountry::default()
                },
            ]),
        };
        let store = Arc::new(InMemoryCountryStore::new());
        let outcome = orchestrator(gateway, store.clone(), Arc::new(NoopReporter))
            .run()
            .await
            .unwrap();

        assert_eq!(outcome.records_applied, 1);
        assert_eq!(outcome.summary_error, None);
        assert_eq!(store.count().unwrap(), 1);
        let nigeria = store.find_by_name("nigeria").unwrap().unwrap();
        assert_eq!(nigeria.estimated_gdp, Some(200_000_000.0 * 1500.0 / 1600.0));
        assert_eq!(nigeria.last_refreshed_at, outcome.refreshed_at);
        let status = store.status().unwrap().unwrap();
        assert_eq!(status.last_refreshed_at, Some(outcome.refreshed_at));
    }

    #[tokio::test]
    async fn currencyless_country_is_stored_with_zero_gdp() {
        let gateway = StubGateway {
            rates: Ok(RateTable::new()),
            countries: Ok(vec![raw("Wakanda", Some(1_000_000), None)]),
        };
        let store = Arc::new(InMemoryCountryStore::new());
        orchestrator(gateway, store.clone(), Arc::new(NoopReporter))
            .run()
            .await
            .unwrap();

        let wakanda = store.find_by_name("Wakanda").unwrap().unwrap();
        assert_eq!(wakanda.currency_code, None);
        assert_eq!(wakanda.exchange_rate, None);
        assert_eq!(wakanda.estimated_gdp, Some(0.0));
    }

    #[tokio::test]
    async fn source_failure_aborts_before_any_write() {
        let gateway = StubGateway {
            rates: Err("connect timeout".to_owned()),
            countries: Ok(vec![raw("Nigeria", Some(1), Some("NGN"))]),
        };
        let store = Arc::new(InMemoryCountryStore::new());
        let error = orchestrator(gateway, store.clone(), Arc::new(NoopReporter))
            .run()
            .await
            .unwrap_err();

        match error {
            RefreshError::Source(source) => {
                assert_eq!(source.source(), "Exchange Rates API");
            }
            RefreshError::Store(other) => panic!("unexpected store error: {other}"),
        }
        assert_eq!(store.count().unwrap(), 0);
        assert!(store.status().unwrap().is_none());
    }

    #[tokio::test]
    async fn summary_failure_does_not_roll_back_commit() {
        let gateway = StubGateway {
            rates: Ok(RateTable::new()),
            countries: Ok(vec![raw("Nigeria", Some(10), None)]),
        };
        let store = Arc::new(InMemoryCountryStore::new());
        let outcome = orchestrator(gateway, store.clone(), Arc::new(FailingReporter))
            .run()
            .await
            .unwrap();

        assert!(outcome.summary_error.is_some());
        assert_eq!(store.count().unwrap(), 1);
        assert!(store.status().unwrap().is_some());
    }

    #[test]
    fn malformed_flag_urls_are_dropped() {
        let rates = RateTable::new();
        let mut entry = raw("Nigeria", Some(10), None);
        entry.flag = Some("not a url".to_owned());
        let records = build_refresh_records(&[entry], &rates, 1500.0);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].flag_url, None);
    }

    #[test]
    fn well_formed_flag_urls_are_kept() {
        let rates = RateTable::new();
        let mut entry = raw("Nigeria", Some(10), None);
        entry.flag = Some("https://flags.example/ng.svg".to_owned());
        let records = build_refresh_records(&[entry], &rates, 1500.0);
        assert_eq!(
            records[0].flag_url.as_deref(),
            Some("https://flags.example/ng.svg")
        );
    }
}
