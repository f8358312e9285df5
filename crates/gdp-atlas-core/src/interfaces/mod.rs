// crates/gdp-atlas-core/src/interfaces/mod.rs
// ============================================================================
// Module: GDP Atlas Interfaces
// Description: Backend-agnostic interfaces for stores, sources, and reports.
// Purpose: Define the contract surfaces used by the refresh runtime and server.
// Dependencies: crate::core, async-trait, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how GDP Atlas integrates with storage backends, external
//! data sources, and summary renderers without embedding backend details.
//! Implementations must fail closed: missing or invalid upstream data surfaces
//! as an error or a skipped record, never as a partial write.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::core::country::AppStatus;
use crate::core::country::Country;
use crate::core::country::CountryCreate;
use crate::core::country::CountryQuery;
use crate::core::country::RateTable;
use crate::core::country::RawCountry;

// ============================================================================
// SECTION: Country Store
// ============================================================================

/// Country store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem or connection failure.
    #[error("store io error: {0}")]
    Io(String),
    /// A record failed validation before it could be written.
    #[error("invalid record: {0}")]
    Invalid(String),
    /// Persisted schema does not match this build.
    #[error("schema version mismatch: {0}")]
    VersionMismatch(String),
    /// Backend reported an error.
    #[error("store error: {0}")]
    Store(String),
}

/// Durable cache of country rows plus the singleton refresh status.
///
/// Implementations guarantee at most one row per name, compared
/// case-insensitively, and make [`CountryStore::apply_refresh`] atomic: either
/// every record and the status timestamp commit, or none do.
pub trait CountryStore: Send + Sync {
    /// Looks up one country by case-insensitive name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn find_by_name(&self, name: &str) -> Result<Option<Country>, StoreError>;

    /// Lists countries matching the query's filters, sort, and page window.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn list(&self, query: &CountryQuery) -> Result<Vec<Country>, StoreError>;

    /// Counts all cached countries.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn count(&self) -> Result<u64, StoreError>;

    /// Returns up to `limit` countries ordered by estimated GDP descending,
    /// rows without an estimate last.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn top_by_gdp(&self, limit: u64) -> Result<Vec<Country>, StoreError>;

    /// Inserts or updates one record matched by case-insensitive name,
    /// stamping it with the current time. Updates keep the existing
    /// identifier and overwrite every other column.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] for records failing validation and
    /// [`StoreError`] when the backend fails.
    fn upsert(&self, record: &CountryCreate) -> Result<Country, StoreError>;

    /// Deletes one country by case-insensitive name, returning the deleted
    /// row when one existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn delete_by_name(&self, name: &str) -> Result<Option<Country>, StoreError>;

    /// Reads the singleton status row, `None` before any refresh.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn status(&self) -> Result<Option<AppStatus>, StoreError>;

    /// Records the completion time of a successful refresh.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn set_last_refreshed(&self, refreshed_at: OffsetDateTime) -> Result<(), StoreError>;

    /// Applies one refresh cycle atomically: upserts every record with the
    /// shared `refreshed_at` stamp and records it as the status timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] and leaves the store unchanged when any record
    /// fails to apply.
    fn apply_refresh(
        &self,
        records: &[CountryCreate],
        refreshed_at: OffsetDateTime,
    ) -> Result<(), StoreError>;
}

// ============================================================================
// SECTION: Source Gateway
// ============================================================================

/// Source gateway errors.
///
/// # Invariants
/// - `source` is the human-readable source name surfaced to API callers.
#[derive(Debug)]
pub enum SourceError {
    /// The source could not be fetched or decoded.
    Unavailable {
        /// Human-readable source name.
        source: String,
        /// Short failure description.
        details: String,
    },
}

impl core::fmt::Display for SourceError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Unavailable { source, details } => {
                write!(f, "{source} unavailable: {details}")
            }
        }
    }
}

impl std::error::Error for SourceError {}

impl SourceError {
    /// Returns the human-readable source name.
    #[must_use]
    pub fn source(&self) -> &str {
        match self {
            Self::Unavailable { source, .. } => source,
        }
    }
}

/// Gateway to the external rate and country sources.
///
/// Both fetches are independent and safe to run concurrently; either failure
/// aborts a refresh before any write.
#[async_trait]
pub trait SourceGateway: Send + Sync {
    /// Fetches the USD exchange rate table.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the source is unreachable, responds with
    /// a non-success status, exceeds the response size limit, or returns an
    /// undecodable body.
    async fn fetch_exchange_rates(&self) -> Result<RateTable, SourceError>;

    /// Fetches the raw country list.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] under the same conditions as
    /// [`SourceGateway::fetch_exchange_rates`].
    async fn fetch_countries(&self) -> Result<Vec<RawCountry>, SourceError>;
}

// ============================================================================
// SECTION: Summary Reporter
// ============================================================================

/// Summary reporter errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Rendering failed.
    #[error("summary render error: {0}")]
    Render(String),
    /// The rendered artifact could not be written.
    #[error("summary io error: {0}")]
    Io(String),
}

/// Renders a post-refresh summary artifact from store aggregates.
///
/// Reporter failures never roll back a committed refresh; callers log and
/// continue.
pub trait SummaryReporter: Send + Sync {
    /// Renders the summary for the given aggregates.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] when rendering or writing fails.
    fn render(
        &self,
        total_countries: u64,
        top_by_gdp: &[Country],
        last_refreshed_at: Option<OffsetDateTime>,
    ) -> Result<(), ReportError>;
}
