// crates/gdp-atlas-core/src/lib.rs
// ============================================================================
// Module: GDP Atlas Core
// Description: Domain model, estimation logic, and backend interfaces.
// Purpose: Provide the storage-agnostic heart of the GDP Atlas cache service.
// Dependencies: serde, thiserror, time, async-trait, tokio
// ============================================================================

//! ## Overview
//! GDP Atlas caches country reference data enriched with USD exchange rates
//! and a derived GDP estimate. This crate holds the pure domain layer: record
//! types, the estimation decision table, the trait seams for stores, source
//! gateways, and summary reporters, plus the refresh orchestrator that ties a
//! cycle together. Backends (SQLite, HTTP sources, the server surface) live in
//! sibling crates and depend on this one.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use crate::core::country::AppStatus;
pub use crate::core::country::Country;
pub use crate::core::country::CountryCreate;
pub use crate::core::country::CountryQuery;
pub use crate::core::country::DEFAULT_LIST_LIMIT;
pub use crate::core::country::RateTable;
pub use crate::core::country::RawCountry;
pub use crate::core::country::RawCurrency;
pub use crate::core::country::SortOrder;
pub use crate::core::estimate::DEFAULT_GDP_MULTIPLIER;
pub use crate::core::estimate::GdpEstimate;
pub use crate::core::estimate::estimate_gdp;
pub use crate::core::time::from_unix_millis;
pub use crate::core::time::now_utc;
pub use crate::core::time::to_unix_millis;
pub use crate::interfaces::CountryStore;
pub use crate::interfaces::ReportError;
pub use crate::interfaces::SourceError;
pub use crate::interfaces::SourceGateway;
pub use crate::interfaces::StoreError;
pub use crate::interfaces::SummaryReporter;
pub use crate::runtime::memory::InMemoryCountryStore;
pub use crate::runtime::refresh::RefreshConfig;
pub use crate::runtime::refresh::RefreshError;
pub use crate::runtime::refresh::RefreshOrchestrator;
pub use crate::runtime::refresh::RefreshOutcome;
pub use crate::runtime::refresh::TOP_GDP_SUMMARY_COUNT;
