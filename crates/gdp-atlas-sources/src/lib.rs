// crates/gdp-atlas-sources/src/lib.rs
// ============================================================================
// Module: GDP Atlas Sources
// Description: HTTP gateway to the external rate and country sources.
// Purpose: Implement the source gateway seam over reqwest with size limits.
// Dependencies: gdp-atlas-core, reqwest, serde
// ============================================================================

//! ## Overview
//! This crate implements [`gdp_atlas_core::SourceGateway`] against the live
//! exchange-rate and country-data services. Fetches are bounded by a request
//! timeout and a response size limit; anything over a limit, any non-success
//! status, and any undecodable body fails closed with the source's
//! human-readable name attached.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod http;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use http::COUNTRIES_SOURCE_NAME;
pub use http::HttpSourceConfig;
pub use http::HttpSourceGateway;
pub use http::RATES_SOURCE_NAME;
