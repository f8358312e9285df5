// crates/gdp-atlas-server/src/lib.rs
// ============================================================================
// Module: GDP Atlas Server
// Description: HTTP surface, configuration, and summary rendering.
// Purpose: Expose the country cache over axum and render refresh summaries.
// Dependencies: gdp-atlas-core, gdp-atlas-sources, gdp-atlas-store-sqlite, axum
// ============================================================================

//! ## Overview
//! This crate wires the core refresh runtime to the outside world: a TOML and
//! environment driven configuration loader, the axum router with its stable
//! error-body mapping, and the PNG summary reporter that runs after each
//! successful refresh. The binary in `main.rs` assembles the SQLite store and
//! HTTP source gateway behind the core trait seams.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod api;
pub mod config;
pub mod summary;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use api::ApiError;
pub use api::AppState;
pub use api::router;
pub use config::AtlasConfig;
pub use config::ConfigError;
pub use summary::PngSummaryReporter;
