// crates/gdp-atlas-store-sqlite/src/lib.rs
// ============================================================================
// Module: GDP Atlas SQLite Store
// Description: Durable country store backed by SQLite WAL.
// Purpose: Persist the country cache and refresh status across restarts.
// Dependencies: gdp-atlas-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! This crate implements [`gdp_atlas_core::CountryStore`] over a single
//! mutex-guarded `SQLite` connection in WAL mode. Refresh cycles apply as one
//! transaction, so readers never observe a half-written batch and a failed
//! batch leaves the previous cache intact.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use store::SqliteCountryStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
