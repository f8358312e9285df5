// crates/gdp-atlas-core/src/core/mod.rs
// ============================================================================
// Module: GDP Atlas Core Domain
// Description: Pure domain types and estimation logic.
// Purpose: Group the record model, GDP decision table, and time helpers.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! The domain layer is free of IO: records are plain serde types, the
//! estimator is a pure function over its inputs, and time helpers wrap the
//! canonical wire and storage representations of timestamps.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod country;
pub mod estimate;
pub mod time;
