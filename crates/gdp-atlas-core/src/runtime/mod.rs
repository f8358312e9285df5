// crates/gdp-atlas-core/src/runtime/mod.rs
// ============================================================================
// Module: GDP Atlas Runtime
// Description: Refresh orchestration and the in-memory reference store.
// Purpose: Coordinate fetch, merge, and persist cycles over the interfaces.
// Dependencies: crate::core, crate::interfaces, tokio
// ============================================================================

//! ## Overview
//! The runtime layer drives refresh cycles against whichever backends the
//! host wires in. `InMemoryCountryStore` is the hermetic reference
//! implementation of [`crate::interfaces::CountryStore`] used by tests and
//! embedders that do not need durability.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod memory;
pub mod refresh;
