// crates/gdp-atlas-core/src/core/estimate.rs
// ============================================================================
// Module: GDP Atlas Estimation
// Description: Pure decision table deriving GDP estimates from rates.
// Purpose: Compute currency code, exchange rate, and estimated GDP per country.
// Dependencies: crate::core::country
// ============================================================================

//! ## Overview
//! GDP estimation is a pure function of population, the first listed currency
//! code, and the rate table. The decision table is exhaustive: every
//! combination of missing currency, unknown code, and non-positive rate maps
//! to a defined output, so refresh results are reproducible for fixed inputs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::country::RateTable;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default GDP multiplier applied as `population * multiplier / rate`.
pub const DEFAULT_GDP_MULTIPLIER: f64 = 1500.0;

// ============================================================================
// SECTION: Estimation
// ============================================================================

/// Outcome of one estimation: the three derived columns of a country row.
///
/// # Invariants
/// - `exchange_rate` is `Some` only when `currency_code` is `Some` and the
///   code resolved in the rate table.
/// - `estimated_gdp` is `None` exactly when a currency code was listed but
///   absent from the rate table; every other row estimates a value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GdpEstimate {
    /// Currency code carried onto the row, when the country listed one.
    pub currency_code: Option<String>,
    /// Resolved USD exchange rate, when the code was found.
    pub exchange_rate: Option<f64>,
    /// Derived GDP estimate, `Some(0.0)` for non-positive rates.
    pub estimated_gdp: Option<f64>,
}

/// Derives the currency columns for one country.
///
/// Decision table:
/// - no currency code: code and rate are `None`, GDP is `0.0`;
/// - code absent from `rates`: the code is kept, rate and GDP are `None`;
/// - rate greater than zero: GDP is `population * multiplier / rate`;
/// - rate zero or negative: the rate is kept, GDP is `0.0`.
#[must_use]
pub fn estimate_gdp(
    population: u64,
    currency_code: Option<&str>,
    rates: &RateTable,
    multiplier: f64,
) -> GdpEstimate {
    let Some(code) = currency_code else {
        return GdpEstimate {
            currency_code: None,
            exchange_rate: None,
            estimated_gdp: Some(0.0),
        };
    };
    let Some(rate) = rates.get(code).copied() else {
        return GdpEstimate {
            currency_code: Some(code.to_owned()),
            exchange_rate: None,
            estimated_gdp: None,
        };
    };
    #[allow(
        clippy::cast_precision_loss,
        reason = "Rounding above f64's exact integer range is tolerable for an estimate"
    )]
    let population = population as f64;
    let estimated_gdp = if rate > 0.0 {
        population * multiplier / rate
    } else {
        0.0
    };
    GdpEstimate {
        currency_code: Some(code.to_owned()),
        exchange_rate: Some(rate),
        estimated_gdp: Some(estimated_gdp),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
