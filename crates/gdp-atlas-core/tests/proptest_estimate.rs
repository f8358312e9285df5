// crates/gdp-atlas-core/tests/proptest_estimate.rs
// ============================================================================
// Module: Estimation Property-Based Tests
// Description: Property tests for the GDP estimation decision table.
// Purpose: Detect panics and invariant violations across wide input ranges.
// ============================================================================

//! Property-based tests for estimation invariants.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    clippy::missing_docs_in_private_items,
    reason = "Test-only assertions and helpers are permitted."
)]

use gdp_atlas_core::RateTable;
use gdp_atlas_core::estimate_gdp;
use proptest::prelude::*;

fn rate_table(code: &str, rate: f64) -> RateTable {
    let mut table = RateTable::new();
    table.insert(code.to_owned(), rate);
    table
}

proptest! {
    #[test]
    fn positive_rates_follow_the_formula(
        population in 0_u64 .. 10_000_000_000,
        rate in 0.000_001_f64 .. 1_000_000.0,
        multiplier in 1.0_f64 .. 10_000.0,
    ) {
        let rates = rate_table("AAA", rate);
        let estimate = estimate_gdp(population, Some("AAA"), &rates, multiplier);
        #[allow(clippy::cast_precision_loss, reason = "Mirrors the production formula")]
        let expected = population as f64 * multiplier / rate;
        prop_assert_eq!(estimate.currency_code.as_deref(), Some("AAA"));
        prop_assert_eq!(estimate.exchange_rate, Some(rate));
        prop_assert_eq!(estimate.estimated_gdp, Some(expected));
    }

    #[test]
    fn non_positive_rates_yield_zero_gdp(
        population in any::<u64>(),
        rate in -1_000_000.0_f64 ..= 0.0,
    ) {
        let rates = rate_table("AAA", rate);
        let estimate = estimate_gdp(population, Some("AAA"), &rates, 1500.0);
        prop_assert_eq!(estimate.estimated_gdp, Some(0.0));
    }

    #[test]
    fn rate_is_some_only_when_code_resolves(
        population in any::<u64>(),
        code in "[A-Z]{3}",
        rate in -1_000.0_f64 .. 1_000.0,
    ) {
        let rates = rate_table("NGN", rate);
        let estimate = estimate_gdp(population, Some(&code), &rates, 1500.0);
        if code == "NGN" {
            prop_assert!(estimate.exchange_rate.is_some());
            prop_assert!(estimate.estimated_gdp.is_some());
        } else {
            prop_assert_eq!(estimate.exchange_rate, None);
            prop_assert_eq!(estimate.estimated_gdp, None);
        }
        prop_assert_eq!(estimate.currency_code, Some(code));
    }

    #[test]
    fn missing_currency_estimates_zero_gdp(population in any::<u64>()) {
        let rates = rate_table("NGN", 1600.0);
        let estimate = estimate_gdp(population, None, &rates, 1500.0);
        prop_assert_eq!(estimate.currency_code, None);
        prop_assert_eq!(estimate.exchange_rate, None);
        prop_assert_eq!(estimate.estimated_gdp, Some(0.0));
    }
}
