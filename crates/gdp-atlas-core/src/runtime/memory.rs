// crates/gdp-atlas-core/src/runtime/memory.rs
// ============================================================================
// Module: GDP Atlas In-Memory Store
// Description: Hermetic reference implementation of the country store.
// Purpose: Back tests and embedders without a durable database.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! `InMemoryCountryStore` mirrors the durable backend's observable semantics:
//! case-insensitive name identity, stable identifiers across updates, the
//! same sort orders, and an all-or-nothing `apply_refresh`. It is the store
//! the server tests run against.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;
use std::sync::Mutex;

use time::OffsetDateTime;

use crate::core::country::AppStatus;
use crate::core::country::Country;
use crate::core::country::CountryCreate;
use crate::core::country::CountryQuery;
use crate::core::country::SortOrder;
use crate::core::time::now_utc;
use crate::interfaces::CountryStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Store
// ============================================================================

/// In-memory country store guarded by a single mutex.
#[derive(Debug, Default)]
pub struct InMemoryCountryStore {
    /// Mutable store state.
    state: Mutex<MemoryState>,
}

/// Rows, identifier counter, and status held behind the lock.
#[derive(Debug, Clone, Default)]
struct MemoryState {
    /// Cached rows in insertion order.
    rows: Vec<Country>,
    /// Next identifier to assign.
    next_id: i64,
    /// Completion time of the most recent refresh.
    last_refreshed_at: Option<OffsetDateTime>,
}

impl InMemoryCountryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the state, mapping poisoning to a store error.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Store("store mutex poisoned".to_owned()))
    }
}

/// Validates an upsert record against the shared record invariants.
fn validate_record(record: &CountryCreate) -> Result<(), StoreError> {
    if record.name.trim().is_empty() {
        return Err(StoreError::Invalid("country name must be non-empty".to_owned()));
    }
    if let Some(code) = &record.currency_code
        && code.len() > 10
    {
        return Err(StoreError::Invalid(
            "currency code exceeds ten characters".to_owned(),
        ));
    }
    Ok(())
}

/// Upserts one record into the state with an explicit timestamp.
fn upsert_at(
    state: &mut MemoryState,
    record: &CountryCreate,
    refreshed_at: OffsetDateTime,
) -> Result<Country, StoreError> {
    validate_record(record)?;
    let existing = state
        .rows
        .iter_mut()
        .find(|row| row.name.eq_ignore_ascii_case(&record.name));
    let row = if let Some(row) = existing {
        row.name = record.name.clone();
        row.capital = record.capital.clone();
        row.region = record.region.clone();
        row.population = record.population;
        row.currency_code = record.currency_code.clone();
        row.exchange_rate = record.exchange_rate;
        row.estimated_gdp = record.estimated_gdp;
        row.flag_url = record.flag_url.clone();
        row.last_refreshed_at = refreshed_at;
        row.clone()
    } else {
        state.next_id += 1;
        let row = Country {
            id: state.next_id,
            name: record.name.clone(),
            capital: record.capital.clone(),
            region: record.region.clone(),
            population: record.population,
            currency_code: record.currency_code.clone(),
            exchange_rate: record.exchange_rate,
            estimated_gdp: record.estimated_gdp,
            flag_url: record.flag_url.clone(),
            last_refreshed_at: refreshed_at,
        };
        state.rows.push(row.clone());
        row
    };
    Ok(row)
}

/// Compares two rows for GDP-descending order with missing estimates last.
fn gdp_desc(a: &Country, b: &Country) -> Ordering {
    match (a.estimated_gdp, b.estimated_gdp) {
        (Some(lhs), Some(rhs)) => rhs.partial_cmp(&lhs).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl CountryStore for InMemoryCountryStore {
    fn find_by_name(&self, name: &str) -> Result<Option<Country>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .rows
            .iter()
            .find(|row| row.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    fn list(&self, query: &CountryQuery) -> Result<Vec<Country>, StoreError> {
        let state = self.lock()?;
        let mut rows: Vec<Country> = state
            .rows
            .iter()
            .filter(|row| {
                query
                    .region
                    .as_deref()
                    .is_none_or(|region| row.region.as_deref() == Some(region))
            })
            .filter(|row| {
                query
                    .currency_code
                    .as_deref()
                    .is_none_or(|code| row.currency_code.as_deref() == Some(code))
            })
            .cloned()
            .collect();
        match query.sort {
            SortOrder::NameAsc => rows.sort_by(|a, b| a.name.cmp(&b.name)),
            SortOrder::GdpDesc => rows.sort_by(gdp_desc),
        }
        let offset = usize::try_from(query.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    fn count(&self) -> Result<u64, StoreError> {
        let state = self.lock()?;
        Ok(state.rows.len() as u64)
    }

    fn top_by_gdp(&self, limit: u64) -> Result<Vec<Country>, StoreError> {
        let state = self.lock()?;
        let mut rows: Vec<Country> = state.rows.clone();
        rows.sort_by(gdp_desc);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(rows.into_iter().take(limit).collect())
    }

    fn upsert(&self, record: &CountryCreate) -> Result<Country, StoreError> {
        let mut state = self.lock()?;
        upsert_at(&mut state, record, now_utc())
    }

    fn delete_by_name(&self, name: &str) -> Result<Option<Country>, StoreError> {
        let mut state = self.lock()?;
        let position = state
            .rows
            .iter()
            .position(|row| row.name.eq_ignore_ascii_case(name));
        Ok(position.map(|index| state.rows.remove(index)))
    }

    fn status(&self) -> Result<Option<AppStatus>, StoreError> {
        let state = self.lock()?;
        Ok(state.last_refreshed_at.map(|last_refreshed_at| AppStatus {
            last_refreshed_at: Some(last_refreshed_at),
        }))
    }

    fn set_last_refreshed(&self, refreshed_at: OffsetDateTime) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.last_refreshed_at = Some(refreshed_at);
        Ok(())
    }

    fn apply_refresh(
        &self,
        records: &[CountryCreate],
        refreshed_at: OffsetDateTime,
    ) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        // Apply onto a copy so validation failures leave the store unchanged.
        let mut staged = state.clone();
        for record in records {
            upsert_at(&mut staged, record, refreshed_at)?;
        }
        staged.last_refreshed_at = Some(refreshed_at);
        *state = staged;
        Ok(())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
