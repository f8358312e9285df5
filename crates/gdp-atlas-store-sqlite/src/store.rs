// crates/gdp-atlas-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Country Store
// Description: Durable CountryStore backed by SQLite WAL.
// Purpose: Persist country rows and the refresh status with atomic batches.
// Dependencies: gdp-atlas-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! This module implements a durable [`CountryStore`] using `SQLite`. A
//! case-insensitive unique index on country names makes the one-row-per-name
//! invariant structural, even against writers that bypass this crate. All
//! multi-statement operations run inside explicit transactions; `apply_refresh`
//! commits every record and the status timestamp together or not at all.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use gdp_atlas_core::AppStatus;
use gdp_atlas_core::Country;
use gdp_atlas_core::CountryCreate;
use gdp_atlas_core::CountryQuery;
use gdp_atlas_core::CountryStore;
use gdp_atlas_core::SortOrder;
use gdp_atlas_core::StoreError;
use gdp_atlas_core::from_unix_millis;
use gdp_atlas_core::now_utc;
use gdp_atlas_core::to_unix_millis;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Transaction;
use rusqlite::params;
use rusqlite::params_from_iter;
use rusqlite::types::Value;
use serde::Deserialize;
use thiserror::Error;
use time::OffsetDateTime;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum currency code length accepted by the store.
const MAX_CURRENCY_CODE_LENGTH: usize = 10;
/// Fixed identifier of the singleton status row.
const STATUS_ROW_ID: i64 = 1;
/// Column list shared by every country row query.
const COUNTRY_COLUMNS: &str = "id, name, capital, region, population, currency_code, \
     exchange_rate, estimated_gdp, flag_url, last_refreshed_at";

// ============================================================================
// SECTION: Config
// ============================================================================

/// Configuration for the `SQLite` country store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl SqliteStoreConfig {
    /// Creates a configuration with default timeouts.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error, Clone)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
        }
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed country store with WAL support.
///
/// # Invariants
/// - Connection access is serialized through a mutex.
/// - At most one row exists per name, compared case-insensitively.
#[derive(Clone, Debug)]
pub struct SqliteCountryStore {
    /// Shared connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteCountryStore {
    /// Opens or creates the store at the configured path.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the path is invalid, the database
    /// cannot be opened, or the persisted schema version does not match this
    /// build.
    pub fn new(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Opens a transient in-memory store, primarily for tests and embedders.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be created.
    pub fn in_memory() -> Result<Self, SqliteStoreError> {
        let mut connection = Connection::open_in_memory()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        connection
            .execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Locks the connection, mapping poisoning to a store error.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection
            .lock()
            .map_err(|_| SqliteStoreError::Db("connection mutex poisoned".to_string()))
    }
}

// ============================================================================
// SECTION: Path and Connection Setup
// ============================================================================

/// Validates the configured database path.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.exists() && path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Creates the parent directory of the database file when missing.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))?;
    }
    Ok(())
}

/// Opens an `SQLite` connection with durable defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch("PRAGMA journal_mode = wal;")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch("PRAGMA synchronous = full;")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(connection)
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS countries (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    capital TEXT,
                    region TEXT,
                    population INTEGER NOT NULL,
                    currency_code TEXT,
                    exchange_rate REAL,
                    estimated_gdp REAL,
                    flag_url TEXT,
                    last_refreshed_at INTEGER NOT NULL
                );
                CREATE UNIQUE INDEX IF NOT EXISTS idx_countries_name_nocase
                    ON countries (name COLLATE NOCASE);
                CREATE TABLE IF NOT EXISTS app_status (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    last_refreshed_at INTEGER
                );",
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        }
        Some(found) if found == SCHEMA_VERSION => {}
        Some(found) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "found schema version {found}, expected {SCHEMA_VERSION}"
            )));
        }
    }
    tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))
}

// ============================================================================
// SECTION: Row Mapping
// ============================================================================

/// Raw column values for one country row.
struct CountryRow {
    /// Row identifier.
    id: i64,
    /// Country name.
    name: String,
    /// Capital city.
    capital: Option<String>,
    /// Geographic region.
    region: Option<String>,
    /// Population as stored.
    population: i64,
    /// Currency code.
    currency_code: Option<String>,
    /// USD exchange rate.
    exchange_rate: Option<f64>,
    /// Estimated GDP.
    estimated_gdp: Option<f64>,
    /// Flag image URL.
    flag_url: Option<String>,
    /// Last refresh time in unix milliseconds.
    last_refreshed_at: i64,
}

/// Maps one result row into [`CountryRow`], matching [`COUNTRY_COLUMNS`].
fn map_country_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CountryRow> {
    Ok(CountryRow {
        id: row.get(0)?,
        name: row.get(1)?,
        capital: row.get(2)?,
        region: row.get(3)?,
        population: row.get(4)?,
        currency_code: row.get(5)?,
        exchange_rate: row.get(6)?,
        estimated_gdp: row.get(7)?,
        flag_url: row.get(8)?,
        last_refreshed_at: row.get(9)?,
    })
}

/// Converts stored column values into the domain record.
fn build_country(row: CountryRow) -> Result<Country, SqliteStoreError> {
    let population = u64::try_from(row.population)
        .map_err(|_| SqliteStoreError::Invalid("negative population in store".to_string()))?;
    let last_refreshed_at = from_unix_millis(row.last_refreshed_at).ok_or_else(|| {
        SqliteStoreError::Invalid("unrepresentable timestamp in store".to_string())
    })?;
    Ok(Country {
        id: row.id,
        name: row.name,
        capital: row.capital,
        region: row.region,
        population,
        currency_code: row.currency_code,
        exchange_rate: row.exchange_rate,
        estimated_gdp: row.estimated_gdp,
        flag_url: row.flag_url,
        last_refreshed_at,
    })
}

// ============================================================================
// SECTION: Write Helpers
// ============================================================================

/// Validates an upsert record against the shared record invariants.
fn validate_record(record: &CountryCreate) -> Result<i64, SqliteStoreError> {
    if record.name.trim().is_empty() {
        return Err(SqliteStoreError::Invalid("country name must be non-empty".to_string()));
    }
    if let Some(code) = &record.currency_code
        && code.len() > MAX_CURRENCY_CODE_LENGTH
    {
        return Err(SqliteStoreError::Invalid(format!(
            "currency code exceeds {MAX_CURRENCY_CODE_LENGTH} characters"
        )));
    }
    i64::try_from(record.population)
        .map_err(|_| SqliteStoreError::Invalid("population exceeds storable range".to_string()))
}

/// Upserts one record inside an open transaction.
fn upsert_in_tx(
    tx: &Transaction<'_>,
    record: &CountryCreate,
    refreshed_at_millis: i64,
) -> Result<Country, SqliteStoreError> {
    let population = validate_record(record)?;
    let existing: Option<i64> = tx
        .query_row(
            "SELECT id FROM countries WHERE name = ?1 COLLATE NOCASE",
            params![record.name],
            |row| row.get(0),
        )
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let id = match existing {
        Some(id) => {
            tx.execute(
                "UPDATE countries SET name = ?1, capital = ?2, region = ?3, population = ?4,
                     currency_code = ?5, exchange_rate = ?6, estimated_gdp = ?7, flag_url = ?8,
                     last_refreshed_at = ?9
                 WHERE id = ?10",
                params![
                    record.name,
                    record.capital,
                    record.region,
                    population,
                    record.currency_code,
                    record.exchange_rate,
                    record.estimated_gdp,
                    record.flag_url,
                    refreshed_at_millis,
                    id
                ],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            id
        }
        None => {
            tx.execute(
                "INSERT INTO countries (name, capital, region, population, currency_code,
                     exchange_rate, estimated_gdp, flag_url, last_refreshed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    record.name,
                    record.capital,
                    record.region,
                    population,
                    record.currency_code,
                    record.exchange_rate,
                    record.estimated_gdp,
                    record.flag_url,
                    refreshed_at_millis
                ],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.last_insert_rowid()
        }
    };
    let row = tx
        .query_row(
            &format!("SELECT {COUNTRY_COLUMNS} FROM countries WHERE id = ?1"),
            params![id],
            map_country_row,
        )
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    build_country(row)
}

/// Writes the singleton status row inside an open transaction.
fn set_status_in_tx(tx: &Transaction<'_>, millis: i64) -> Result<(), SqliteStoreError> {
    tx.execute(
        "INSERT INTO app_status (id, last_refreshed_at) VALUES (?1, ?2)
         ON CONFLICT(id) DO UPDATE SET last_refreshed_at = excluded.last_refreshed_at",
        params![STATUS_ROW_ID, millis],
    )
    .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Returns the SQL order clause for a sort order.
const fn order_clause(sort: SortOrder) -> &'static str {
    match sort {
        SortOrder::NameAsc => " ORDER BY name ASC",
        SortOrder::GdpDesc => " ORDER BY (estimated_gdp IS NULL) ASC, estimated_gdp DESC",
    }
}

// ============================================================================
// SECTION: CountryStore Implementation
// ============================================================================

impl CountryStore for SqliteCountryStore {
    fn find_by_name(&self, name: &str) -> Result<Option<Country>, StoreError> {
        let connection = self.lock()?;
        let row = connection
            .query_row(
                &format!("SELECT {COUNTRY_COLUMNS} FROM countries WHERE name = ?1 COLLATE NOCASE"),
                params![name],
                map_country_row,
            )
            .optional()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(row.map(build_country).transpose()?)
    }

    fn list(&self, query: &CountryQuery) -> Result<Vec<Country>, StoreError> {
        let connection = self.lock()?;
        let mut sql = format!("SELECT {COUNTRY_COLUMNS} FROM countries");
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();
        if let Some(region) = &query.region {
            clauses.push("region = ?");
            values.push(Value::Text(region.clone()));
        }
        if let Some(code) = &query.currency_code {
            clauses.push("currency_code = ?");
            values.push(Value::Text(code.clone()));
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(order_clause(query.sort));
        sql.push_str(" LIMIT ? OFFSET ?");
        values.push(Value::Integer(i64::try_from(query.limit).unwrap_or(i64::MAX)));
        values.push(Value::Integer(i64::try_from(query.offset).unwrap_or(i64::MAX)));
        let mut statement =
            connection.prepare(&sql).map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let rows = statement
            .query_map(params_from_iter(values), map_country_row)
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let mut countries = Vec::new();
        for row in rows {
            let row = row.map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            countries.push(build_country(row)?);
        }
        Ok(countries)
    }

    fn count(&self) -> Result<u64, StoreError> {
        let connection = self.lock()?;
        let count: i64 = connection
            .query_row("SELECT COUNT(*) FROM countries", params![], |row| row.get(0))
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn top_by_gdp(&self, limit: u64) -> Result<Vec<Country>, StoreError> {
        let connection = self.lock()?;
        let sql = format!(
            "SELECT {COUNTRY_COLUMNS} FROM countries{} LIMIT ?1",
            order_clause(SortOrder::GdpDesc)
        );
        let mut statement =
            connection.prepare(&sql).map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let rows = statement
            .query_map(params![i64::try_from(limit).unwrap_or(i64::MAX)], map_country_row)
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let mut countries = Vec::new();
        for row in rows {
            let row = row.map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            countries.push(build_country(row)?);
        }
        Ok(countries)
    }

    fn upsert(&self, record: &CountryCreate) -> Result<Country, StoreError> {
        let mut connection = self.lock()?;
        let tx = connection
            .transaction()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let country = upsert_in_tx(&tx, record, to_unix_millis(now_utc()))?;
        tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(country)
    }

    fn delete_by_name(&self, name: &str) -> Result<Option<Country>, StoreError> {
        let mut connection = self.lock()?;
        let tx = connection
            .transaction()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let row = tx
            .query_row(
                &format!("SELECT {COUNTRY_COLUMNS} FROM countries WHERE name = ?1 COLLATE NOCASE"),
                params![name],
                map_country_row,
            )
            .optional()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let Some(row) = row else {
            return Ok(None);
        };
        tx.execute("DELETE FROM countries WHERE id = ?1", params![row.id])
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(Some(build_country(row)?))
    }

    fn status(&self) -> Result<Option<AppStatus>, StoreError> {
        let connection = self.lock()?;
        let millis: Option<Option<i64>> = connection
            .query_row(
                "SELECT last_refreshed_at FROM app_status WHERE id = ?1",
                params![STATUS_ROW_ID],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        match millis {
            None => Ok(None),
            Some(None) => Ok(Some(AppStatus {
                last_refreshed_at: None,
            })),
            Some(Some(value)) => {
                let last_refreshed_at = from_unix_millis(value).ok_or_else(|| {
                    SqliteStoreError::Invalid("unrepresentable timestamp in store".to_string())
                })?;
                Ok(Some(AppStatus {
                    last_refreshed_at: Some(last_refreshed_at),
                }))
            }
        }
    }

    fn set_last_refreshed(&self, refreshed_at: OffsetDateTime) -> Result<(), StoreError> {
        let mut connection = self.lock()?;
        let tx = connection
            .transaction()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        set_status_in_tx(&tx, to_unix_millis(refreshed_at))?;
        tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(())
    }

    fn apply_refresh(
        &self,
        records: &[CountryCreate],
        refreshed_at: OffsetDateTime,
    ) -> Result<(), StoreError> {
        let mut connection = self.lock()?;
        let tx = connection
            .transaction()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let millis = to_unix_millis(refreshed_at);
        for record in records {
            upsert_in_tx(&tx, record, millis)?;
        }
        set_status_in_tx(&tx, millis)?;
        tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
