// crates/gdp-atlas-server/src/config.rs
// ============================================================================
// Module: GDP Atlas Server Configuration
// Description: TOML and environment driven configuration with load guards.
// Purpose: Resolve server, database, source, and summary settings fail-closed.
// Dependencies: gdp-atlas-sources, serde, thiserror, toml
// ============================================================================

//! ## Overview
//! Configuration resolves in three steps: an optional TOML file named by
//! `GDP_ATLAS_CONFIG`, targeted environment overrides, then validation.
//! File loading fails closed on oversized or non-UTF-8 input so a corrupt or
//! hostile config file can never half-apply. Every section has defaults; the
//! server runs with no file at all.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use gdp_atlas_core::DEFAULT_GDP_MULTIPLIER;
use gdp_atlas_sources::HttpSourceConfig;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable naming the TOML config file.
pub const CONFIG_ENV: &str = "GDP_ATLAS_CONFIG";
/// Environment override for the database path.
pub const DATABASE_PATH_ENV: &str = "GDP_ATLAS_DATABASE_PATH";
/// Environment override for the bind address.
pub const BIND_ADDR_ENV: &str = "GDP_ATLAS_BIND_ADDR";
/// Environment override for the summary image path.
pub const IMAGE_PATH_ENV: &str = "GDP_ATLAS_IMAGE_PATH";
/// Maximum accepted config file size in bytes.
const MAX_CONFIG_BYTES: u64 = 1024 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("config io error: {0}")]
    Io(String),
    /// Config contents failed a guard or validation.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Sections
// ============================================================================

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the server binds to.
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_owned(),
        }
    }
}

/// Database settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("gdp-atlas.db"),
        }
    }
}

/// Summary artifact settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// Path the summary PNG is written to and served from.
    pub image_path: PathBuf,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            image_path: PathBuf::from("cache/summary.png"),
        }
    }
}

/// Refresh pipeline settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RefreshSettings {
    /// Multiplier used by the GDP estimation formula.
    pub gdp_multiplier: f64,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            gdp_multiplier: DEFAULT_GDP_MULTIPLIER,
        }
    }
}

// ============================================================================
// SECTION: Root Config
// ============================================================================

/// Complete server configuration.
///
/// # Invariants
/// - `server.bind_addr` parses as a socket address.
/// - `refresh.gdp_multiplier` is finite and positive.
/// - Source timeout and size limits are positive.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// External source settings.
    pub sources: HttpSourceConfig,
    /// Summary artifact settings.
    pub summary: SummaryConfig,
    /// Refresh pipeline settings.
    pub refresh: RefreshSettings,
}

impl AtlasConfig {
    /// Loads configuration from the environment.
    ///
    /// Reads the file named by [`CONFIG_ENV`] when set, applies environment
    /// overrides, then validates.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file fails a load guard or the
    /// resolved configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from one TOML file with fail-closed guards.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read and
    /// [`ConfigError::Invalid`] when it is oversized, not UTF-8, or fails to
    /// parse.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let metadata = std::fs::metadata(path)
            .map_err(|err| ConfigError::Io(format!("cannot stat config file: {err}")))?;
        if metadata.len() > MAX_CONFIG_BYTES {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_owned()));
        }
        let bytes = std::fs::read(path)
            .map_err(|err| ConfigError::Io(format!("cannot read config file: {err}")))?;
        let text = String::from_utf8(bytes)
            .map_err(|_| ConfigError::Invalid("config file must be valid utf-8".to_owned()))?;
        toml::from_str(&text)
            .map_err(|err| ConfigError::Invalid(format!("config parse error: {err}")))
    }

    /// Applies targeted environment overrides onto the loaded values.
    fn apply_env_overrides(&mut self) {
        if let Some(value) = std::env::var_os(DATABASE_PATH_ENV) {
            self.database.path = PathBuf::from(value);
        }
        if let Ok(value) = std::env::var(BIND_ADDR_ENV) {
            self.server.bind_addr = value;
        }
        if let Some(value) = std::env::var_os(IMAGE_PATH_ENV) {
            self.summary.image_path = PathBuf::from(value);
        }
    }

    /// Validates the resolved configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        self.server
            .bind_addr
            .parse::<SocketAddr>()
            .map_err(|_| {
                ConfigError::Invalid(format!("invalid bind address: {}", self.server.bind_addr))
            })?;
        if !self.refresh.gdp_multiplier.is_finite() || self.refresh.gdp_multiplier <= 0.0 {
            return Err(ConfigError::Invalid(
                "gdp_multiplier must be finite and positive".to_owned(),
            ));
        }
        if self.sources.timeout_ms == 0 {
            return Err(ConfigError::Invalid("source timeout_ms must be positive".to_owned()));
        }
        if self.sources.max_response_bytes == 0 {
            return Err(ConfigError::Invalid(
                "source max_response_bytes must be positive".to_owned(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::panic,
        clippy::float_cmp,
        clippy::missing_docs_in_private_items,
        reason = "Tests use unwrap/panic and exact float comparison for clarity"
    )]
    #![allow(unsafe_code, reason = "Test harness mutates process env for configuration.")]

    use std::io::Write;

    use super::*;

    fn write_config(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        file.flush().unwrap();
        file
    }

    /// Sets an environment variable for the current process.
    fn set_var(key: &str, value: &str) {
        // SAFETY: Tests control process lifecycle and set env vars before loading.
        unsafe {
            std::env::set_var(key, value);
        }
    }

    /// Removes an environment variable from the current process.
    fn remove_var(key: &str) {
        // SAFETY: Tests cleanup env vars after use in a controlled process.
        unsafe {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn defaults_validate() {
        let config = AtlasConfig::default();
        config.validate().unwrap();
        assert_eq!(config.server.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.refresh.gdp_multiplier, DEFAULT_GDP_MULTIPLIER);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let file = write_config(
            b"[server]\nbind_addr = \"127.0.0.1:8080\"\n\n[refresh]\ngdp_multiplier = 1200.0\n",
        );
        let config = AtlasConfig::load_file(file.path()).unwrap();
        assert_eq!(config.server.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.refresh.gdp_multiplier, 1200.0);
        assert_eq!(config.database.path, PathBuf::from("gdp-atlas.db"));
        assert_eq!(config.sources.timeout_ms, 10_000);
    }

    #[test]
    fn non_utf8_file_is_rejected() {
        let file = write_config(&[0xFF, 0xFE, 0x00, 0x42]);
        assert!(matches!(
            AtlasConfig::load_file(file.path()).unwrap_err(),
            ConfigError::Invalid(_)
        ));
    }

    #[test]
    fn unparsable_file_is_rejected() {
        let file = write_config(b"not = = toml");
        assert!(matches!(
            AtlasConfig::load_file(file.path()).unwrap_err(),
            ConfigError::Invalid(_)
        ));
    }

    #[test]
    fn oversized_file_is_rejected() {
        let padding = vec![b'#'; usize::try_from(MAX_CONFIG_BYTES).unwrap() + 1];
        let file = write_config(&padding);
        assert!(matches!(
            AtlasConfig::load_file(file.path()).unwrap_err(),
            ConfigError::Invalid(_)
        ));
    }

    #[test]
    fn env_overrides_win_over_file_values() {
        let file = write_config(
            b"[server]\nbind_addr = \"127.0.0.1:8080\"\n\n[database]\npath = \"from-file.db\"\n",
        );
        set_var(CONFIG_ENV, file.path().to_str().unwrap());
        set_var(DATABASE_PATH_ENV, "from-env.db");
        set_var(BIND_ADDR_ENV, "127.0.0.1:9090");
        set_var(IMAGE_PATH_ENV, "env/summary.png");
        let loaded = AtlasConfig::load();
        remove_var(CONFIG_ENV);
        remove_var(DATABASE_PATH_ENV);
        remove_var(BIND_ADDR_ENV);
        remove_var(IMAGE_PATH_ENV);

        let config = loaded.unwrap();
        assert_eq!(config.database.path, PathBuf::from("from-env.db"));
        assert_eq!(config.server.bind_addr, "127.0.0.1:9090");
        assert_eq!(config.summary.image_path, PathBuf::from("env/summary.png"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            AtlasConfig::load_file(Path::new("/nonexistent/atlas.toml")).unwrap_err(),
            ConfigError::Io(_)
        ));
    }

    #[test]
    fn invalid_bind_address_fails_validation() {
        let mut config = AtlasConfig::default();
        config.server.bind_addr = "not-an-address".to_owned();
        assert!(matches!(config.validate().unwrap_err(), ConfigError::Invalid(_)));
    }

    #[test]
    fn non_positive_multiplier_fails_validation() {
        let mut config = AtlasConfig::default();
        config.refresh.gdp_multiplier = 0.0;
        assert!(config.validate().is_err());
        config.refresh.gdp_multiplier = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_source_limits_fail_validation() {
        let mut config = AtlasConfig::default();
        config.sources.timeout_ms = 0;
        assert!(config.validate().is_err());
        let mut config = AtlasConfig::default();
        config.sources.max_response_bytes = 0;
        assert!(config.validate().is_err());
    }
}
