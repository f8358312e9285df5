// crates/gdp-atlas-server/src/main.rs
// ============================================================================
// Module: GDP Atlas Server Binary
// Description: Process entry point wiring config, store, sources, and router.
// Purpose: Boot the country cache service behind the core trait seams.
// Dependencies: gdp-atlas-server, gdp-atlas-sources, gdp-atlas-store-sqlite
// ============================================================================

//! GDP Atlas server binary. Loads configuration, opens the `SQLite` store,
//! builds the source gateway and summary reporter, and serves the axum
//! router on the configured address.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use gdp_atlas_core::CountryStore;
use gdp_atlas_core::RefreshConfig;
use gdp_atlas_core::RefreshOrchestrator;
use gdp_atlas_core::SourceGateway;
use gdp_atlas_core::SummaryReporter;
use gdp_atlas_server::AppState;
use gdp_atlas_server::AtlasConfig;
use gdp_atlas_server::PngSummaryReporter;
use gdp_atlas_server::router;
use gdp_atlas_sources::HttpSourceGateway;
use gdp_atlas_store_sqlite::SqliteCountryStore;
use gdp_atlas_store_sqlite::SqliteStoreConfig;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Boots the server and serves until the listener fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AtlasConfig::load()?;
    let store: Arc<dyn CountryStore> = Arc::new(SqliteCountryStore::new(&SqliteStoreConfig::new(
        config.database.path.clone(),
    ))?);
    let gateway: Arc<dyn SourceGateway> =
        Arc::new(HttpSourceGateway::new(config.sources.clone())?);
    let reporter: Arc<dyn SummaryReporter> =
        Arc::new(PngSummaryReporter::new(config.summary.image_path.clone()));
    let orchestrator = Arc::new(RefreshOrchestrator::new(
        gateway,
        store.clone(),
        reporter,
        RefreshConfig {
            gdp_multiplier: config.refresh.gdp_multiplier,
        },
    ));
    let state = AppState {
        store,
        orchestrator,
        image_path: config.summary.image_path.clone(),
    };

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;
    tracing::info!(bind_addr = %config.server.bind_addr, "gdp-atlas server listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
