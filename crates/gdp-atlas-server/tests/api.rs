// crates/gdp-atlas-server/tests/api.rs
// ============================================================================
// Module: GDP Atlas API Tests
// Description: Handler-level tests over hermetic in-memory backends.
// Purpose: Verify response bodies, status mapping, and the refresh flow.
// ============================================================================

//! Handler-level tests for the HTTP surface.

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

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use gdp_atlas_core::CountryStore;
use gdp_atlas_core::InMemoryCountryStore;
use gdp_atlas_core::RateTable;
use gdp_atlas_core::RawCountry;
use gdp_atlas_core::RawCurrency;
use gdp_atlas_core::RefreshConfig;
use gdp_atlas_core::RefreshOrchestrator;
use gdp_atlas_core::SourceError;
use gdp_atlas_core::SourceGateway;
use gdp_atlas_core::SummaryReporter;
use gdp_atlas_server::ApiError;
use gdp_atlas_server::AppState;
use gdp_atlas_server::PngSummaryReporter;
use gdp_atlas_server::api::ListParams;
use gdp_atlas_server::api::delete_country;
use gdp_atlas_server::api::get_country;
use gdp_atlas_server::api::get_status;
use gdp_atlas_server::api::get_summary_image;
use gdp_atlas_server::api::list_countries;
use gdp_atlas_server::api::refresh_countries;
use serde_json::Value;

/// Gateway stub serving a canned Wakanda dataset or a canned failure.
struct StubGateway {
    /// When set, both fetches fail with this source name.
    fail_source: Option<&'static str>,
}

#[async_trait]
impl SourceGateway for StubGateway {
    async fn fetch_exchange_rates(&self) -> Result<RateTable, SourceError> {
        if let Some(source) = self.fail_source {
            return Err(SourceError::Unavailable {
                source: source.to_owned(),
                details: "connect timeout".to_owned(),
            });
        }
        let mut rates = RateTable::new();
        rates.insert("WKD".to_owned(), 2.0);
        rates.insert("GHS".to_owned(), 15.0);
        Ok(rates)
    }

    async fn fetch_countries(&self) -> Result<Vec<RawCountry>, SourceError> {
        if let Some(source) = self.fail_source {
            return Err(SourceError::Unavailable {
                source: source.to_owned(),
                details: "connect timeout".to_owned(),
            });
        }
        Ok(vec![
            RawCountry {
                name: Some("Wakanda".to_owned()),
                capital: Some("Birnin Zana".to_owned()),
                region: Some("Africa".to_owned()),
                population: Some(9_000_000),
                currencies: vec![RawCurrency {
                    code: Some("WKD".to_owned()),
                }],
                flag: Some("https://flags.example/wakanda.svg".to_owned()),
            },
            RawCountry {
                name: Some("Ghana".to_owned()),
                capital: Some("Accra".to_owned()),
                region: Some("Africa".to_owned()),
                population: Some(33_000_000),
                currencies: vec![RawCurrency {
                    code: Some("GHS".to_owned()),
                }],
                flag: None,
            },
            // Missing population, must be skipped.
            RawCountry {
                name: Some("Atlantis".to_owned()),
                ..RawCountry::default()
            },
        ])
    }
}

/// Builds hermetic app state rooted in a temp directory.
fn state_with(fail_source: Option<&'static str>) -> (AppState, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let image_path: PathBuf = dir.path().join("summary.png");
    let store: Arc<dyn CountryStore> = Arc::new(InMemoryCountryStore::new());
    let gateway: Arc<dyn SourceGateway> = Arc::new(StubGateway { fail_source });
    let reporter: Arc<dyn SummaryReporter> =
        Arc::new(PngSummaryReporter::new(image_path.clone()));
    let orchestrator = Arc::new(RefreshOrchestrator::new(
        gateway,
        store.clone(),
        reporter,
        RefreshConfig::default(),
    ));
    (
        AppState {
            store,
            orchestrator,
            image_path,
        },
        dir,
    )
}

/// Reads a response body as JSON.
async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn refresh_populates_cache_and_serves_lookup() {
    let (state, _dir) = state_with(None);
    let refreshed = refresh_countries(State(state.clone())).await.unwrap();
    assert_eq!(refreshed.0.status, "success");

    let wakanda = get_country(State(state.clone()), Path("wakanda".to_owned()))
        .await
        .unwrap();
    assert_eq!(wakanda.0.name, "Wakanda");
    assert_eq!(wakanda.0.currency_code.as_deref(), Some("WKD"));
    assert_eq!(wakanda.0.exchange_rate, Some(2.0));
    assert_eq!(wakanda.0.estimated_gdp, Some(9_000_000.0 * 1500.0 / 2.0));
    assert_eq!(wakanda.0.last_refreshed_at, refreshed.0.refreshed_at);

    // The incomplete entry is skipped, not stored.
    let missing = get_country(State(state), Path("Atlantis".to_owned())).await;
    assert!(matches!(missing, Err(ApiError::CountryNotFound)));
}

#[tokio::test]
async fn refresh_writes_summary_image() {
    let (state, _dir) = state_with(None);
    let _ = refresh_countries(State(state.clone())).await.unwrap();

    let response = get_summary_image(State(state)).await.into_response();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "image/png"
    );
    let bytes = axum::body::to_bytes(response.into_body(), 10 * 1024 * 1024)
        .await
        .unwrap();
    assert_eq!(&bytes[..8], &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]);
}

#[tokio::test]
async fn missing_summary_image_returns_contract_body() {
    let (state, _dir) = state_with(None);
    let response = get_summary_image(State(state)).await.into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(
        body["error"],
        "Summary image not found. Run /countries/refresh to generate it."
    );
}

#[tokio::test]
async fn source_failure_maps_to_service_unavailable() {
    let (state, _dir) = state_with(Some("Exchange Rates API"));
    let error = refresh_countries(State(state.clone())).await.unwrap_err();
    let response = error.into_response();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["error"], "External data source unavailable");
    assert_eq!(
        body["details"],
        "Could not fetch data from Exchange Rates API"
    );
    // Nothing was written.
    let status = get_status(State(state)).await.unwrap();
    assert_eq!(status.0.total_countries, 0);
    assert_eq!(status.0.last_refreshed_at, None);
}

#[tokio::test]
async fn list_supports_filters_and_gdp_sort() {
    let (state, _dir) = state_with(None);
    let _ = refresh_countries(State(state.clone())).await.unwrap();

    let params = ListParams {
        sort: Some("gdp_desc".to_owned()),
        ..ListParams::default()
    };
    let rows = list_countries(State(state.clone()), Query(params))
        .await
        .unwrap();
    // Wakanda: 9M * 1500 / 2 = 6.75e9; Ghana: 33M * 1500 / 15 = 3.3e9.
    assert_eq!(rows.0[0].name, "Wakanda");
    assert_eq!(rows.0[1].name, "Ghana");

    let params = ListParams {
        currency: Some("GHS".to_owned()),
        ..ListParams::default()
    };
    let rows = list_countries(State(state), Query(params)).await.unwrap();
    assert_eq!(rows.0.len(), 1);
    assert_eq!(rows.0[0].name, "Ghana");
}

#[tokio::test]
async fn invalid_list_parameters_return_validation_body() {
    let (state, _dir) = state_with(None);
    let params = ListParams {
        sort: Some("population".to_owned()),
        limit: Some("0".to_owned()),
        ..ListParams::default()
    };
    let error = list_countries(State(state), Query(params))
        .await
        .unwrap_err();
    let response = error.into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Validation failed");
    assert!(body["details"]["sort"].is_string());
    assert!(body["details"]["limit"].is_string());
}

#[tokio::test]
async fn unknown_country_returns_not_found_body() {
    let (state, _dir) = state_with(None);
    let error = get_country(State(state), Path("Narnia".to_owned()))
        .await
        .unwrap_err();
    let response = error.into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Country not found");
}

#[tokio::test]
async fn delete_confirms_then_reports_not_found() {
    let (state, _dir) = state_with(None);
    let _ = refresh_countries(State(state.clone())).await.unwrap();

    let deleted = delete_country(State(state.clone()), Path("WAKANDA".to_owned()))
        .await
        .unwrap();
    assert_eq!(deleted.0.status, "success");
    assert_eq!(deleted.0.message, "Successfully deleted Wakanda");

    let error = delete_country(State(state), Path("Wakanda".to_owned()))
        .await
        .unwrap_err();
    assert_eq!(error, ApiError::CountryNotFound);
}

#[tokio::test]
async fn status_reports_count_and_refresh_time() {
    let (state, _dir) = state_with(None);
    let status = get_status(State(state.clone())).await.unwrap();
    assert_eq!(status.0.total_countries, 0);
    assert_eq!(status.0.last_refreshed_at, None);

    let refreshed = refresh_countries(State(state.clone())).await.unwrap();
    let status = get_status(State(state)).await.unwrap();
    assert_eq!(status.0.total_countries, 2);
    assert_eq!(status.0.last_refreshed_at, Some(refreshed.0.refreshed_at));
}
