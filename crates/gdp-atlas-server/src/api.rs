// crates/gdp-atlas-server/src/api.rs
// ============================================================================
// Module: GDP Atlas HTTP Surface
// Description: Axum router, handlers, and stable error-body mapping.
// Purpose: Serve the country cache and refresh pipeline over HTTP.
// Dependencies: gdp-atlas-core, axum, serde, serde_json, tracing
// ============================================================================

//! ## Overview
//! Handlers translate between the HTTP surface and the core trait seams. Error
//! bodies are part of the API contract: every failure kind maps to one stable
//! JSON shape, and internal store failures are logged server-side while the
//! caller sees only a generic body. Lookup, delete, and filter parameters pass
//! through to the store untouched; pagination and sort parameters are
//! validated here.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use gdp_atlas_core::AppStatus;
use gdp_atlas_core::Country;
use gdp_atlas_core::CountryQuery;
use gdp_atlas_core::CountryStore;
use gdp_atlas_core::DEFAULT_LIST_LIMIT;
use gdp_atlas_core::RefreshError;
use gdp_atlas_core::RefreshOrchestrator;
use gdp_atlas_core::SortOrder;
use gdp_atlas_core::StoreError;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use time::OffsetDateTime;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum accepted page size for country listings.
const MAX_LIST_LIMIT: u64 = 1_000;

// ============================================================================
// SECTION: State
// ============================================================================

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Country cache backend.
    pub store: Arc<dyn CountryStore>,
    /// Refresh pipeline over the configured backends.
    pub orchestrator: Arc<RefreshOrchestrator>,
    /// Path the summary image is served from.
    pub image_path: PathBuf,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// API failure kinds with stable response bodies.
///
/// # Invariants
/// - Bodies and status codes are part of the API contract; internal details
///   never leak past [`ApiError::Internal`].
#[derive(Debug, PartialEq, Eq)]
pub enum ApiError {
    /// An external source could not be fetched.
    SourceUnavailable {
        /// Human-readable source name.
        source: String,
    },
    /// Caller input failed validation, keyed by parameter name.
    Validation(BTreeMap<String, String>),
    /// No country matched the requested name.
    CountryNotFound,
    /// The summary image has not been generated yet.
    ImageNotFound,
    /// Unexpected backend failure, details logged server-side.
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::SourceUnavailable { source } => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": "External data source unavailable",
                    "details": format!("Could not fetch data from {source}"),
                })),
            )
                .into_response(),
            Self::Validation(details) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "Validation failed",
                    "details": details,
                })),
            )
                .into_response(),
            Self::CountryNotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Country not found" })),
            )
                .into_response(),
            Self::ImageNotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "Summary image not found. Run /countries/refresh to generate it.",
                })),
            )
                .into_response(),
            Self::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
                .into_response(),
        }
    }
}

/// Logs a store failure and returns the generic internal error.
fn internal(err: &StoreError) -> ApiError {
    tracing::error!(error = %err, "store operation failed");
    ApiError::Internal
}

// ============================================================================
// SECTION: Wire Shapes
// ============================================================================

/// Response body for a successful refresh.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// Always `success`.
    pub status: &'static str,
    /// Shared timestamp stamped on the committed cycle.
    #[serde(with = "time::serde::rfc3339")]
    pub refreshed_at: OffsetDateTime,
}

/// Response body for a successful delete.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// Always `success`.
    pub status: &'static str,
    /// Confirmation message naming the deleted country.
    pub message: String,
}

/// Response body for the status endpoint.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Number of cached countries.
    pub total_countries: u64,
    /// Completion time of the most recent refresh, when any.
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_refreshed_at: Option<OffsetDateTime>,
}

/// Raw query parameters for country listings, validated before use.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListParams {
    /// Exact region filter.
    pub region: Option<String>,
    /// Exact currency code filter.
    pub currency: Option<String>,
    /// Sort order selector; only `gdp_desc` is accepted.
    pub sort: Option<String>,
    /// Rows to skip.
    pub offset: Option<String>,
    /// Page size, 1 through [`MAX_LIST_LIMIT`].
    pub limit: Option<String>,
}

/// Validates raw list parameters into a store query.
fn build_query(params: &ListParams) -> Result<CountryQuery, ApiError> {
    let mut errors = BTreeMap::new();
    let sort = match params.sort.as_deref() {
        None => SortOrder::NameAsc,
        Some("gdp_desc") => SortOrder::GdpDesc,
        Some(_) => {
            errors.insert("sort".to_owned(), "must be 'gdp_desc'".to_owned());
            SortOrder::NameAsc
        }
    };
    let offset = match params.offset.as_deref() {
        None => 0,
        Some(raw) => raw.parse::<u64>().unwrap_or_else(|_| {
            errors.insert("offset".to_owned(), "must be a non-negative integer".to_owned());
            0
        }),
    };
    let limit = match params.limit.as_deref() {
        None => DEFAULT_LIST_LIMIT,
        Some(raw) => match raw.parse::<u64>() {
            Ok(value) if (1..=MAX_LIST_LIMIT).contains(&value) => value,
            _ => {
                errors.insert(
                    "limit".to_owned(),
                    format!("must be an integer between 1 and {MAX_LIST_LIMIT}"),
                );
                DEFAULT_LIST_LIMIT
            }
        },
    };
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }
    Ok(CountryQuery {
        region: params.region.clone(),
        currency_code: params.currency.clone(),
        sort,
        offset,
        limit,
    })
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// `POST /countries/refresh`: runs one refresh cycle.
pub async fn refresh_countries(
    State(state): State<AppState>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let outcome = state.orchestrator.run().await.map_err(|err| match err {
        RefreshError::Source(source) => {
            tracing::warn!(error = %source, "refresh aborted: source unavailable");
            ApiError::SourceUnavailable {
                source: source.source().to_owned(),
            }
        }
        RefreshError::Store(store_err) => internal(&store_err),
    })?;
    if let Some(summary_error) = &outcome.summary_error {
        tracing::warn!(error = %summary_error, "summary render failed after refresh");
    }
    tracing::info!(records = outcome.records_applied, "refresh cycle committed");
    Ok(Json(RefreshResponse {
        status: "success",
        refreshed_at: outcome.refreshed_at,
    }))
}

/// `GET /countries`: lists cached countries with filters and pagination.
pub async fn list_countries(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Country>>, ApiError> {
    let query = build_query(&params)?;
    let countries = state.store.list(&query).map_err(|err| internal(&err))?;
    Ok(Json(countries))
}

/// `GET /countries/{name}`: looks up one country case-insensitively.
pub async fn get_country(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Country>, ApiError> {
    let country = state
        .store
        .find_by_name(&name)
        .map_err(|err| internal(&err))?
        .ok_or(ApiError::CountryNotFound)?;
    Ok(Json(country))
}

/// `DELETE /countries/{name}`: deletes one country case-insensitively.
pub async fn delete_country(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let deleted = state
        .store
        .delete_by_name(&name)
        .map_err(|err| internal(&err))?
        .ok_or(ApiError::CountryNotFound)?;
    Ok(Json(DeleteResponse {
        status: "success",
        message: format!("Successfully deleted {}", deleted.name),
    }))
}

/// `GET /status`: reports the cache size and last refresh time.
pub async fn get_status(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    let total_countries = state.store.count().map_err(|err| internal(&err))?;
    let last_refreshed_at = state
        .store
        .status()
        .map_err(|err| internal(&err))?
        .and_then(|status: AppStatus| status.last_refreshed_at);
    Ok(Json(StatusResponse {
        total_countries,
        last_refreshed_at,
    }))
}

/// `GET /countries/image`: serves the rendered summary PNG.
pub async fn get_summary_image(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    match tokio::fs::read(&state.image_path).await {
        Ok(bytes) => Ok(([(header::CONTENT_TYPE, "image/png")], bytes)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(ApiError::ImageNotFound),
        Err(err) => {
            tracing::error!(error = %err, "summary image read failed");
            Err(ApiError::Internal)
        }
    }
}

// ============================================================================
// SECTION: Router
// ============================================================================

/// Builds the application router over the shared state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/countries/refresh", post(refresh_countries))
        .route("/countries/image", get(get_summary_image))
        .route("/countries", get(list_countries))
        .route("/countries/{name}", get(get_country).delete(delete_country))
        .route("/status", get(get_status))
        .with_state(state)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::panic,
        clippy::missing_docs_in_private_items,
        reason = "Tests use unwrap/panic for assertion clarity"
    )]

    use super::*;

    #[test]
    fn build_query_defaults_match_store_defaults() {
        let query = build_query(&ListParams::default()).unwrap();
        assert_eq!(query, CountryQuery::default());
    }

    #[test]
    fn build_query_collects_every_invalid_parameter() {
        let params = ListParams {
            sort: Some("population".to_owned()),
            offset: Some("-1".to_owned()),
            limit: Some("0".to_owned()),
            ..ListParams::default()
        };
        let Err(ApiError::Validation(details)) = build_query(&params) else {
            panic!("expected validation failure");
        };
        assert_eq!(
            details.keys().collect::<Vec<_>>(),
            vec!["limit", "offset", "sort"]
        );
    }

    #[test]
    fn build_query_accepts_gdp_desc_and_bounds() {
        let params = ListParams {
            sort: Some("gdp_desc".to_owned()),
            limit: Some("1000".to_owned()),
            offset: Some("5".to_owned()),
            ..ListParams::default()
        };
        let query = build_query(&params).unwrap();
        assert_eq!(query.sort, SortOrder::GdpDesc);
        assert_eq!(query.limit, 1_000);
        assert_eq!(query.offset, 5);
    }

    #[test]
    fn build_query_rejects_oversized_limit() {
        let params = ListParams {
            limit: Some("1001".to_owned()),
            ..ListParams::default()
        };
        assert!(matches!(build_query(&params), Err(ApiError::Validation(_))));
    }
}
