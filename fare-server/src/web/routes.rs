//! HTTP route handlers.

use axum::body::Bytes;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{
        HeaderName, Method, StatusCode,
        header::{
            ACCEPT, ACCEPT_ENCODING, AUTHORIZATION, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE,
            ORIGIN,
        },
    },
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::calculator::{CalculateError, FareCalculator, FareLineItem};
use crate::fares::{FareError, FareKey, FareRecord, FareSource};
use crate::stations::{Station, StationError};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router<S: FareSource + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrodata", get(metro_data::<S>))
        .route("/searchstations", get(search_stations::<S>))
        .route("/calculatefare", post(calculate_fare::<S>))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Cross-origin policy: any origin may call every endpoint.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::POST,
            Method::OPTIONS,
            Method::GET,
            Method::PUT,
            Method::DELETE,
        ])
        .allow_headers([
            CONTENT_TYPE,
            CONTENT_LENGTH,
            ACCEPT_ENCODING,
            HeaderName::from_static("x-csrf-token"),
            AUTHORIZATION,
            ACCEPT,
            ORIGIN,
            CACHE_CONTROL,
            HeaderName::from_static("x-requested-with"),
        ])
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Look up the fare between two stations given by name.
async fn metro_data<S: FareSource>(
    State(state): State<AppState<S>>,
    Query(req): Query<MetroDataRequest>,
) -> Result<Json<FareRecord>, AppError> {
    let origin_id = state.stations.resolve_identifier(&req.start_name)?;
    let destination_id = state.stations.resolve_identifier(&req.end_name)?;

    let record = state
        .fares
        .resolve_fare(&FareKey::new(origin_id, destination_id))
        .await?;

    Ok(Json(record))
}

/// Search stations by name substring.
async fn search_stations<S: FareSource>(
    State(state): State<AppState<S>>,
    Query(req): Query<SearchStationsRequest>,
) -> Json<Vec<Station>> {
    Json(state.stations.search(&req.query).cloned().collect())
}

/// Total fare for a batch of trips.
async fn calculate_fare<S: FareSource>(
    State(state): State<AppState<S>>,
    body: Bytes,
) -> Result<Json<CalculateFareResponse>, AppError> {
    // Parse JSON manually so we can log the body on failure
    let items: Vec<FareLineItem> = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, body = %String::from_utf8_lossy(&body), "invalid calculatefare body");
        AppError::BadRequest {
            code: "invalid_request",
            message: format!("Invalid request data: {e}"),
        }
    })?;

    info!(items = items.len(), "processing fare calculation");
    let calculator = FareCalculator::new(&state.stations, &state.fares);
    let total_fare = calculator.calculate_total(&items).await?;
    info!(total_fare, "calculated total fare");

    Ok(Json(CalculateFareResponse { total_fare }))
}

/// Application error type.
///
/// Each variant carries a stable `code` so clients can tell bad input,
/// upstream failures and local storage failures apart.
#[derive(Debug)]
pub enum AppError {
    BadRequest { code: &'static str, message: String },
    BadGateway { code: &'static str, message: String },
    Internal { code: &'static str, message: String },
}

impl AppError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest { code, .. }
            | AppError::BadGateway { code, .. }
            | AppError::Internal { code, .. } => *code,
        }
    }

    fn message(&self) -> &str {
        match self {
            AppError::BadRequest { message, .. }
            | AppError::BadGateway { message, .. }
            | AppError::Internal { message, .. } => message,
        }
    }
}

impl From<StationError> for AppError {
    fn from(e: StationError) -> Self {
        let message = e.to_string();
        match e {
            StationError::NotFound { .. } => AppError::BadRequest {
                code: "station_not_found",
                message,
            },
            StationError::Load { .. } => AppError::Internal {
                code: "station_load",
                message,
            },
        }
    }
}

impl From<FareError> for AppError {
    fn from(e: FareError) -> Self {
        let message = e.to_string();
        match e {
            FareError::Transport(_) => AppError::BadGateway {
                code: "upstream_unreachable",
                message,
            },
            FareError::RemoteStatus { .. } => AppError::BadGateway {
                code: "upstream_status",
                message,
            },
            FareError::UnexpectedContentType { .. } => AppError::BadGateway {
                code: "upstream_content_type",
                message,
            },
            FareError::Decode { .. } => AppError::BadGateway {
                code: "upstream_decode",
                message,
            },
            FareError::CacheRead { .. } => AppError::Internal {
                code: "cache_read",
                message,
            },
            FareError::CacheWrite { .. } => AppError::Internal {
                code: "cache_write",
                message,
            },
        }
    }
}

impl From<CalculateError> for AppError {
    fn from(e: CalculateError) -> Self {
        match e {
            CalculateError::Station(e) => e.into(),
            CalculateError::Fare(e) => e.into(),
            CalculateError::FareParse { .. } => AppError::BadGateway {
                code: "fare_parse",
                message: e.to_string(),
            },
            CalculateError::Overflow { .. } => AppError::Internal {
                code: "fare_overflow",
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(%status, code = self.code(), "{}", self.message());
        } else {
            warn!(%status, code = self.code(), "{}", self.message());
        }

        let body = Json(ErrorResponse {
            error: self.message().to_string(),
            code: self.code().to_string(),
        });
        (status, body).into_response()
    }
}
