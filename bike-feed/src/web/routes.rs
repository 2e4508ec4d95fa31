//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::dashboard;
use crate::domain::{Coordinate, InvalidCoordinate};
use crate::feed::{FeedError, FeedOutcome};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/stations", get(stations))
        .route("/api/areas", get(areas))
        .route("/api/nearest", get(nearest))
        .route("/api/summary", get(summary))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// All stations, optionally in one area.
///
/// With both `lat` and `lng`, stations are ordered closest first and carry
/// their distance from that point.
async fn stations(
    State(state): State<AppState>,
    Query(query): Query<StationsQuery>,
) -> Result<Json<StationsResponse>, AppError> {
    let origin = match (query.lat, query.lng) {
        (Some(lat), Some(lng)) => Some(Coordinate::new(lat, lng)?),
        (None, None) => None,
        _ => {
            return Err(AppError::BadRequest {
                message: "lat and lng must be given together".to_string(),
            });
        }
    };

    let outcome = load(&state).await;
    let candidates = dashboard::filter_area(&outcome.records, query.area());
    let stations: Vec<StationView> = match &origin {
        Some(origin) => dashboard::by_distance(candidates, origin)
            .into_iter()
            .map(StationView::from)
            .collect(),
        None => candidates.into_iter().map(StationView::from).collect(),
    };

    Ok(Json(StationsResponse {
        stations,
        fetched_at: outcome.fetched_at,
        origin,
        error: outcome.error_message(),
    }))
}

/// Districts with their station counts.
async fn areas(State(state): State<AppState>) -> Json<AreasResponse> {
    let outcome = load(&state).await;
    Json(AreasResponse {
        areas: dashboard::areas(&outcome.records),
        error: outcome.error_message(),
    })
}

/// The station closest to `lat`/`lng`.
async fn nearest(
    State(state): State<AppState>,
    Query(query): Query<NearestQuery>,
) -> Result<Json<NearestResponse>, AppError> {
    let origin = Coordinate::new(query.lat, query.lng)?;
    let area = AreaQuery { area: query.area };

    let snapshot = state.feed.snapshot().await?;
    let candidates = dashboard::filter_area(&snapshot.records, area.area());
    let found = dashboard::nearest(candidates, &origin).ok_or_else(|| AppError::NotFound {
        message: match area.area() {
            Some(a) => format!("No stations in area {a}"),
            None => "No stations available".to_string(),
        },
    })?;

    Ok(Json(NearestResponse {
        origin,
        station: StationView::from(found),
        fetched_at: snapshot.fetched_at,
    }))
}

/// Headline totals, optionally for one area.
async fn summary(
    State(state): State<AppState>,
    Query(query): Query<AreaQuery>,
) -> Json<SummaryResponse> {
    let outcome = load(&state).await;
    Json(SummaryResponse {
        area: query.area().map(str::to_string),
        summary: dashboard::summary(dashboard::filter_area(&outcome.records, query.area())),
        fetched_at: outcome.fetched_at,
        error: outcome.error_message(),
    })
}

/// The current table, or an empty one with a diagnostic.
async fn load(state: &AppState) -> FeedOutcome {
    let outcome = state.feed.outcome().await;
    if let Some(e) = &outcome.diagnostic {
        warn!(kind = e.kind(), error = %e, "serving degraded response");
    }
    outcome
}

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    BadRequest { message: String },

    #[error("{message}")]
    NotFound { message: String },

    /// The feed could not be read for an endpoint that has no degraded form
    #[error("{0}")]
    Unavailable(FeedError),
}

impl From<InvalidCoordinate> for AppError {
    fn from(e: InvalidCoordinate) -> Self {
        AppError::BadRequest {
            message: e.to_string(),
        }
    }
}

impl From<FeedError> for AppError {
    fn from(e: FeedError) -> Self {
        AppError::Unavailable(e)
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            warn!(%status, %message, "request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
