//! API route handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::{Arc, Mutex};

use crate::cache::{CacheKey, StandingsCache};
use crate::standings::{compute_standings, Standings, StandingsError, StandingsFilter};
use crate::storage::StandingsRepository;
use crate::types::{
    ErrorResponse, HealthResponse, RevalidateResponse, StandingsQuery, StandingsResponse,
};

/// Application state shared across handlers.
pub struct AppState {
    pub repo: Mutex<StandingsRepository>,
    pub cache: StandingsCache,
}

impl AppState {
    /// Cached standings for a filter; blocking
    pub fn standings(&self, filter: &StandingsFilter) -> Result<Standings, StandingsError> {
        self.cache
            .get_or_compute(&CacheKey::for_filter(filter), || {
                let repo = self
                    .repo
                    .lock()
                    .map_err(|_| anyhow::anyhow!("repository lock poisoned"))?;
                compute_standings(&*repo, filter)
            })
    }
}

/// Error type for API handlers.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
        }
    }
}

impl From<StandingsError> for ApiError {
    fn from(err: StandingsError) -> Self {
        match err {
            StandingsError::NoData | StandingsError::NoSeasonData { .. } => {
                ApiError::not_found(err.to_string())
            }
            StandingsError::Storage(e) => {
                tracing::error!("Standings storage failure: {:#}", e);
                ApiError::internal("Failed to read standings data")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.status.to_string(),
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Standings endpoint.
pub async fn standings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StandingsQuery>,
) -> Result<Json<StandingsResponse>, ApiError> {
    let filter = query.into_filter().map_err(ApiError::bad_request)?;

    let worker_state = state.clone();
    let worker_filter = filter.clone();
    let standings = tokio::task::spawn_blocking(move || worker_state.standings(&worker_filter))
        .await
        .map_err(|e| ApiError::internal(format!("Standings task failed: {}", e)))??;

    Ok(Json(StandingsResponse::new(&filter, standings)))
}

/// Cache invalidation endpoint.
pub async fn revalidate(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RevalidateResponse>, ApiError> {
    let removed = state
        .cache
        .invalidate()
        .map_err(|e| ApiError::internal(format!("Failed to invalidate cache: {}", e)))?;
    tracing::info!(removed, "Standings cache invalidated");

    Ok(Json(RevalidateResponse {
        invalidated: true,
        removed,
    }))
}
