//! HTTP API for players and matches
//!
//! Store calls are synchronous, so handlers hop onto the blocking pool.

use crate::error::LeagueError;
use crate::service::health::{HealthCheck, HealthStatus};
use crate::service::league::LeagueService;
use crate::storage::RatingStore;
use crate::types::{
    Match, MatchSubmission, NewPlayerRequest, Player, PlayerId, PlayerSummary, RatingHistoryEntry,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::error;

/// Shared state for the API handlers
pub struct ApiState<S> {
    pub service_name: String,
    pub league: LeagueService<S>,
}

/// Error response wrapper
#[derive(Debug)]
pub struct ApiError(LeagueError);

impl From<LeagueError> for ApiError {
    fn from(err: LeagueError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            LeagueError::EmptyRoster { .. }
            | LeagueError::DuplicatePlayer { .. }
            | LeagueError::InvalidPlayer { .. } => StatusCode::BAD_REQUEST,
            LeagueError::UnknownPlayer { .. } => StatusCode::NOT_FOUND,
            LeagueError::PersistenceFailure { .. } => {
                error!("Request failed: {}", self.0);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

async fn run_blocking<S, T, F>(state: Arc<ApiState<S>>, work: F) -> ApiResult<T>
where
    S: RatingStore + 'static,
    T: Send + 'static,
    F: FnOnce(&LeagueService<S>) -> crate::error::Result<T> + Send + 'static,
{
    let value = tokio::task::spawn_blocking(move || work(&state.league))
        .await
        .map_err(|e| LeagueError::persistence(format!("Store task failed: {}", e)))??;
    Ok(Json(value))
}

/// Build the API router, open to cross-origin browser clients
pub fn router<S: RatingStore + 'static>(state: Arc<ApiState<S>>) -> Router {
    Router::new()
        .route("/health", get(health_handler::<S>))
        .route(
            "/api/players",
            get(list_players::<S>).post(create_player::<S>),
        )
        .route("/api/players/{id}/history", get(player_history::<S>))
        .route(
            "/api/matches",
            get(list_matches::<S>).post(record_match::<S>),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_handler<S: RatingStore + 'static>(
    State(state): State<Arc<ApiState<S>>>,
) -> Response {
    let health = tokio::task::spawn_blocking(move || {
        HealthCheck::check(&state.service_name, &state.league)
    })
    .await;

    match health {
        Ok(health) => {
            let status = if health.status == HealthStatus::Healthy {
                StatusCode::OK
            } else {
                StatusCode::SERVICE_UNAVAILABLE
            };
            (status, Json(health)).into_response()
        }
        Err(e) => ApiError(LeagueError::persistence(e.to_string())).into_response(),
    }
}

async fn list_players<S: RatingStore + 'static>(
    State(state): State<Arc<ApiState<S>>>,
) -> ApiResult<Vec<PlayerSummary>> {
    run_blocking(state, |league| league.list_players()).await
}

async fn create_player<S: RatingStore + 'static>(
    State(state): State<Arc<ApiState<S>>>,
    Json(request): Json<NewPlayerRequest>,
) -> ApiResult<Player> {
    run_blocking(state, move |league| league.register_player(&request.name)).await
}

async fn player_history<S: RatingStore + 'static>(
    State(state): State<Arc<ApiState<S>>>,
    Path(player_id): Path<PlayerId>,
) -> ApiResult<Vec<RatingHistoryEntry>> {
    run_blocking(state, move |league| league.player_history(player_id)).await
}

async fn list_matches<S: RatingStore + 'static>(
    State(state): State<Arc<ApiState<S>>>,
) -> ApiResult<Vec<Match>> {
    run_blocking(state, |league| league.list_matches()).await
}

async fn record_match<S: RatingStore + 'static>(
    State(state): State<Arc<ApiState<S>>>,
    Json(submission): Json<MatchSubmission>,
) -> ApiResult<Match> {
    run_blocking(state, move |league| league.submit_match(&submission)).await
}
