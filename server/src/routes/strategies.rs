//! Strategy CRUD routes.

#[cfg(test)]
#[path = "strategies_test.rs"]
mod strategies_test;

use axum::extract::{Path, State};
use axum::response::Json;
use serde::Serialize;

use super::error::ApiError;
use crate::services::strategies::{self, NewStrategy, StrategyPatch, StrategyRow};
use crate::strategy::registry::{self, AvailableStrategy};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AvailableResponse {
    pub strategies: Vec<AvailableStrategy>,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct ToggleResponse {
    pub id: i64,
    pub is_active: bool,
    pub status: &'static str,
}

impl ToggleResponse {
    fn new(id: i64, is_active: bool) -> Self {
        Self { id, is_active, status: if is_active { "activated" } else { "deactivated" } }
    }
}

/// `GET /api/strategies`
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<StrategyRow>>, ApiError> {
    Ok(Json(strategies::list(&state.pool).await?))
}

/// `GET /api/strategies/available`: strategy types the engine can run.
pub async fn available() -> Json<AvailableResponse> {
    Json(AvailableResponse { strategies: registry::available() })
}

/// `POST /api/strategies`
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<NewStrategy>,
) -> Result<Json<StrategyRow>, ApiError> {
    Ok(Json(strategies::create(&state.pool, body).await?))
}

/// `GET /api/strategies/{id}`
pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<StrategyRow>, ApiError> {
    Ok(Json(strategies::get(&state.pool, id).await?))
}

/// `PUT /api/strategies/{id}`
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<StrategyPatch>,
) -> Result<Json<StrategyRow>, ApiError> {
    Ok(Json(strategies::update(&state.pool, id, body).await?))
}

/// `DELETE /api/strategies/{id}`
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<serde_json::Value>, ApiError> {
    strategies::delete(&state.pool, id).await?;
    Ok(Json(serde_json::json!({ "status": "deleted", "message": "Strategy deleted" })))
}

/// `POST /api/strategies/{id}/toggle`
pub async fn toggle(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<ToggleResponse>, ApiError> {
    let is_active = strategies::toggle(&state.pool, id).await?;
    Ok(Json(ToggleResponse::new(id, is_active)))
}
