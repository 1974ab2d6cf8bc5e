//! Broker credential routes.

use axum::extract::State;
use axum::response::Json;
use serde_json::Value;

use super::error::ApiError;
use crate::services::config::{self, ConfigError, ConfigInput, ConfigPatch, ConfigView};
use crate::services::event_log::{self, LogLevel, LogSource};
use crate::state::AppState;

/// `GET /api/config`: stored credentials with the token masked.
pub async fn get_config(State(state): State<AppState>) -> Result<Json<ConfigView>, ApiError> {
    let view = config::get(&state.pool).await?.ok_or(ConfigError::NotFound)?;
    Ok(Json(view))
}

/// `POST /api/config`: create or replace credentials.
pub async fn save_config(
    State(state): State<AppState>,
    Json(body): Json<ConfigInput>,
) -> Result<Json<ConfigView>, ApiError> {
    let view = config::upsert(&state.pool, body).await?;
    event_log::record(&state.pool, LogLevel::Info, LogSource::Api, "Dhan config saved", None).await;
    Ok(Json(view))
}

/// `PUT /api/config`: partial update of an existing config.
pub async fn update_config(
    State(state): State<AppState>,
    Json(body): Json<ConfigPatch>,
) -> Result<Json<ConfigView>, ApiError> {
    Ok(Json(config::update(&state.pool, body).await?))
}

/// `GET /api/config/test-connection`: probe the broker with stored credentials.
pub async fn test_connection(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    match config::test_connection(&state.pool, &state.settings.dhan).await {
        Ok(funds) => Ok(Json(serde_json::json!({
            "status": "connected",
            "message": "Dhan API connection successful",
            "funds": funds,
        }))),
        Err(ConfigError::Dhan(e)) => {
            tracing::warn!(error = %e, "dhan connection test failed");
            Err(ApiError::bad_request(format!("Connection failed: {e}")))
        }
        Err(e) => Err(e.into()),
    }
}
