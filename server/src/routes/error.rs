//! JSON error responses for `/api`.
//!
//! ERROR HANDLING
//! ==============
//! Every service error converts into `ApiError`, which renders as
//! `{"detail": "..."}` with a status chosen per variant. Database and other
//! internal failures are logged here and reported without internals.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use crate::services::config::ConfigError;
use crate::services::dhan::DhanError;
use crate::services::engine::EngineError;
use crate::services::risk::RiskError;
use crate::services::strategies::StrategyStoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self { status, detail: detail.into() }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, detail)
    }

    fn internal(err: &dyn std::fmt::Display) -> Self {
        tracing::error!(error = %err, "request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "detail": self.detail }))).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        Self::internal(&err)
    }
}

impl From<RiskError> for ApiError {
    fn from(err: RiskError) -> Self {
        match err {
            RiskError::Invalid(msg) => Self::bad_request(msg),
            RiskError::Database(e) => Self::internal(&e),
        }
    }
}

impl From<DhanError> for ApiError {
    fn from(err: DhanError) -> Self {
        match err {
            DhanError::NotConfigured => Self::not_found(ConfigError::NotFound.to_string()),
            DhanError::Request(_) | DhanError::Status { .. } | DhanError::Parse(_) => {
                Self::new(StatusCode::BAD_GATEWAY, err.to_string())
            }
            DhanError::HttpClientBuild(_) | DhanError::Database(_) => Self::internal(&err),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NotFound => Self::not_found(err.to_string()),
            ConfigError::Invalid(msg) => Self::bad_request(msg),
            ConfigError::Risk(e) => e.into(),
            ConfigError::Dhan(e) => e.into(),
            ConfigError::Database(e) => Self::internal(&e),
        }
    }
}

impl From<StrategyStoreError> for ApiError {
    fn from(err: StrategyStoreError) -> Self {
        match err {
            StrategyStoreError::NotFound => Self::not_found(err.to_string()),
            StrategyStoreError::Invalid(msg) => Self::bad_request(msg),
            StrategyStoreError::Strategy(e) => Self::bad_request(e.to_string()),
            StrategyStoreError::Database(e) => Self::internal(&e),
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::AlreadyRunning | EngineError::NotRunning => {
                Self::new(StatusCode::CONFLICT, err.to_string())
            }
            EngineError::InvalidRow(msg) => Self::bad_request(msg),
            EngineError::Strategy(e) => Self::bad_request(e.to_string()),
            EngineError::Dhan(e) => e.into(),
            EngineError::Risk(e) => e.into(),
            EngineError::Database(e) => Self::internal(&e),
        }
    }
}
