//! Broker credential storage and the combined config view.
//!
//! SYSTEM CONTEXT
//! ==============
//! The config screen edits two things at once: Dhan credentials (stored in
//! `dhan_config`) and the headline risk limits (stored in `risk_settings`).
//! This service presents them as one document. The access token is only ever
//! returned masked.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;

use super::dhan::{Broker, DhanClient, DhanCredentials, DhanError};
use super::risk::{self, RiskError, RiskPatch, RiskSettings};
use crate::config::DhanSettings;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config not found. Please create config first.")]
    NotFound,

    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Risk(#[from] RiskError),

    #[error(transparent)]
    Dhan(#[from] DhanError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// `GET /api/config` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigView {
    pub client_id: String,
    pub access_token: String,
    pub paper_trade: bool,
    pub max_daily_loss_pct: f64,
    pub max_positions: i32,
}

impl ConfigView {
    #[must_use]
    pub fn new(credentials: &DhanCredentials, risk: &RiskSettings) -> Self {
        Self {
            client_id: credentials.client_id.clone(),
            access_token: mask_token(&credentials.access_token),
            paper_trade: risk.paper_trading,
            max_daily_loss_pct: risk.max_daily_loss_pct,
            max_positions: risk.max_positions,
        }
    }
}

/// Create-or-replace body.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigInput {
    pub client_id: String,
    pub access_token: String,
    pub paper_trade: Option<bool>,
    pub max_daily_loss_pct: Option<f64>,
    pub max_positions: Option<i32>,
}

/// Partial update body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigPatch {
    pub client_id: Option<String>,
    pub access_token: Option<String>,
    pub paper_trade: Option<bool>,
    pub max_daily_loss_pct: Option<f64>,
    pub max_positions: Option<i32>,
}

impl ConfigPatch {
    fn risk_patch(&self) -> RiskPatch {
        RiskPatch {
            paper_trading: self.paper_trade,
            max_daily_loss_pct: self.max_daily_loss_pct,
            max_positions: self.max_positions,
            ..RiskPatch::default()
        }
    }
}

impl From<ConfigInput> for ConfigPatch {
    fn from(input: ConfigInput) -> Self {
        Self {
            client_id: Some(input.client_id),
            access_token: Some(input.access_token),
            paper_trade: input.paper_trade,
            max_daily_loss_pct: input.max_daily_loss_pct,
            max_positions: input.max_positions,
        }
    }
}

/// Keep only the last four characters visible.
#[must_use]
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 4 {
        return "****".to_owned();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}

fn require_non_blank(field: &str, value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_owned())
}

// =============================================================================
// STORAGE
// =============================================================================

/// Stored credentials, if any.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn credentials(pool: &PgPool) -> Result<Option<DhanCredentials>, sqlx::Error> {
    let row = sqlx::query_as::<_, (String, String)>("SELECT client_id, access_token FROM dhan_config WHERE id = 1")
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|(client_id, access_token)| DhanCredentials { client_id, access_token }))
}

/// Whether usable credentials are stored.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn is_configured(pool: &PgPool) -> Result<bool, sqlx::Error> {
    Ok(credentials(pool).await?.is_some_and(|c| c.is_complete()))
}

/// Combined view, `None` when no credentials are stored.
///
/// # Errors
///
/// Returns a database error if either query fails.
pub async fn get(pool: &PgPool) -> Result<Option<ConfigView>, ConfigError> {
    let Some(creds) = credentials(pool).await? else {
        return Ok(None);
    };
    let risk = risk::get(pool).await?;
    Ok(Some(ConfigView::new(&creds, &risk)))
}

/// Create or replace credentials; optional risk fields are applied too.
///
/// # Errors
///
/// `Invalid` for blank credentials or out-of-range limits.
pub async fn upsert(pool: &PgPool, input: ConfigInput) -> Result<ConfigView, ConfigError> {
    let client_id = require_non_blank("client_id", &input.client_id)?;
    let access_token = require_non_blank("access_token", &input.access_token)?;
    let patch = ConfigPatch::from(input);
    let risk_patch = patch.risk_patch();
    risk_patch.validate().map_err(|e| ConfigError::Invalid(e.to_string()))?;

    sqlx::query(
        "INSERT INTO dhan_config (id, client_id, access_token) VALUES (1, $1, $2) \
         ON CONFLICT (id) DO UPDATE SET client_id = EXCLUDED.client_id, \
         access_token = EXCLUDED.access_token, updated_at = now()",
    )
    .bind(&client_id)
    .bind(&access_token)
    .execute(pool)
    .await?;

    let risk = risk::update(pool, &risk_patch).await?;
    tracing::info!(client_id = %client_id, "dhan credentials saved");
    Ok(ConfigView::new(&DhanCredentials { client_id, access_token }, &risk))
}

/// Update whichever fields are present.
///
/// # Errors
///
/// `NotFound` when no credentials exist yet.
pub async fn update(pool: &PgPool, patch: ConfigPatch) -> Result<ConfigView, ConfigError> {
    let Some(current) = credentials(pool).await? else {
        return Err(ConfigError::NotFound);
    };
    let client_id = match &patch.client_id {
        Some(v) => require_non_blank("client_id", v)?,
        None => current.client_id,
    };
    let access_token = match &patch.access_token {
        Some(v) => require_non_blank("access_token", v)?,
        None => current.access_token,
    };
    let risk_patch = patch.risk_patch();
    risk_patch.validate().map_err(|e| ConfigError::Invalid(e.to_string()))?;

    sqlx::query("UPDATE dhan_config SET client_id = $1, access_token = $2, updated_at = now() WHERE id = 1")
        .bind(&client_id)
        .bind(&access_token)
        .execute(pool)
        .await?;

    let risk = risk::update(pool, &risk_patch).await?;
    Ok(ConfigView::new(&DhanCredentials { client_id, access_token }, &risk))
}

/// Probe the broker with the stored credentials.
///
/// # Errors
///
/// `NotFound` without credentials; `Dhan` when the broker rejects them or
/// cannot be reached.
pub async fn test_connection(pool: &PgPool, settings: &DhanSettings) -> Result<Value, ConfigError> {
    let creds = credentials(pool).await?.ok_or(ConfigError::NotFound)?;
    let client = DhanClient::new(settings, creds)?;
    probe(&client).await
}

/// Fund limits are the cheapest authenticated call.
///
/// # Errors
///
/// Propagates the broker error.
pub async fn probe(broker: &dyn Broker) -> Result<Value, ConfigError> {
    Ok(broker.fund_limits().await?)
}
