//! Strategy configuration CRUD.
//!
//! A row names a registry strategy and binds it to one symbol. Params are
//! validated by actually building the strategy, so a row that saves is a
//! row the scheduler can run.

#[cfg(test)]
#[path = "strategies_test.rs"]
mod strategies_test;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use sqlx::types::Json;
use time::OffsetDateTime;

use crate::domain::Exchange;
use crate::strategy::{StrategyError, registry};

#[derive(Debug, thiserror::Error)]
pub enum StrategyStoreError {
    #[error("Strategy not found")]
    NotFound,

    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Strategy(#[from] StrategyError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct StrategyRow {
    pub id: i64,
    pub name: String,
    pub symbol: String,
    pub exchange: String,
    pub security_id: Option<String>,
    pub quantity: i32,
    pub is_active: bool,
    pub params: Json<serde_json::Value>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl StrategyRow {
    /// Instrument id sent to the broker; the symbol when none is stored.
    #[must_use]
    pub fn broker_security_id(&self) -> &str {
        self.security_id
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.symbol)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewStrategy {
    pub name: String,
    pub symbol: String,
    #[serde(default = "default_exchange")]
    pub exchange: String,
    #[serde(default)]
    pub security_id: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    #[serde(default)]
    pub params: serde_json::Value,
}

fn default_exchange() -> String {
    Exchange::Nse.as_str().to_owned()
}

fn default_quantity() -> i32 {
    1
}

/// Partial update. An empty `security_id` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StrategyPatch {
    pub symbol: Option<String>,
    pub exchange: Option<String>,
    pub security_id: Option<String>,
    pub quantity: Option<i32>,
    pub is_active: Option<bool>,
    pub params: Option<serde_json::Value>,
}

// =============================================================================
// VALIDATION
// =============================================================================

fn normalize_symbol(raw: &str) -> Result<String, StrategyStoreError> {
    let symbol = raw.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(StrategyStoreError::Invalid("symbol must not be empty".into()));
    }
    Ok(symbol)
}

fn normalize_exchange(raw: &str) -> Result<&'static str, StrategyStoreError> {
    Exchange::parse(raw)
        .map(Exchange::as_str)
        .ok_or_else(|| StrategyStoreError::Invalid(format!("unsupported exchange '{raw}', expected NSE or BSE")))
}

fn check_quantity(quantity: i32) -> Result<i32, StrategyStoreError> {
    if quantity <= 0 {
        return Err(StrategyStoreError::Invalid(format!("quantity must be positive, got {quantity}")));
    }
    Ok(quantity)
}

/// Null params mean "all defaults".
fn normalize_params(params: serde_json::Value) -> serde_json::Value {
    if params.is_null() { serde_json::json!({}) } else { params }
}

/// Check a create body against the registry and field rules.
///
/// # Errors
///
/// `Strategy` for unknown names or bad params; `Invalid` for field errors.
pub fn validate_new(input: &NewStrategy) -> Result<(), StrategyStoreError> {
    registry::build(&input.name, &normalize_params(input.params.clone()))?;
    normalize_symbol(&input.symbol)?;
    normalize_exchange(&input.exchange)?;
    check_quantity(input.quantity)?;
    Ok(())
}

// =============================================================================
// STORAGE
// =============================================================================

const COLUMNS: &str = "id, name, symbol, exchange, security_id, quantity, is_active, params, created_at";

/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list(pool: &PgPool) -> Result<Vec<StrategyRow>, sqlx::Error> {
    sqlx::query_as::<_, StrategyRow>(&format!("SELECT {COLUMNS} FROM strategies ORDER BY id"))
        .fetch_all(pool)
        .await
}

/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_active(pool: &PgPool) -> Result<Vec<StrategyRow>, sqlx::Error> {
    sqlx::query_as::<_, StrategyRow>(&format!("SELECT {COLUMNS} FROM strategies WHERE is_active ORDER BY id"))
        .fetch_all(pool)
        .await
}

/// # Errors
///
/// Returns a database error if the query fails.
pub async fn count_active(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM strategies WHERE is_active")
        .fetch_one(pool)
        .await
}

/// # Errors
///
/// `NotFound` when no row has `id`.
pub async fn get(pool: &PgPool, id: i64) -> Result<StrategyRow, StrategyStoreError> {
    sqlx::query_as::<_, StrategyRow>(&format!("SELECT {COLUMNS} FROM strategies WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(StrategyStoreError::NotFound)
}

/// Validate and insert. New strategies start inactive.
///
/// # Errors
///
/// Validation errors from `validate_new`, or a database error.
pub async fn create(pool: &PgPool, input: NewStrategy) -> Result<StrategyRow, StrategyStoreError> {
    validate_new(&input)?;
    let security_id = input
        .security_id
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty());

    let row = sqlx::query_as::<_, StrategyRow>(&format!(
        "INSERT INTO strategies (name, symbol, exchange, security_id, quantity, params) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING {COLUMNS}"
    ))
    .bind(&input.name)
    .bind(normalize_symbol(&input.symbol)?)
    .bind(normalize_exchange(&input.exchange)?)
    .bind(security_id)
    .bind(input.quantity)
    .bind(Json(normalize_params(input.params)))
    .fetch_one(pool)
    .await?;

    tracing::info!(strategy_id = row.id, name = %row.name, symbol = %row.symbol, "strategy created");
    Ok(row)
}

/// Apply a partial update, re-validating params against the row's type.
///
/// # Errors
///
/// `NotFound`, validation errors, or a database error.
pub async fn update(pool: &PgPool, id: i64, patch: StrategyPatch) -> Result<StrategyRow, StrategyStoreError> {
    let current = get(pool, id).await?;
    let symbol = patch.symbol.as_deref().map(normalize_symbol).transpose()?;
    let exchange = patch.exchange.as_deref().map(normalize_exchange).transpose()?;
    let quantity = patch.quantity.map(check_quantity).transpose()?;
    let params = patch.params.map(normalize_params);
    if let Some(params) = &params {
        registry::build(&current.name, params)?;
    }
    let security_id = patch.security_id.map(|s| s.trim().to_owned());

    let row = sqlx::query_as::<_, StrategyRow>(&format!(
        "UPDATE strategies SET \
            symbol = COALESCE($2, symbol), \
            exchange = COALESCE($3, exchange), \
            security_id = NULLIF(COALESCE($4, security_id), ''), \
            quantity = COALESCE($5, quantity), \
            is_active = COALESCE($6, is_active), \
            params = COALESCE($7, params), \
            updated_at = now() \
         WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(symbol)
    .bind(exchange)
    .bind(security_id)
    .bind(quantity)
    .bind(patch.is_active)
    .bind(params.map(Json))
    .fetch_optional(pool)
    .await?
    .ok_or(StrategyStoreError::NotFound)?;
    Ok(row)
}

/// # Errors
///
/// `NotFound` when no row has `id`.
pub async fn delete(pool: &PgPool, id: i64) -> Result<(), StrategyStoreError> {
    let result = sqlx::query("DELETE FROM strategies WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(StrategyStoreError::NotFound);
    }
    tracing::info!(strategy_id = id, "strategy deleted");
    Ok(())
}

/// Flip `is_active` and return the new state.
///
/// # Errors
///
/// `NotFound` when no row has `id`.
pub async fn toggle(pool: &PgPool, id: i64) -> Result<bool, StrategyStoreError> {
    let active = sqlx::query_scalar::<_, bool>(
        "UPDATE strategies SET is_active = NOT is_active, updated_at = now() WHERE id = $1 RETURNING is_active",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(StrategyStoreError::NotFound)?;
    tracing::info!(strategy_id = id, active, "strategy toggled");
    Ok(active)
}

/// Deactivate every strategy. Returns how many were active.
///
/// # Errors
///
/// Returns a database error if the update fails.
pub async fn deactivate_all(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE strategies SET is_active = FALSE, updated_at = now() WHERE is_active")
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
