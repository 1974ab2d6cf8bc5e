//! Risk manager: global switches, limits, and the pre-trade gate.
//!
//! DESIGN
//! ======
//! `risk_settings` is a single seeded row. The gate itself (`evaluate`) is a
//! pure function over the settings, a snapshot of today's book, and one
//! intent, so every rule is testable without a database. Checks run in a
//! fixed order and the first failing one names the reason:
//!
//! 1. trading disabled
//! 2. exits pass unconditionally
//! 3. open position count
//! 4. realized daily loss
//! 5. per-trade capital cap (quantity is reduced, never below 1)
//!
//! "Today" is the exchange-local calendar day, cut short by the last manual
//! P&L reset if that happened later.

#[cfg(test)]
#[path = "risk_test.rs"]
mod risk_test;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use time::{OffsetDateTime, Time, UtcOffset};

use crate::domain::Side;
use crate::strategy::TradeIntent;

#[derive(Debug, thiserror::Error)]
pub enum RiskError {
    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

// =============================================================================
// SETTINGS ROW
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct RiskSettings {
    pub trading_enabled: bool,
    pub paper_trading: bool,
    pub max_daily_loss_pct: f64,
    pub max_positions: i32,
    pub max_capital_per_trade_pct: f64,
    #[serde(with = "time::serde::rfc3339::option")]
    pub pnl_reset_at: Option<OffsetDateTime>,
}

impl Default for RiskSettings {
    fn default() -> Self {
        Self {
            trading_enabled: false,
            paper_trading: true,
            max_daily_loss_pct: 2.0,
            max_positions: 3,
            max_capital_per_trade_pct: 10.0,
            pnl_reset_at: None,
        }
    }
}

/// Partial update. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RiskPatch {
    pub trading_enabled: Option<bool>,
    pub paper_trading: Option<bool>,
    pub max_daily_loss_pct: Option<f64>,
    pub max_positions: Option<i32>,
    pub max_capital_per_trade_pct: Option<f64>,
}

impl RiskPatch {
    /// Reject limits that would make the gate meaningless.
    ///
    /// # Errors
    ///
    /// `RiskError::Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<(), RiskError> {
        if let Some(pct) = self.max_daily_loss_pct {
            if !(pct > 0.0 && pct <= 100.0) {
                return Err(RiskError::Invalid(format!("max_daily_loss_pct must be in (0, 100], got {pct}")));
            }
        }
        if let Some(n) = self.max_positions {
            if n < 1 {
                return Err(RiskError::Invalid(format!("max_positions must be at least 1, got {n}")));
            }
        }
        if let Some(pct) = self.max_capital_per_trade_pct {
            if !(pct > 0.0 && pct <= 100.0) {
                return Err(RiskError::Invalid(format!(
                    "max_capital_per_trade_pct must be in (0, 100], got {pct}"
                )));
            }
        }
        Ok(())
    }
}

const SELECT_SETTINGS: &str = "SELECT trading_enabled, paper_trading, max_daily_loss_pct, max_positions, \
     max_capital_per_trade_pct, pnl_reset_at FROM risk_settings WHERE id = 1";

const RETURNING_SETTINGS: &str = "RETURNING trading_enabled, paper_trading, max_daily_loss_pct, max_positions, \
     max_capital_per_trade_pct, pnl_reset_at";

/// Read the settings row, seeding it if a fresh database lacks it.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn get(pool: &PgPool) -> Result<RiskSettings, RiskError> {
    if let Some(row) = sqlx::query_as::<_, RiskSettings>(SELECT_SETTINGS)
        .fetch_optional(pool)
        .await?
    {
        return Ok(row);
    }
    sqlx::query("INSERT INTO risk_settings (id) VALUES (1) ON CONFLICT (id) DO NOTHING")
        .execute(pool)
        .await?;
    Ok(sqlx::query_as::<_, RiskSettings>(SELECT_SETTINGS)
        .fetch_one(pool)
        .await?)
}

/// Apply a validated partial update.
///
/// # Errors
///
/// `Invalid` for out-of-range limits, or a database error.
pub async fn update(pool: &PgPool, patch: &RiskPatch) -> Result<RiskSettings, RiskError> {
    patch.validate()?;
    get(pool).await?;
    let sql = format!(
        "UPDATE risk_settings SET \
            trading_enabled = COALESCE($1, trading_enabled), \
            paper_trading = COALESCE($2, paper_trading), \
            max_daily_loss_pct = COALESCE($3, max_daily_loss_pct), \
            max_positions = COALESCE($4, max_positions), \
            max_capital_per_trade_pct = COALESCE($5, max_capital_per_trade_pct), \
            updated_at = now() \
         WHERE id = 1 {RETURNING_SETTINGS}"
    );
    Ok(sqlx::query_as::<_, RiskSettings>(&sql)
        .bind(patch.trading_enabled)
        .bind(patch.paper_trading)
        .bind(patch.max_daily_loss_pct)
        .bind(patch.max_positions)
        .bind(patch.max_capital_per_trade_pct)
        .fetch_one(pool)
        .await?)
}

/// Flip the global trading switch.
///
/// # Errors
///
/// Returns a database error if the update fails.
pub async fn set_trading_enabled(pool: &PgPool, enabled: bool) -> Result<RiskSettings, RiskError> {
    update(pool, &RiskPatch { trading_enabled: Some(enabled), ..RiskPatch::default() }).await
}

/// Swap paper and live mode.
///
/// # Errors
///
/// Returns a database error if the update fails.
pub async fn toggle_paper(pool: &PgPool) -> Result<RiskSettings, RiskError> {
    get(pool).await?;
    let sql = format!(
        "UPDATE risk_settings SET paper_trading = NOT paper_trading, updated_at = now() \
         WHERE id = 1 {RETURNING_SETTINGS}"
    );
    Ok(sqlx::query_as::<_, RiskSettings>(&sql).fetch_one(pool).await?)
}

/// Start a fresh daily P&L window at `now`.
///
/// # Errors
///
/// Returns a database error if the update fails.
pub async fn reset_daily_pnl(pool: &PgPool, now: OffsetDateTime) -> Result<RiskSettings, RiskError> {
    get(pool).await?;
    let sql = format!(
        "UPDATE risk_settings SET pnl_reset_at = $1, updated_at = now() WHERE id = 1 {RETURNING_SETTINGS}"
    );
    Ok(sqlx::query_as::<_, RiskSettings>(&sql)
        .bind(now)
        .fetch_one(pool)
        .await?)
}

// =============================================================================
// GATE
// =============================================================================

/// Today's book as seen by the gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskSnapshot {
    pub open_positions: i64,
    pub realized_pnl_today: f64,
    pub capital: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RiskDecision {
    /// Place the order with this (possibly reduced) quantity.
    Allow { quantity: i32 },
    Block(String),
}

#[must_use]
pub fn evaluate(settings: &RiskSettings, snapshot: &RiskSnapshot, intent: &TradeIntent) -> RiskDecision {
    if !settings.trading_enabled {
        return RiskDecision::Block("Trading is disabled globally".to_owned());
    }
    if intent.is_exit {
        return RiskDecision::Allow { quantity: intent.quantity.max(1) };
    }
    if snapshot.open_positions >= i64::from(settings.max_positions) {
        return RiskDecision::Block(format!("Max positions ({}) reached", settings.max_positions));
    }
    if let Some(loss_pct) = daily_loss_pct(snapshot) {
        if loss_pct >= settings.max_daily_loss_pct {
            return RiskDecision::Block(format!("Daily loss limit reached ({loss_pct:.2}%)"));
        }
    }
    RiskDecision::Allow {
        quantity: cap_quantity(intent.quantity, intent.price, snapshot.capital, settings.max_capital_per_trade_pct),
    }
}

/// Realized loss as a percentage of capital; `None` when flat or up.
fn daily_loss_pct(snapshot: &RiskSnapshot) -> Option<f64> {
    (snapshot.capital > 0.0 && snapshot.realized_pnl_today < 0.0)
        .then(|| snapshot.realized_pnl_today.abs() / snapshot.capital * 100.0)
}

/// Reduce `quantity` so notional stays within `max_pct` of capital.
#[must_use]
pub fn cap_quantity(quantity: i32, price: f64, capital: f64, max_pct: f64) -> i32 {
    let quantity = quantity.max(1);
    if !(price > 0.0 && capital > 0.0 && max_pct > 0.0) {
        return quantity;
    }
    let max_notional = capital * max_pct / 100.0;
    let affordable = to_quantity(max_notional / price);
    quantity.min(affordable.max(1))
}

/// Quantity that risks `risk_pct` of capital over a stop `sl_distance` away.
#[must_use]
pub fn position_size(capital: f64, risk_pct: f64, sl_distance: f64, price: f64) -> i32 {
    if !(capital > 0.0 && risk_pct > 0.0 && sl_distance > 0.0 && price > 0.0) {
        return 1;
    }
    to_quantity(capital * risk_pct / 100.0 / sl_distance).max(1)
}

#[allow(clippy::cast_possible_truncation)]
fn to_quantity(raw: f64) -> i32 {
    raw.floor().clamp(0.0, f64::from(i32::MAX)) as i32
}

/// Profit of closing `quantity` opened on `entry_side` at `entry_price`.
#[must_use]
pub fn realized_pnl(entry_side: Side, entry_price: f64, exit_price: f64, quantity: i32) -> f64 {
    let qty = f64::from(quantity);
    match entry_side {
        Side::Buy => (exit_price - entry_price) * qty,
        Side::Sell => (entry_price - exit_price) * qty,
    }
}

// =============================================================================
// DAY WINDOW
// =============================================================================

/// Midnight of `now`'s calendar day in the exchange time zone.
#[must_use]
pub fn day_start(now: OffsetDateTime, offset: UtcOffset) -> OffsetDateTime {
    now.to_offset(offset).replace_time(Time::MIDNIGHT)
}

/// Start of the P&L window: local midnight, or a later manual reset.
#[must_use]
pub fn window_start(now: OffsetDateTime, offset: UtcOffset, reset_at: Option<OffsetDateTime>) -> OffsetDateTime {
    let midnight = day_start(now, offset);
    match reset_at {
        Some(reset) if reset > midnight => reset,
        _ => midnight,
    }
}
