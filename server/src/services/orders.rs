//! Order journal and P&L.
//!
//! DESIGN
//! ======
//! Every order the engine attempts is journaled, paper or live, filled or
//! rejected. Entries stay open (`closed = false`) until an exit for the same
//! strategy and symbol fills; the exit row then carries the realized P&L of
//! the round trip. P&L figures therefore come only from exit rows.

#[cfg(test)]
#[path = "orders_test.rs"]
mod orders_test;

use serde::Serialize;
use sqlx::PgPool;
use time::OffsetDateTime;

use crate::domain::{OrderStatus, Side};

pub const DEFAULT_LIST_LIMIT: i64 = 50;
pub const MAX_LIST_LIMIT: i64 = 500;

static FILLED: [&str; 2] = OrderStatus::FILLED;

/// Entries that occupy a position slot: filled, or still working at the broker.
static POSITION_HOLDING: [&str; 3] = ["PENDING", "EXECUTED", "PAPER"];

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct OrderRow {
    pub id: i64,
    pub strategy_id: Option<i64>,
    pub symbol: String,
    pub exchange: String,
    pub side: String,
    pub quantity: i32,
    pub order_type: String,
    pub product: String,
    pub price: Option<f64>,
    pub sl: Option<f64>,
    pub target: Option<f64>,
    pub status: String,
    pub dhan_order_id: Option<String>,
    pub is_paper: bool,
    pub is_exit: bool,
    pub pnl: Option<f64>,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Values for a journal insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub strategy_id: Option<i64>,
    pub symbol: String,
    pub exchange: String,
    pub side: Side,
    pub quantity: i32,
    pub order_type: String,
    pub product: String,
    pub price: Option<f64>,
    pub sl: Option<f64>,
    pub target: Option<f64>,
    pub status: OrderStatus,
    pub dhan_order_id: Option<String>,
    pub is_paper: bool,
    pub is_exit: bool,
    pub notes: Option<String>,
}

/// The entry an exit closes.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct OpenEntry {
    pub id: i64,
    pub side: String,
    pub price: Option<f64>,
    pub quantity: i32,
}

/// Totals over a set of realized trade results.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PnlTotals {
    pub total_pnl: f64,
    pub total_trades: i64,
    pub winning_trades: i64,
    pub losing_trades: i64,
    pub win_rate: f64,
}

/// Clamp list paging to sane bounds.
#[must_use]
pub fn page_bounds(limit: Option<i64>, skip: Option<i64>) -> (i64, i64) {
    let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
    let skip = skip.unwrap_or(0).max(0);
    (limit, skip)
}

/// Aggregate realized results. Break-even trades count as neither win nor loss.
#[must_use]
pub fn summarize_pnl(results: &[f64]) -> PnlTotals {
    let total: f64 = results.iter().sum();
    let wins = results.iter().filter(|p| **p > 0.0).count();
    let losses = results.iter().filter(|p| **p < 0.0).count();
    #[allow(clippy::cast_precision_loss)]
    let win_rate = if results.is_empty() { 0.0 } else { wins as f64 / results.len() as f64 * 100.0 };
    PnlTotals {
        total_pnl: round2(total),
        total_trades: i64::try_from(results.len()).unwrap_or(i64::MAX),
        winning_trades: i64::try_from(wins).unwrap_or(i64::MAX),
        losing_trades: i64::try_from(losses).unwrap_or(i64::MAX),
        win_rate: round2(win_rate),
    }
}

#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// =============================================================================
// STORAGE
// =============================================================================

const COLUMNS: &str = "id, strategy_id, symbol, exchange, side, quantity, order_type, product, price, sl, target, \
     status, dhan_order_id, is_paper, is_exit, pnl, notes, created_at";

/// # Errors
///
/// Returns a database error if the insert fails.
pub async fn insert(pool: &PgPool, order: &NewOrder) -> Result<OrderRow, sqlx::Error> {
    sqlx::query_as::<_, OrderRow>(&format!(
        "INSERT INTO orders (strategy_id, symbol, exchange, side, quantity, order_type, product, price, sl, \
             target, status, dhan_order_id, is_paper, is_exit, notes) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) RETURNING {COLUMNS}"
    ))
    .bind(order.strategy_id)
    .bind(&order.symbol)
    .bind(&order.exchange)
    .bind(order.side.as_str())
    .bind(order.quantity)
    .bind(&order.order_type)
    .bind(&order.product)
    .bind(order.price)
    .bind(order.sl)
    .bind(order.target)
    .bind(order.status.as_str())
    .bind(&order.dhan_order_id)
    .bind(order.is_paper)
    .bind(order.is_exit)
    .bind(&order.notes)
    .fetch_one(pool)
    .await
}

/// Newest first.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list(pool: &PgPool, limit: Option<i64>, skip: Option<i64>) -> Result<Vec<OrderRow>, sqlx::Error> {
    let (limit, skip) = page_bounds(limit, skip);
    sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {COLUMNS} FROM orders ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(skip)
    .fetch_all(pool)
    .await
}

/// Filled orders (real or paper) since `since`.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn count_filled_since(pool: &PgPool, since: OffsetDateTime) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE created_at >= $1 AND status = ANY($2)")
        .bind(since)
        .bind(&FILLED[..])
        .fetch_one(pool)
        .await
}

/// Entries opened since `since` that no exit has closed yet.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn count_open_positions(pool: &PgPool, since: OffsetDateTime) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM orders \
         WHERE created_at >= $1 AND NOT is_exit AND NOT closed AND status = ANY($2)",
    )
    .bind(since)
    .bind(&POSITION_HOLDING[..])
    .fetch_one(pool)
    .await
}

/// Realized results of round trips closed since `since`.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn realized_results_since(pool: &PgPool, since: OffsetDateTime) -> Result<Vec<f64>, sqlx::Error> {
    sqlx::query_scalar::<_, f64>(
        "SELECT pnl FROM orders WHERE created_at >= $1 AND is_exit AND pnl IS NOT NULL ORDER BY id",
    )
    .bind(since)
    .fetch_all(pool)
    .await
}

/// # Errors
///
/// Returns a database error if the query fails.
pub async fn realized_pnl_since(pool: &PgPool, since: OffsetDateTime) -> Result<f64, sqlx::Error> {
    Ok(realized_results_since(pool, since).await?.iter().sum())
}

/// Newest open filled entry for `(strategy, symbol)`, left untouched.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn find_open_entry(
    pool: &PgPool,
    strategy_id: Option<i64>,
    symbol: &str,
) -> Result<Option<OpenEntry>, sqlx::Error> {
    sqlx::query_as::<_, OpenEntry>(
        "SELECT id, side, price, quantity FROM orders \
         WHERE strategy_id IS NOT DISTINCT FROM $1 AND symbol = $2 \
           AND NOT is_exit AND NOT closed AND status = ANY($3) \
         ORDER BY created_at DESC, id DESC LIMIT 1",
    )
    .bind(strategy_id)
    .bind(symbol)
    .bind(&FILLED[..])
    .fetch_optional(pool)
    .await
}

/// Mark an entry closed. Returns `false` when it was already closed.
///
/// # Errors
///
/// Returns a database error if the update fails.
pub async fn close_entry(pool: &PgPool, entry_id: i64) -> Result<bool, sqlx::Error> {
    let done = sqlx::query("UPDATE orders SET closed = TRUE WHERE id = $1 AND NOT is_exit AND NOT closed")
        .bind(entry_id)
        .execute(pool)
        .await?;
    Ok(done.rows_affected() == 1)
}

/// Whether an order row has been closed by a settled exit.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn is_closed(pool: &PgPool, order_id: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT closed FROM orders WHERE id = $1")
        .bind(order_id)
        .fetch_one(pool)
        .await
}

/// # Errors
///
/// Returns a database error if the update fails.
pub async fn set_pnl(pool: &PgPool, order_id: i64, pnl: f64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE orders SET pnl = $2, closed = TRUE WHERE id = $1")
        .bind(order_id)
        .bind(pnl)
        .execute(pool)
        .await?;
    Ok(())
}
