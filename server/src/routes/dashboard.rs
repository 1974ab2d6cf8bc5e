//! Dashboard read routes: status, P&L, orders, broker views, event log.
//!
//! DESIGN
//! ======
//! Broker-backed views (positions, holdings, funds) short-circuit in paper
//! mode and never touch Dhan. "Today" for P&L is the exchange-local day,
//! narrowed by a manual P&L reset; "orders today" ignores the reset.

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod dashboard_test;

use axum::extract::{Query, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use super::error::ApiError;
use crate::services::config::{self, ConfigError};
use crate::services::dhan::{self, Broker};
use crate::services::engine;
use crate::services::event_log::{self, EventRow};
use crate::services::orders::{self, OrderRow, PnlTotals};
use crate::services::risk;
use crate::services::strategies;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemStatus {
    pub scheduler_running: bool,
    pub active_strategies: i64,
    pub orders_today: i64,
    pub config_set: bool,
    pub paper_trade: bool,
    pub trading_enabled: bool,
    pub market_open: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PnlResponse {
    #[serde(flatten)]
    pub totals: PnlTotals,
    pub paper_trade: bool,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundsResponse {
    pub available_balance: f64,
    pub used_margin: f64,
    pub paper_trade: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub funds: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrdersQuery {
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogsQuery {
    pub limit: Option<i64>,
}

/// `GET /api/dashboard/status`
pub async fn status(State(state): State<AppState>) -> Result<Json<SystemStatus>, ApiError> {
    let now = OffsetDateTime::now_utc();
    let risk = risk::get(&state.pool).await?;
    let since = risk::day_start(now, state.settings.market.utc_offset);

    Ok(Json(SystemStatus {
        scheduler_running: state.scheduler.is_running().await,
        active_strategies: strategies::count_active(&state.pool).await?,
        orders_today: orders::count_filled_since(&state.pool, since).await?,
        config_set: config::is_configured(&state.pool).await?,
        paper_trade: state.effective_paper(risk.paper_trading),
        trading_enabled: risk.trading_enabled,
        market_open: engine::is_market_open(now, &state.settings.market),
    }))
}

/// `GET /api/dashboard/pnl`: realized P&L for the current window.
pub async fn pnl(State(state): State<AppState>) -> Result<Json<PnlResponse>, ApiError> {
    let now = OffsetDateTime::now_utc();
    let risk = risk::get(&state.pool).await?;
    let offset = state.settings.market.utc_offset;
    let since = risk::window_start(now, offset, risk.pnl_reset_at);
    let results = orders::realized_results_since(&state.pool, since).await?;

    Ok(Json(PnlResponse {
        totals: orders::summarize_pnl(&results),
        paper_trade: state.effective_paper(risk.paper_trading),
        date: now.to_offset(offset).date().to_string(),
    }))
}

/// `GET /api/dashboard/orders?limit&skip`: newest first.
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<Vec<OrderRow>>, ApiError> {
    Ok(Json(orders::list(&state.pool, query.limit, query.skip).await?))
}

/// `GET /api/dashboard/positions`
pub async fn positions(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    if !config::is_configured(&state.pool).await? {
        return Ok(Json(serde_json::json!({ "positions": [], "message": "No config found" })));
    }
    if paper_mode(&state).await? {
        return Ok(Json(serde_json::json!({
            "positions": [],
            "paper_trade": true,
            "message": "Paper trade mode active",
        })));
    }
    let client = dhan::connect(&state.pool, &state.settings.dhan).await?;
    let positions = client.positions().await?;
    Ok(Json(serde_json::json!({ "positions": positions, "paper_trade": false })))
}

/// `GET /api/dashboard/portfolio`: broker holdings.
pub async fn portfolio(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    if paper_mode(&state).await? || !config::is_configured(&state.pool).await? {
        return Ok(Json(serde_json::json!({ "holdings": [], "paper_trade": true })));
    }
    let client = dhan::connect(&state.pool, &state.settings.dhan).await?;
    let holdings = client.holdings().await?;
    Ok(Json(serde_json::json!({ "holdings": holdings, "paper_trade": false })))
}

/// `GET /api/dashboard/funds`: paper capital, or broker fund limits.
pub async fn funds(State(state): State<AppState>) -> Result<Json<FundsResponse>, ApiError> {
    if !config::is_configured(&state.pool).await? {
        return Err(ConfigError::NotFound.into());
    }
    if paper_mode(&state).await? {
        return Ok(Json(FundsResponse {
            available_balance: state.settings.paper_capital,
            used_margin: 0.0,
            paper_trade: true,
            funds: None,
        }));
    }
    let client = dhan::connect(&state.pool, &state.settings.dhan).await?;
    let raw = client.fund_limits().await?;
    let summary = dhan::parse_funds(&raw);
    Ok(Json(FundsResponse {
        available_balance: summary.available_balance,
        used_margin: summary.used_margin,
        paper_trade: false,
        funds: Some(raw),
    }))
}

/// `GET /api/dashboard/logs?limit`
pub async fn logs(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<Vec<EventRow>>, ApiError> {
    Ok(Json(event_log::recent(&state.pool, query.limit).await?))
}

async fn paper_mode(state: &AppState) -> Result<bool, ApiError> {
    let risk = risk::get(&state.pool).await?;
    Ok(state.effective_paper(risk.paper_trading))
}
