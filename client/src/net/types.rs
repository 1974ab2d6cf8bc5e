//! JSON DTOs for the client/server boundary.
//!
//! DESIGN
//! ======
//! These types mirror the server's `/api` response bodies field for field.
//! Timestamps travel as RFC 3339 strings and are displayed verbatim.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};

/// `GET /api/dashboard/status`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub scheduler_running: bool,
    pub active_strategies: i64,
    pub orders_today: i64,
    pub config_set: bool,
    pub paper_trade: bool,
    #[serde(default)]
    pub trading_enabled: bool,
    #[serde(default)]
    pub market_open: bool,
}

/// `GET /api/dashboard/pnl`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PnlSummary {
    pub total_pnl: f64,
    pub total_trades: i64,
    pub winning_trades: i64,
    pub losing_trades: i64,
    pub win_rate: f64,
    pub paper_trade: bool,
    pub date: String,
}

/// `GET /api/dashboard/funds`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Funds {
    pub available_balance: f64,
    pub used_margin: f64,
    pub paper_trade: bool,
}

/// One row of `GET /api/dashboard/orders`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
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
    #[serde(default)]
    pub is_exit: bool,
    pub pnl: Option<f64>,
    pub notes: Option<String>,
    pub created_at: String,
}

/// A configured strategy (`/api/strategies`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrategyRecord {
    pub id: i64,
    pub name: String,
    pub symbol: String,
    pub exchange: String,
    pub security_id: Option<String>,
    pub quantity: i32,
    pub is_active: bool,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Body for `POST /api/strategies`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewStrategy {
    pub name: String,
    pub symbol: String,
    pub exchange: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_id: Option<String>,
    pub quantity: i32,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// A strategy type the server knows how to run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AvailableStrategy {
    pub name: String,
    pub description: String,
    pub default_params: serde_json::Value,
}

/// `GET /api/strategies/available`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AvailableStrategies {
    pub strategies: Vec<AvailableStrategy>,
}

/// `POST /api/strategies/{id}/toggle`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyToggle {
    pub id: i64,
    pub is_active: bool,
    pub status: String,
}

/// `GET /api/config`. The access token arrives masked.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfigView {
    pub client_id: String,
    pub access_token: String,
    pub paper_trade: bool,
    pub max_daily_loss_pct: f64,
    pub max_positions: i32,
}

/// `PUT /api/control/risk-settings` response and `GET` body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskSettingsView {
    pub trading_enabled: bool,
    pub paper_trading: bool,
    pub max_daily_loss_pct: f64,
    pub max_positions: i32,
    pub max_capital_per_trade_pct: f64,
}

/// `GET /api/control/scheduler-status`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub status: String,
}

/// `POST /api/control/toggle-paper-trade`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperToggle {
    pub paper_trade: bool,
    pub mode: String,
    pub message: String,
}

/// Generic `{status, message}` acknowledgement returned by control actions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionMessage {
    #[serde(default)]
    pub status: Option<String>,
    pub message: String,
}

/// Error body returned by every failing `/api` call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}
