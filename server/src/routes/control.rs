//! Operator controls: kill switch, scheduler lifecycle, paper mode, limits.
//!
//! DESIGN
//! ======
//! The kill switch is deliberately broad: it deactivates every strategy,
//! disables trading, and stops the scheduler. Starting the scheduler is the
//! only route that re-enables trading. Scheduler state conflicts
//! (`AlreadyRunning`, `NotRunning`) are reported as successful no-ops with a
//! distinct status string rather than as errors.

use axum::extract::State;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::error::ApiError;
use crate::services::config;
use crate::services::engine::EngineError;
use crate::services::event_log::{self, LogLevel, LogSource};
use crate::services::risk::{self, RiskPatch, RiskSettings};
use crate::services::strategies;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionMessage {
    pub status: &'static str,
    pub message: String,
}

impl ActionMessage {
    fn new(status: &'static str, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub status: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaperToggle {
    pub paper_trade: bool,
    pub mode: &'static str,
    pub message: String,
}

/// `PUT /api/control/risk-settings` body. The trading switch is not
/// writable here; it follows the scheduler and kill-switch routes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RiskLimitsBody {
    pub max_daily_loss_pct: Option<f64>,
    pub max_positions: Option<i32>,
    pub max_capital_per_trade_pct: Option<f64>,
}

impl From<RiskLimitsBody> for RiskPatch {
    fn from(body: RiskLimitsBody) -> Self {
        Self {
            max_daily_loss_pct: body.max_daily_loss_pct,
            max_positions: body.max_positions,
            max_capital_per_trade_pct: body.max_capital_per_trade_pct,
            ..Self::default()
        }
    }
}

/// Describe the effective mode after a paper toggle.
#[must_use]
pub fn paper_toggle(db_paper: bool, env_override: bool) -> PaperToggle {
    let paper_trade = db_paper || env_override;
    let mode = if paper_trade { "PAPER" } else { "LIVE" };
    let message = if env_override && !db_paper {
        "Paper trading is forced by PAPER_TRADING; live mode stays disabled".to_owned()
    } else {
        format!("Switched to {mode} trading mode")
    };
    PaperToggle { paper_trade, mode, message }
}

/// `POST /api/control/kill-switch`
pub async fn kill_switch(State(state): State<AppState>) -> Result<Json<ActionMessage>, ApiError> {
    let deactivated = strategies::deactivate_all(&state.pool).await?;
    risk::set_trading_enabled(&state.pool, false).await?;
    match state.scheduler.stop().await {
        Ok(()) | Err(EngineError::NotRunning) => {}
        Err(e) => return Err(e.into()),
    }

    tracing::warn!(deactivated, "kill switch activated");
    event_log::record(
        &state.pool,
        LogLevel::Warn,
        LogSource::Api,
        "KILL SWITCH ACTIVATED - All strategies deactivated",
        Some(serde_json::json!({ "deactivated": deactivated })),
    )
    .await;

    Ok(Json(ActionMessage::new(
        "killed",
        format!("Kill switch activated. {deactivated} strategies deactivated and scheduler stopped."),
    )))
}

/// `POST /api/control/start-scheduler`
pub async fn start_scheduler(State(state): State<AppState>) -> Result<Json<ActionMessage>, ApiError> {
    if !config::is_configured(&state.pool).await? {
        return Err(ApiError::bad_request("Dhan config not set. Please configure API credentials first."));
    }
    risk::set_trading_enabled(&state.pool, true).await?;

    match state.scheduler.start(state.pool.clone(), state.settings.clone()).await {
        Ok(()) => {
            event_log::record(&state.pool, LogLevel::Info, LogSource::Api, "Strategy scheduler started", None).await;
            Ok(Json(ActionMessage::new("started", "Strategy scheduler started")))
        }
        Err(EngineError::AlreadyRunning) => {
            Ok(Json(ActionMessage::new("already_running", "Strategy scheduler is already running")))
        }
        Err(e) => Err(e.into()),
    }
}

/// `POST /api/control/stop-scheduler`
pub async fn stop_scheduler(State(state): State<AppState>) -> Result<Json<ActionMessage>, ApiError> {
    match state.scheduler.stop().await {
        Ok(()) => {
            event_log::record(&state.pool, LogLevel::Info, LogSource::Api, "Strategy scheduler stopped", None).await;
            Ok(Json(ActionMessage::new("stopped", "Strategy scheduler stopped")))
        }
        Err(EngineError::NotRunning) => Ok(Json(ActionMessage::new("not_running", "Strategy scheduler is not running"))),
        Err(e) => Err(e.into()),
    }
}

/// `GET /api/control/scheduler-status`
pub async fn scheduler_status(State(state): State<AppState>) -> Json<SchedulerStatus> {
    let running = state.scheduler.is_running().await;
    Json(SchedulerStatus { running, status: if running { "running" } else { "stopped" } })
}

/// `POST /api/control/reset-daily-pnl`: start a fresh loss window now.
pub async fn reset_daily_pnl(State(state): State<AppState>) -> Result<Json<ActionMessage>, ApiError> {
    risk::reset_daily_pnl(&state.pool, OffsetDateTime::now_utc()).await?;
    event_log::record(&state.pool, LogLevel::Info, LogSource::Api, "Daily P&L reset", None).await;
    Ok(Json(ActionMessage::new("reset", "Daily P&L counters reset")))
}

/// `POST /api/control/toggle-paper-trade`
pub async fn toggle_paper_trade(State(state): State<AppState>) -> Result<Json<PaperToggle>, ApiError> {
    let settings = risk::toggle_paper(&state.pool).await?;
    let toggle = paper_toggle(settings.paper_trading, state.settings.paper_only);
    tracing::info!(paper = toggle.paper_trade, "paper trading toggled");
    event_log::record(&state.pool, LogLevel::Info, LogSource::Api, &toggle.message, None).await;
    Ok(Json(toggle))
}

/// `GET /api/control/risk-settings`
pub async fn get_risk_settings(State(state): State<AppState>) -> Result<Json<RiskSettings>, ApiError> {
    Ok(Json(risk::get(&state.pool).await?))
}

/// `PUT /api/control/risk-settings`: partial update of the limits.
pub async fn update_risk_settings(
    State(state): State<AppState>,
    Json(body): Json<RiskLimitsBody>,
) -> Result<Json<RiskSettings>, ApiError> {
    Ok(Json(risk::update(&state.pool, &body.into()).await?))
}

#[cfg(test)]
#[path = "control_test.rs"]
mod control_test;
