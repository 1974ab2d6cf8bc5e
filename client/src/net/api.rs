//! REST API helpers for communicating with the server.
//!
//! Client-side (hydrate): real HTTP calls via `gloo-net`.
//! Server-side (SSR): every call returns an error since these endpoints are
//! only meaningful in the browser.
//!
//! ERROR HANDLING
//! ==============
//! Failures come back as `Err(String)` carrying the server's `detail` when
//! present, so pages can show the message inline without panicking.

#![allow(clippy::unused_async)]

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use serde::de::DeserializeOwned;

use super::types::{
    ActionMessage, AvailableStrategies, ConfigView, Funds, NewStrategy, OrderRecord, PaperToggle, PnlSummary,
    RiskSettingsView, SchedulerStatus, StrategyRecord, StrategyToggle, SystemStatus,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Method {
    Get,
    Post,
    Put,
    Delete,
}

fn orders_endpoint(limit: u32, skip: u32) -> String {
    format!("/api/dashboard/orders?limit={limit}&skip={skip}")
}

fn strategy_endpoint(id: i64) -> String {
    format!("/api/strategies/{id}")
}

fn strategy_toggle_endpoint(id: i64) -> String {
    format!("/api/strategies/{id}/toggle")
}

fn failure_message(status: u16, detail: Option<&str>) -> String {
    match detail {
        Some(detail) if !detail.is_empty() => format!("{detail} ({status})"),
        _ => format!("request failed: {status}"),
    }
}

fn risk_settings_body(max_daily_loss_pct: Option<f64>, max_positions: Option<i32>) -> serde_json::Value {
    let mut body = serde_json::Map::new();
    if let Some(pct) = max_daily_loss_pct {
        body.insert("max_daily_loss_pct".to_owned(), serde_json::json!(pct));
    }
    if let Some(n) = max_positions {
        body.insert("max_positions".to_owned(), serde_json::json!(n));
    }
    serde_json::Value::Object(body)
}

async fn request<T: DeserializeOwned>(method: Method, path: &str, body: Option<serde_json::Value>) -> Result<T, String> {
    #[cfg(feature = "hydrate")]
    {
        use gloo_net::http::Request;

        let builder = match method {
            Method::Get => Request::get(path),
            Method::Post => Request::post(path),
            Method::Put => Request::put(path),
            Method::Delete => Request::delete(path),
        };
        let resp = match body {
            Some(json) => builder.json(&json).map_err(|e| e.to_string())?.send().await,
            None => builder.send().await,
        }
        .map_err(|e| e.to_string())?;

        if !resp.ok() {
            let detail = resp
                .json::<super::types::ErrorBody>()
                .await
                .ok()
                .map(|b| b.detail);
            return Err(failure_message(resp.status(), detail.as_deref()));
        }
        resp.json::<T>().await.map_err(|e| e.to_string())
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = (method, path, body);
        Err("not available on server".to_owned())
    }
}

/// Fetch `/api/dashboard/status`.
pub async fn fetch_status() -> Result<SystemStatus, String> {
    request(Method::Get, "/api/dashboard/status", None).await
}

/// Fetch today's P&L summary.
pub async fn fetch_pnl() -> Result<PnlSummary, String> {
    request(Method::Get, "/api/dashboard/pnl", None).await
}

/// Fetch available funds (paper capital in paper mode).
pub async fn fetch_funds() -> Result<Funds, String> {
    request(Method::Get, "/api/dashboard/funds", None).await
}

/// Fetch order history, newest first.
pub async fn fetch_orders(limit: u32, skip: u32) -> Result<Vec<OrderRecord>, String> {
    request(Method::Get, &orders_endpoint(limit, skip), None).await
}

/// Fetch the stored broker configuration.
pub async fn fetch_config() -> Result<ConfigView, String> {
    request(Method::Get, "/api/config", None).await
}

/// Create or replace broker credentials.
pub async fn save_config(client_id: &str, access_token: &str) -> Result<ConfigView, String> {
    let body = serde_json::json!({ "client_id": client_id, "access_token": access_token });
    request(Method::Post, "/api/config", Some(body)).await
}

/// Probe the broker with the stored credentials.
pub async fn test_connection() -> Result<ActionMessage, String> {
    request(Method::Get, "/api/config/test-connection", None).await
}

/// List configured strategies.
pub async fn fetch_strategies() -> Result<Vec<StrategyRecord>, String> {
    request(Method::Get, "/api/strategies", None).await
}

/// List strategy types the server can run.
pub async fn fetch_available_strategies() -> Result<AvailableStrategies, String> {
    request(Method::Get, "/api/strategies/available", None).await
}

/// Create a strategy.
pub async fn create_strategy(new_strategy: &NewStrategy) -> Result<StrategyRecord, String> {
    let body = serde_json::to_value(new_strategy).map_err(|e| e.to_string())?;
    request(Method::Post, "/api/strategies", Some(body)).await
}

/// Flip a strategy between active and inactive.
pub async fn toggle_strategy(id: i64) -> Result<StrategyToggle, String> {
    request(Method::Post, &strategy_toggle_endpoint(id), None).await
}

/// Delete a strategy.
pub async fn delete_strategy(id: i64) -> Result<ActionMessage, String> {
    request(Method::Delete, &strategy_endpoint(id), None).await
}

/// Emergency stop: deactivate all strategies and halt the scheduler.
pub async fn kill_switch() -> Result<ActionMessage, String> {
    request(Method::Post, "/api/control/kill-switch", None).await
}

pub async fn start_scheduler() -> Result<ActionMessage, String> {
    request(Method::Post, "/api/control/start-scheduler", None).await
}

pub async fn stop_scheduler() -> Result<ActionMessage, String> {
    request(Method::Post, "/api/control/stop-scheduler", None).await
}

pub async fn fetch_scheduler_status() -> Result<SchedulerStatus, String> {
    request(Method::Get, "/api/control/scheduler-status", None).await
}

pub async fn reset_daily_pnl() -> Result<ActionMessage, String> {
    request(Method::Post, "/api/control/reset-daily-pnl", None).await
}

pub async fn toggle_paper_trade() -> Result<PaperToggle, String> {
    request(Method::Post, "/api/control/toggle-paper-trade", None).await
}

pub async fn fetch_risk_settings() -> Result<RiskSettingsView, String> {
    request(Method::Get, "/api/control/risk-settings", None).await
}

/// Update risk limits. `None` fields are left unchanged.
pub async fn update_risk_settings(
    max_daily_loss_pct: Option<f64>,
    max_positions: Option<i32>,
) -> Result<RiskSettingsView, String> {
    let body = risk_settings_body(max_daily_loss_pct, max_positions);
    request(Method::Put, "/api/control/risk-settings", Some(body)).await
}
