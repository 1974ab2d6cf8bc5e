//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One Axum router serves three things: the JSON API under `/api`, the
//! Leptos SSR shell for the four terminal views, and the compiled client
//! assets under `/pkg`. Any other path renders the not-found view with a
//! 404 status; unknown `/api` paths get a JSON 404 instead.

pub mod config;
pub mod control;
pub mod dashboard;
pub mod error;
pub mod strategies;

use std::path::PathBuf;

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use leptos::prelude::*;
use leptos_axum::{LeptosRoutes, generate_route_list};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use error::ApiError;

pub const SERVICE_NAME: &str = "dhan-algo-terminal";

/// JSON API, mounted under `/api`.
fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/config",
            get(config::get_config).post(config::save_config).put(config::update_config),
        )
        .route("/config/test-connection", get(config::test_connection))
        .route("/strategies", get(strategies::list).post(strategies::create))
        .route("/strategies/available", get(strategies::available))
        .route(
            "/strategies/{id}",
            get(strategies::get).put(strategies::update).delete(strategies::delete),
        )
        .route("/strategies/{id}/toggle", post(strategies::toggle))
        .route("/dashboard/status", get(dashboard::status))
        .route("/dashboard/positions", get(dashboard::positions))
        .route("/dashboard/orders", get(dashboard::list_orders))
        .route("/dashboard/pnl", get(dashboard::pnl))
        .route("/dashboard/portfolio", get(dashboard::portfolio))
        .route("/dashboard/funds", get(dashboard::funds))
        .route("/dashboard/logs", get(dashboard::logs))
        .route("/control/kill-switch", post(control::kill_switch))
        .route("/control/start-scheduler", post(control::start_scheduler))
        .route("/control/stop-scheduler", post(control::stop_scheduler))
        .route("/control/scheduler-status", get(control::scheduler_status))
        .route("/control/reset-daily-pnl", post(control::reset_daily_pnl))
        .route("/control/toggle-paper-trade", post(control::toggle_paper_trade))
        .route(
            "/control/risk-settings",
            get(control::get_risk_settings).put(control::update_risk_settings),
        )
        .fallback(api_not_found)
}

/// Full application router.
pub fn app(state: AppState, leptos_options: LeptosOptions) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let routes = generate_route_list(client::app::App);
    let pkg_dir = PathBuf::from(leptos_options.site_root.as_ref()).join(leptos_options.site_pkg_dir.as_ref());

    let leptos_router = Router::new()
        .leptos_routes(&leptos_options, routes, {
            let opts = leptos_options.clone();
            move || client::app::shell(opts.clone())
        })
        .fallback(not_found_page)
        .with_state(leptos_options);

    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes())
        .layer(cors)
        .with_state(state)
        .merge(leptos_router)
        .nest_service("/pkg", ServeDir::new(pkg_dir))
        .layer(TraceLayer::new_for_http())
}

/// Load Leptos options from the environment and build the router.
///
/// # Errors
///
/// Returns an error if the Leptos configuration cannot be loaded.
pub fn leptos_app(state: AppState) -> Result<Router, String> {
    let conf = get_configuration(None).map_err(|e| format!("leptos configuration: {e}"))?;
    Ok(app(state, conf.leptos_options))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "service": SERVICE_NAME }))
}

async fn api_not_found() -> ApiError {
    ApiError::not_found("Not Found")
}

/// Render the shell for a path with no server route. The client router
/// shows the not-found view; the status follows the same path table.
async fn not_found_page(State(options): State<LeptosOptions>, req: Request<Body>) -> Response {
    let known = client::app::resolve_route(req.uri().path()).is_some();
    let render = leptos_axum::render_app_to_stream(move || client::app::shell(options.clone()));
    let mut response = render(req).await.into_response();
    if !known {
        *response.status_mut() = StatusCode::NOT_FOUND;
    }
    response
}

#[cfg(test)]
#[path = "routes_test.rs"]
mod routes_test;
