//! Dashboard page: system status, today's P&L, funds, and recent orders.
//!
//! SYSTEM CONTEXT
//! ==============
//! Landing route (`/`). After hydration it loads everything once and then
//! polls the status endpoint every 10 seconds, writing the snapshot into the
//! shared `TerminalState` so the sidebar badges follow along.

use leptos::prelude::*;

use crate::app::TerminalRoute;
use crate::components::orders_table::OrdersTable;
use crate::components::page_header::PageHeader;
use crate::net::types::{Funds, OrderRecord, PnlSummary};
use crate::state::terminal::TerminalState;
use crate::util::format::{format_inr, format_pct, pnl_class};

#[cfg(feature = "hydrate")]
const STATUS_POLL_SECS: u64 = 10;
#[cfg(feature = "hydrate")]
const RECENT_ORDERS: u32 = 20;

#[component]
pub fn DashboardPage() -> impl IntoView {
    let terminal = expect_context::<RwSignal<TerminalState>>();
    let pnl = RwSignal::new(None::<PnlSummary>);
    let funds = RwSignal::new(None::<Funds>);
    let orders = RwSignal::new(Vec::<OrderRecord>::new());

    #[cfg(feature = "hydrate")]
    {
        use crate::net::api;

        terminal.update(|t| t.loading = true);
        leptos::task::spawn_local(async move {
            refresh_status(terminal).await;
            if let Ok(summary) = api::fetch_pnl().await {
                pnl.set(Some(summary));
            }
            if let Ok(f) = api::fetch_funds().await {
                funds.set(Some(f));
            }
            if let Ok(list) = api::fetch_orders(RECENT_ORDERS, 0).await {
                orders.set(list);
            }
        });

        let poll_alive = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(true));
        let poll_alive_task = poll_alive.clone();
        leptos::task::spawn_local(async move {
            loop {
                gloo_timers::future::sleep(std::time::Duration::from_secs(STATUS_POLL_SECS)).await;
                if !poll_alive_task.load(std::sync::atomic::Ordering::Relaxed) {
                    break;
                }
                refresh_status(terminal).await;
            }
        });
        on_cleanup(move || poll_alive.store(false, std::sync::atomic::Ordering::Relaxed));
    }

    let status_rows = move || {
        let state = terminal.get();
        match state.status {
            Some(s) => view! {
                <dl class="status-grid">
                    <dt>"Scheduler"</dt>
                    <dd>{if s.scheduler_running { "Running" } else { "Stopped" }}</dd>
                    <dt>"Trading"</dt>
                    <dd>{if s.trading_enabled { "Enabled" } else { "Disabled" }}</dd>
                    <dt>"Market"</dt>
                    <dd>{if s.market_open { "Open" } else { "Closed" }}</dd>
                    <dt>"Active strategies"</dt>
                    <dd>{s.active_strategies}</dd>
                    <dt>"Orders today"</dt>
                    <dd>{s.orders_today}</dd>
                    <dt>"Broker config"</dt>
                    <dd>{if s.config_set { "Configured" } else { "Missing" }}</dd>
                </dl>
            }
            .into_any(),
            None => {
                let text = state.last_error.unwrap_or_else(|| "Loading status...".to_owned());
                view! { <p class="muted">{text}</p> }.into_any()
            }
        }
    };

    let pnl_view = move || {
        pnl.get().map(|p| {
            view! {
                <div class="card">
                    <h3>"Today's P&L " <small>{p.date}</small></h3>
                    <p class=pnl_class(p.total_pnl)>{format_inr(p.total_pnl)}</p>
                    <p class="muted">
                        {p.total_trades} " trades · " {p.winning_trades} " won · "
                        {p.losing_trades} " lost · win rate " {format_pct(p.win_rate)}
                    </p>
                </div>
            }
        })
    };

    let funds_view = move || {
        funds.get().map(|f| {
            view! {
                <div class="card">
                    <h3>"Funds"</h3>
                    <p>"Available " {format_inr(f.available_balance)}</p>
                    <p class="muted">"Used margin " {format_inr(f.used_margin)}</p>
                </div>
            }
        })
    };

    view! {
        <div class="page page--dashboard">
            <PageHeader route=TerminalRoute::Dashboard/>
            <section class="card">
                <h3>"System status"</h3>
                {status_rows}
            </section>
            <div class="card-row">
                {pnl_view}
                {funds_view}
            </div>
            <section>
                <h3>"Recent orders"</h3>
                <OrdersTable orders/>
            </section>
        </div>
    }
}

#[cfg(feature = "hydrate")]
async fn refresh_status(terminal: RwSignal<TerminalState>) {
    match crate::net::api::fetch_status().await {
        Ok(status) => terminal.update(|t| t.apply_status(status)),
        Err(e) => terminal.update(|t| t.apply_error(e)),
    }
}
