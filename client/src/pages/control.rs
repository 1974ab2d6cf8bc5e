//! Control page: kill switch, scheduler, paper/live mode, and risk limits.

#[cfg(test)]
#[path = "control_test.rs"]
mod control_test;

use leptos::prelude::*;

use crate::app::TerminalRoute;
use crate::components::notice::{Notice, NoticeLine};
use crate::components::page_header::PageHeader;
use crate::net::types::RiskSettingsView;

/// Control actions exposed as buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ControlAction {
    KillSwitch,
    StartScheduler,
    StopScheduler,
    ResetDailyPnl,
    TogglePaperTrade,
}

impl ControlAction {
    fn label(self) -> &'static str {
        match self {
            Self::KillSwitch => "Kill switch",
            Self::StartScheduler => "Start scheduler",
            Self::StopScheduler => "Stop scheduler",
            Self::ResetDailyPnl => "Reset daily P&L",
            Self::TogglePaperTrade => "Toggle paper / live",
        }
    }

    fn class(self) -> &'static str {
        match self {
            Self::KillSwitch => "danger kill-switch",
            _ => "",
        }
    }
}

#[component]
pub fn ControlPage() -> impl IntoView {
    let risk = RwSignal::new(None::<RiskSettingsView>);
    let max_loss = RwSignal::new(String::new());
    let max_positions = RwSignal::new(String::new());
    let busy = RwSignal::new(false);
    let notice = RwSignal::new(None::<Notice>);

    #[cfg(feature = "hydrate")]
    leptos::task::spawn_local(async move {
        if let Ok(settings) = crate::net::api::fetch_risk_settings().await {
            max_loss.set(settings.max_daily_loss_pct.to_string());
            max_positions.set(settings.max_positions.to_string());
            risk.set(Some(settings));
        }
    });

    let run_action = move |action: ControlAction| {
        if busy.get() {
            return;
        }
        #[cfg(feature = "hydrate")]
        {
            use crate::net::api;

            if action == ControlAction::KillSwitch {
                let confirmed = web_sys::window()
                    .and_then(|w| w.confirm_with_message("Stop all strategies and halt trading?").ok())
                    .unwrap_or(false);
                if !confirmed {
                    return;
                }
            }
            busy.set(true);
            leptos::task::spawn_local(async move {
                let outcome = match action {
                    ControlAction::KillSwitch => api::kill_switch().await.map(|m| m.message),
                    ControlAction::StartScheduler => api::start_scheduler().await.map(|m| m.message),
                    ControlAction::StopScheduler => api::stop_scheduler().await.map(|m| m.message),
                    ControlAction::ResetDailyPnl => api::reset_daily_pnl().await.map(|m| m.message),
                    ControlAction::TogglePaperTrade => api::toggle_paper_trade().await.map(|t| t.message),
                };
                notice.set(Some(match outcome {
                    Ok(message) => Notice::Info(message),
                    Err(e) => Notice::Error(e),
                }));
                if let Ok(settings) = api::fetch_risk_settings().await {
                    risk.set(Some(settings));
                }
                busy.set(false);
            });
        }
        #[cfg(not(feature = "hydrate"))]
        let _ = action;
    };

    let on_save_risk = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let loss = parse_optional::<f64>(&max_loss.get());
        let positions = parse_optional::<i32>(&max_positions.get());
        let (Ok(loss), Ok(positions)) = (loss, positions) else {
            notice.set(Some(Notice::Error("Risk limits must be numbers.".to_owned())));
            return;
        };

        #[cfg(feature = "hydrate")]
        leptos::task::spawn_local(async move {
            let result = crate::net::api::update_risk_settings(loss, positions).await;
            notice.set(Some(Notice::from_result(&result, "Risk settings updated.")));
            if let Ok(settings) = result {
                risk.set(Some(settings));
            }
        });
        #[cfg(not(feature = "hydrate"))]
        let _ = (loss, positions);
    };

    let buttons = [
        ControlAction::KillSwitch,
        ControlAction::StartScheduler,
        ControlAction::StopScheduler,
        ControlAction::ResetDailyPnl,
        ControlAction::TogglePaperTrade,
    ]
    .into_iter()
    .map(|action| {
        view! {
            <button
                type="button"
                class=action.class()
                disabled=move || busy.get()
                on:click=move |_| run_action(action)
            >
                {action.label()}
            </button>
        }
    })
    .collect_view();

    let risk_summary = move || {
        risk.get().map(|r| {
            view! {
                <p class="muted">
                    {if r.trading_enabled { "Trading enabled" } else { "Trading disabled" }} " · "
                    {if r.paper_trading { "paper mode" } else { "live mode" }} " · max capital per trade "
                    {r.max_capital_per_trade_pct} "%"
                </p>
            }
        })
    };

    view! {
        <div class="page page--control">
            <PageHeader route=TerminalRoute::Control/>
            <div class="control-buttons">{buttons}</div>
            {risk_summary}
            <h3>"Risk settings"</h3>
            <form class="form" on:submit=on_save_risk>
                <label>
                    "Max daily loss %"
                    <input
                        type="number"
                        step="0.1"
                        prop:value=move || max_loss.get()
                        on:input=move |ev| max_loss.set(event_target_value(&ev))
                    />
                </label>
                <label>
                    "Max open positions"
                    <input
                        type="number"
                        min="1"
                        prop:value=move || max_positions.get()
                        on:input=move |ev| max_positions.set(event_target_value(&ev))
                    />
                </label>
                <div class="form__actions">
                    <button type="submit">"Save limits"</button>
                </div>
            </form>
            <NoticeLine notice/>
        </div>
    }
}

/// Empty input means "leave unchanged".
fn parse_optional<T: std::str::FromStr>(raw: &str) -> Result<Option<T>, T::Err> {
    let trimmed = raw.trim();
    if trimmed.is_empty() { Ok(None) } else { trimmed.parse::<T>().map(Some) }
}
