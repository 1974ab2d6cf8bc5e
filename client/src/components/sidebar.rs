//! Sidebar with the product title, navigation links, and mode badges.
//!
//! SYSTEM CONTEXT
//! ==============
//! Mounted outside `<Routes>`, so it renders on every path. The badges read
//! the shared `TerminalState` that the dashboard keeps fresh.

use leptos::prelude::*;
use leptos_router::components::A;

use crate::app::{APP_TITLE, NAV_LINKS};
use crate::state::terminal::TerminalState;

/// Navigation sidebar listing all four terminal views.
#[component]
pub fn Sidebar() -> impl IntoView {
    let terminal = expect_context::<RwSignal<TerminalState>>();

    let mode = move || terminal.get().mode_label();
    let scheduler = move || terminal.get().scheduler_label();
    let mode_class = move || if terminal.get().is_live() { "badge badge--live" } else { "badge" };

    view! {
        <nav class="sidebar">
            <h1>{APP_TITLE}</h1>
            {NAV_LINKS
                .into_iter()
                .map(|route| view! { <A href=route.path()>{route.label()}</A> })
                .collect_view()}
            <div class="sidebar__badges">
                <span class=mode_class>{mode}</span>
                <span class="badge">{scheduler}</span>
            </div>
        </nav>
    }
}
