//! Heading + tagline block shared by the routed views.

use leptos::prelude::*;

use crate::app::TerminalRoute;

/// Static heading and description for a view.
#[component]
pub fn PageHeader(route: TerminalRoute) -> impl IntoView {
    view! {
        <div class="page-header">
            <h2>{route.heading()}</h2>
            <p>{route.tagline()}</p>
        </div>
    }
}
