//! Fallback view for paths outside the four terminal routes.

use leptos::prelude::*;
use leptos_router::components::A;
use leptos_router::hooks::use_location;

#[component]
pub fn NotFoundPage() -> impl IntoView {
    let location = use_location();
    let path = move || location.pathname.get();

    view! {
        <div class="page page--not-found">
            <h2>"Page Not Found"</h2>
            <p>"No view is bound to " <code>{path}</code> "."</p>
            <A href="/">"Back to Dashboard"</A>
        </div>
    }
}
