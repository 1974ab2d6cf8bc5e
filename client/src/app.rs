//! Root application component with routing and context providers.
//!
//! ROUTING
//! =======
//! Four literal paths map one-to-one onto terminal views. Matching is exact
//! (a single trailing slash is tolerated); every other path falls through to
//! the not-found view. The sidebar sits outside `<Routes>` so it renders on
//! every path, including unknown ones.

#[cfg(test)]
#[path = "app_test.rs"]
mod app_test;

use leptos::prelude::*;
use leptos_meta::{MetaTags, Stylesheet, Title, provide_meta_context};
use leptos_router::hooks::use_location;
use leptos_router::{
    StaticSegment,
    components::{Route, Router, Routes},
};

use crate::components::sidebar::Sidebar;
use crate::pages::{
    config::ConfigPage, control::ControlPage, dashboard::DashboardPage, not_found::NotFoundPage,
    strategies::StrategiesPage,
};
use crate::state::terminal::TerminalState;

/// Product name shown in the sidebar and the document title.
pub const APP_TITLE: &str = "Dhan Algo Terminal";

/// The four routed terminal views.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TerminalRoute {
    Dashboard,
    Config,
    Strategies,
    Control,
}

/// Sidebar navigation order.
pub const NAV_LINKS: [TerminalRoute; 4] = [
    TerminalRoute::Dashboard,
    TerminalRoute::Config,
    TerminalRoute::Strategies,
    TerminalRoute::Control,
];

impl TerminalRoute {
    /// Literal URL path bound to this view.
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Dashboard => "/",
            Self::Config => "/config",
            Self::Strategies => "/strategies",
            Self::Control => "/control",
        }
    }

    /// Sidebar link text.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Config => "Config",
            Self::Strategies => "Strategies",
            Self::Control => "Controls",
        }
    }

    /// Page heading rendered at the top of the view.
    #[must_use]
    pub fn heading(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Config => "Configuration",
            Self::Strategies => "Strategies",
            Self::Control => "Controls",
        }
    }

    /// One-line description rendered under the heading.
    #[must_use]
    pub fn tagline(self) -> &'static str {
        match self {
            Self::Dashboard => "System Status & Live P&L",
            Self::Config => "Dhan API Settings",
            Self::Strategies => "Manage Trading Strategies",
            Self::Control => "Kill Switch & Risk Settings",
        }
    }
}

/// Resolve a URL path to its view. Exact match only; `None` means not found.
#[must_use]
pub fn resolve_route(path: &str) -> Option<TerminalRoute> {
    let trimmed = match path.strip_suffix('/') {
        Some(rest) if !rest.is_empty() && !rest.ends_with('/') => rest,
        _ => path,
    };
    NAV_LINKS.into_iter().find(|route| route.path() == trimmed)
}

/// Document title for a path: `"<view> · Dhan Algo Terminal"`.
#[must_use]
pub fn document_title(path: &str) -> String {
    let section = resolve_route(path).map_or("Not Found", TerminalRoute::heading);
    format!("{section} · {APP_TITLE}")
}

/// HTML shell rendered on the server for SSR + hydration.
pub fn shell(options: LeptosOptions) -> impl IntoView {
    view! {
        <!DOCTYPE html>
        <html lang="en">
            <head>
                <meta charset="utf-8"/>
                <meta name="viewport" content="width=device-width, initial-scale=1"/>
                <AutoReload options=options.clone()/>
                <HydrationScripts options/>
                <MetaTags/>
            </head>
            <body>
                <App/>
            </body>
        </html>
    }
}

/// Root application component.
///
/// Provides the shared terminal state and sets up client-side routing.
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    let terminal = RwSignal::new(TerminalState::default());
    provide_context(terminal);

    view! {
        <Stylesheet id="leptos" href="/pkg/dhan-terminal.css"/>

        <Router>
            <RouteTitle/>
            <div class="app">
                <Sidebar/>
                <main class="content">
                    <Routes fallback=|| view! { <NotFoundPage/> }>
                        <Route path=StaticSegment("") view=DashboardPage/>
                        <Route path=StaticSegment("config") view=ConfigPage/>
                        <Route path=StaticSegment("strategies") view=StrategiesPage/>
                        <Route path=StaticSegment("control") view=ControlPage/>
                    </Routes>
                </main>
            </div>
        </Router>
    }
}

/// Keeps the document title in sync with the current location.
#[component]
fn RouteTitle() -> impl IntoView {
    let location = use_location();
    let title = move || document_title(&location.pathname.get());
    view! { <Title text=title/> }
}
