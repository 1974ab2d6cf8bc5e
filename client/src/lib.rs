//! # client
//!
//! Leptos frontend for the Dhan Algo Terminal.
//!
//! The crate renders a fixed sidebar plus one routed view per terminal area
//! (dashboard, config, strategies, control). The server renders it through
//! `ssr`; the browser build hydrates it through `hydrate` and talks to the
//! JSON API under `/api`.

pub mod app;
pub mod components;
pub mod net;
pub mod pages;
pub mod state;
pub mod util;

/// WASM entry point: hydrate the server-rendered markup.
#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
    leptos::mount::hydrate_body(app::App);
}
