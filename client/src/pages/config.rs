//! Config page: Dhan credentials form and connection test.

use leptos::prelude::*;

use crate::app::TerminalRoute;
use crate::components::notice::{Notice, NoticeLine};
use crate::components::page_header::PageHeader;
use crate::net::types::ConfigView;

#[component]
pub fn ConfigPage() -> impl IntoView {
    let current = RwSignal::new(None::<ConfigView>);
    let client_id = RwSignal::new(String::new());
    let access_token = RwSignal::new(String::new());
    let busy = RwSignal::new(false);
    let notice = RwSignal::new(None::<Notice>);

    #[cfg(feature = "hydrate")]
    leptos::task::spawn_local(async move {
        match crate::net::api::fetch_config().await {
            Ok(cfg) => {
                client_id.set(cfg.client_id.clone());
                current.set(Some(cfg));
            }
            Err(e) => notice.set(Some(Notice::Info(e))),
        }
    });

    let on_save = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if busy.get() {
            return;
        }
        let id_value = client_id.get().trim().to_owned();
        let token_value = access_token.get().trim().to_owned();
        if id_value.is_empty() || token_value.is_empty() {
            notice.set(Some(Notice::Error("Client ID and access token are both required.".to_owned())));
            return;
        }
        busy.set(true);

        #[cfg(feature = "hydrate")]
        leptos::task::spawn_local(async move {
            let result = crate::net::api::save_config(&id_value, &token_value).await;
            notice.set(Some(Notice::from_result(&result, "Credentials saved.")));
            if let Ok(cfg) = result {
                current.set(Some(cfg));
                access_token.set(String::new());
            }
            busy.set(false);
        });
    };

    let on_test = move |_| {
        if busy.get() {
            return;
        }
        busy.set(true);
        notice.set(Some(Notice::Info("Testing connection...".to_owned())));

        #[cfg(feature = "hydrate")]
        leptos::task::spawn_local(async move {
            let result = crate::net::api::test_connection().await;
            let message = result.as_ref().map(|m| m.message.clone()).unwrap_or_default();
            notice.set(Some(Notice::from_result(&result, message)));
            busy.set(false);
        });
    };

    let saved_summary = move || {
        current.get().map(|cfg| {
            view! {
                <p class="muted">
                    "Saved client " {cfg.client_id} " · token " {cfg.access_token}
                </p>
            }
        })
    };

    view! {
        <div class="page page--config">
            <PageHeader route=TerminalRoute::Config/>
            {saved_summary}
            <form class="form" on:submit=on_save>
                <label>
                    "Client ID"
                    <input
                        type="text"
                        prop:value=move || client_id.get()
                        on:input=move |ev| client_id.set(event_target_value(&ev))
                    />
                </label>
                <label>
                    "Access token"
                    <input
                        type="password"
                        autocomplete="off"
                        prop:value=move || access_token.get()
                        on:input=move |ev| access_token.set(event_target_value(&ev))
                    />
                </label>
                <div class="form__actions">
                    <button type="submit" disabled=move || busy.get()>"Save"</button>
                    <button type="button" disabled=move || busy.get() on:click=on_test>
                        "Test connection"
                    </button>
                </div>
            </form>
            <NoticeLine notice/>
        </div>
    }
}
