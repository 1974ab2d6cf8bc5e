//! Strategies page: configured strategy table plus a create form.
//!
//! SYSTEM CONTEXT
//! ==============
//! The create form offers only strategy types the server reports through
//! `/api/strategies/available`; toggle and delete act on one row and then
//! reload the list so the table always reflects the database.

use leptos::prelude::*;

use crate::app::TerminalRoute;
use crate::components::notice::{Notice, NoticeLine};
use crate::components::page_header::PageHeader;
use crate::net::types::{AvailableStrategy, NewStrategy, StrategyRecord};

#[component]
pub fn StrategiesPage() -> impl IntoView {
    let strategies = RwSignal::new(Vec::<StrategyRecord>::new());
    let available = RwSignal::new(Vec::<AvailableStrategy>::new());
    let notice = RwSignal::new(None::<Notice>);

    let form_name = RwSignal::new(String::new());
    let form_symbol = RwSignal::new(String::new());
    let form_exchange = RwSignal::new("NSE".to_owned());
    let form_security_id = RwSignal::new(String::new());
    let form_quantity = RwSignal::new("1".to_owned());

    #[cfg(feature = "hydrate")]
    leptos::task::spawn_local(async move {
        if let Ok(list) = crate::net::api::fetch_available_strategies().await {
            if let Some(first) = list.strategies.first() {
                form_name.set(first.name.clone());
            }
            available.set(list.strategies);
        }
        reload(strategies, notice).await;
    });

    let on_create = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let Ok(quantity) = form_quantity.get().trim().parse::<i32>() else {
            notice.set(Some(Notice::Error("Quantity must be a whole number.".to_owned())));
            return;
        };
        let symbol = form_symbol.get().trim().to_uppercase();
        if symbol.is_empty() {
            notice.set(Some(Notice::Error("Symbol is required.".to_owned())));
            return;
        }
        let security_id = form_security_id.get().trim().to_owned();
        let new_strategy = NewStrategy {
            name: form_name.get(),
            symbol,
            exchange: form_exchange.get(),
            security_id: (!security_id.is_empty()).then_some(security_id),
            quantity,
            params: serde_json::json!({}),
        };

        #[cfg(feature = "hydrate")]
        leptos::task::spawn_local(async move {
            let result = crate::net::api::create_strategy(&new_strategy).await;
            notice.set(Some(Notice::from_result(&result, "Strategy created.")));
            if result.is_ok() {
                form_symbol.set(String::new());
                form_security_id.set(String::new());
            }
            reload(strategies, notice).await;
        });
        #[cfg(not(feature = "hydrate"))]
        let _ = new_strategy;
    };

    let on_toggle = move |id: i64| {
        #[cfg(feature = "hydrate")]
        leptos::task::spawn_local(async move {
            let result = crate::net::api::toggle_strategy(id).await;
            let message = result
                .as_ref()
                .map(|t| format!("Strategy {} {}.", t.id, t.status))
                .unwrap_or_default();
            notice.set(Some(Notice::from_result(&result, message)));
            reload(strategies, notice).await;
        });
        #[cfg(not(feature = "hydrate"))]
        let _ = id;
    };

    let on_delete = move |id: i64| {
        #[cfg(feature = "hydrate")]
        leptos::task::spawn_local(async move {
            let result = crate::net::api::delete_strategy(id).await;
            notice.set(Some(Notice::from_result(&result, "Strategy deleted.")));
            reload(strategies, notice).await;
        });
        #[cfg(not(feature = "hydrate"))]
        let _ = id;
    };

    let rows = move || {
        let list = strategies.get();
        if list.is_empty() {
            return view! {
                <tr>
                    <td colspan="6" class="empty">"No strategies configured"</td>
                </tr>
            }
            .into_any();
        }
        list.into_iter()
            .map(|s| {
                let id = s.id;
                view! {
                    <tr>
                        <td>{s.name}</td>
                        <td>{s.symbol}</td>
                        <td>{s.exchange}</td>
                        <td>{s.quantity}</td>
                        <td>{if s.is_active { "Active" } else { "Inactive" }}</td>
                        <td>
                            <button type="button" on:click=move |_| on_toggle(id)>
                                {if s.is_active { "Deactivate" } else { "Activate" }}
                            </button>
                            <button type="button" class="danger" on:click=move |_| on_delete(id)>
                                "Delete"
                            </button>
                        </td>
                    </tr>
                }
            })
            .collect_view()
            .into_any()
    };

    let type_options = move || {
        available
            .get()
            .into_iter()
            .map(|a| {
                let value = a.name.clone();
                let label = a.name;
                let title = a.description;
                view! { <option value=value title=title>{label}</option> }
            })
            .collect_view()
    };

    view! {
        <div class="page page--strategies">
            <PageHeader route=TerminalRoute::Strategies/>
            <table class="strategies-table">
                <thead>
                    <tr>
                        <th>"Type"</th>
                        <th>"Symbol"</th>
                        <th>"Exch"</th>
                        <th>"Qty"</th>
                        <th>"State"</th>
                        <th></th>
                    </tr>
                </thead>
                <tbody>{rows}</tbody>
            </table>

            <h3>"New strategy"</h3>
            <form class="form" on:submit=on_create>
                <label>
                    "Type"
                    <select
                        prop:value=move || form_name.get()
                        on:change=move |ev| form_name.set(event_target_value(&ev))
                    >
                        {type_options}
                    </select>
                </label>
                <label>
                    "Symbol"
                    <input
                        type="text"
                        prop:value=move || form_symbol.get()
                        on:input=move |ev| form_symbol.set(event_target_value(&ev))
                    />
                </label>
                <label>
                    "Exchange"
                    <select
                        prop:value=move || form_exchange.get()
                        on:change=move |ev| form_exchange.set(event_target_value(&ev))
                    >
                        <option value="NSE">"NSE"</option>
                        <option value="BSE">"BSE"</option>
                    </select>
                </label>
                <label>
                    "Security ID"
                    <input
                        type="text"
                        prop:value=move || form_security_id.get()
                        on:input=move |ev| form_security_id.set(event_target_value(&ev))
                    />
                </label>
                <label>
                    "Quantity"
                    <input
                        type="number"
                        min="1"
                        prop:value=move || form_quantity.get()
                        on:input=move |ev| form_quantity.set(event_target_value(&ev))
                    />
                </label>
                <div class="form__actions">
                    <button type="submit">"Create"</button>
                </div>
            </form>
            <NoticeLine notice/>
        </div>
    }
}

#[cfg(feature = "hydrate")]
async fn reload(strategies: RwSignal<Vec<StrategyRecord>>, notice: RwSignal<Option<Notice>>) {
    match crate::net::api::fetch_strategies().await {
        Ok(list) => strategies.set(list),
        Err(e) => notice.set(Some(Notice::Error(e))),
    }
}
