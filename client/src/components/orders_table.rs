//! Recent orders table for the dashboard.

use leptos::prelude::*;

use crate::net::types::OrderRecord;
use crate::util::format::{format_price, pnl_class};

/// Table of orders, newest first. Shows a placeholder row when empty.
#[component]
pub fn OrdersTable(orders: RwSignal<Vec<OrderRecord>>) -> impl IntoView {
    let rows = move || {
        let list = orders.get();
        if list.is_empty() {
            return view! {
                <tr>
                    <td colspan="8" class="empty">"No orders yet"</td>
                </tr>
            }
            .into_any();
        }
        list.into_iter()
            .map(|order| {
                let pnl = order.pnl.unwrap_or(0.0);
                let mode = if order.is_paper { "paper" } else { "live" };
                view! {
                    <tr>
                        <td>{order.created_at}</td>
                        <td>{order.symbol}</td>
                        <td>{order.exchange}</td>
                        <td>{order.side}</td>
                        <td>{order.quantity}</td>
                        <td>{format_price(order.price)}</td>
                        <td>{order.status} " (" {mode} ")"</td>
                        <td class=pnl_class(pnl)>{format_price(order.pnl)}</td>
                    </tr>
                }
            })
            .collect_view()
            .into_any()
    };

    view! {
        <table class="orders-table">
            <thead>
                <tr>
                    <th>"Time"</th>
                    <th>"Symbol"</th>
                    <th>"Exch"</th>
                    <th>"Side"</th>
                    <th>"Qty"</th>
                    <th>"Price"</th>
                    <th>"Status"</th>
                    <th>"P&L"</th>
                </tr>
            </thead>
            <tbody>{rows}</tbody>
        </table>
    }
}
