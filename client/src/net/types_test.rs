use super::*;
use serde_json::json;

#[test]
fn system_status_tolerates_missing_optional_flags() {
    let raw = json!({
        "scheduler_running": true,
        "active_strategies": 2,
        "orders_today": 7,
        "config_set": true,
        "paper_trade": false
    });
    let status: SystemStatus = serde_json::from_value(raw).unwrap();
    assert!(status.scheduler_running);
    assert_eq!(status.active_strategies, 2);
    assert!(!status.trading_enabled);
    assert!(!status.market_open);
}

#[test]
fn order_record_parses_server_shape() {
    let raw = json!({
        "id": 12,
        "strategy_id": null,
        "symbol": "RELIANCE",
        "exchange": "NSE",
        "side": "BUY",
        "quantity": 5,
        "order_type": "MARKET",
        "product": "INTRADAY",
        "price": 2450.5,
        "sl": 2426.0,
        "target": null,
        "status": "PAPER",
        "dhan_order_id": "PAPER_20240102091600",
        "is_paper": true,
        "pnl": null,
        "notes": "EMA Cross BUY",
        "created_at": "2024-01-02T09:16:05Z"
    });
    let order: OrderRecord = serde_json::from_value(raw).unwrap();
    assert_eq!(order.symbol, "RELIANCE");
    assert_eq!(order.strategy_id, None);
    assert!(!order.is_exit);
    assert_eq!(order.dhan_order_id.as_deref(), Some("PAPER_20240102091600"));
}

#[test]
fn new_strategy_omits_absent_security_id() {
    let body = NewStrategy {
        name: "ema_crossover".into(),
        symbol: "TCS".into(),
        exchange: "NSE".into(),
        security_id: None,
        quantity: 1,
        params: json!({}),
    };
    let value = serde_json::to_value(&body).unwrap();
    assert!(value.get("security_id").is_none());
    assert_eq!(value["quantity"], 1);
}

#[test]
fn action_message_status_is_optional() {
    let msg: ActionMessage = serde_json::from_value(json!({ "message": "done" })).unwrap();
    assert_eq!(msg.status, None);
    assert_eq!(msg.message, "done");
}
