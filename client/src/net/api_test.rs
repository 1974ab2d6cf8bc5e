use super::*;

#[test]
fn orders_endpoint_formats_paging() {
    assert_eq!(orders_endpoint(50, 0), "/api/dashboard/orders?limit=50&skip=0");
    assert_eq!(orders_endpoint(10, 30), "/api/dashboard/orders?limit=10&skip=30");
}

#[test]
fn strategy_endpoints_embed_id() {
    assert_eq!(strategy_endpoint(7), "/api/strategies/7");
    assert_eq!(strategy_toggle_endpoint(7), "/api/strategies/7/toggle");
}

#[test]
fn failure_message_prefers_server_detail() {
    assert_eq!(failure_message(404, Some("Config not found")), "Config not found (404)");
    assert_eq!(failure_message(500, None), "request failed: 500");
    assert_eq!(failure_message(502, Some("")), "request failed: 502");
}

#[test]
fn risk_settings_body_skips_unset_fields() {
    assert_eq!(risk_settings_body(None, None), serde_json::json!({}));
    assert_eq!(
        risk_settings_body(Some(1.5), None),
        serde_json::json!({ "max_daily_loss_pct": 1.5 })
    );
    assert_eq!(
        risk_settings_body(Some(3.0), Some(4)),
        serde_json::json!({ "max_daily_loss_pct": 3.0, "max_positions": 4 })
    );
}
