use super::*;

#[test]
fn paper_toggle_reports_live_when_unforced() {
    let toggle = paper_toggle(false, false);
    assert!(!toggle.paper_trade);
    assert_eq!(toggle.mode, "LIVE");
    assert_eq!(toggle.message, "Switched to LIVE trading mode");

    let toggle = paper_toggle(true, false);
    assert_eq!(toggle.mode, "PAPER");
}

#[test]
fn env_override_keeps_paper_mode() {
    let toggle = paper_toggle(false, true);
    assert!(toggle.paper_trade);
    assert_eq!(toggle.mode, "PAPER");
    assert!(toggle.message.contains("PAPER_TRADING"));
}

#[test]
fn risk_limits_body_never_touches_switches() {
    let body: RiskLimitsBody =
        serde_json::from_value(serde_json::json!({ "max_positions": 5, "trading_enabled": true })).unwrap();
    let patch = RiskPatch::from(body);
    assert_eq!(patch.max_positions, Some(5));
    assert_eq!(patch.trading_enabled, None);
    assert_eq!(patch.paper_trading, None);
}

#[tokio::test]
async fn scheduler_status_reports_idle() {
    let state = crate::state::test_helpers::test_app_state();
    let Json(status) = scheduler_status(State(state)).await;
    assert_eq!(status, SchedulerStatus { running: false, status: "stopped" });
}

#[tokio::test]
async fn stop_when_idle_is_a_no_op() {
    let state = crate::state::test_helpers::test_app_state();
    let Json(reply) = stop_scheduler(State(state)).await.unwrap();
    assert_eq!(reply.status, "not_running");
}
