use super::*;

fn status(paper_trade: bool, scheduler_running: bool) -> SystemStatus {
    SystemStatus {
        scheduler_running,
        active_strategies: 1,
        orders_today: 0,
        config_set: true,
        paper_trade,
        trading_enabled: true,
        market_open: false,
    }
}

#[test]
fn default_state_has_unknown_labels() {
    let state = TerminalState::default();
    assert_eq!(state.mode_label(), "Mode unknown");
    assert_eq!(state.scheduler_label(), "Scheduler unknown");
    assert!(!state.is_live());
}

#[test]
fn apply_status_clears_error_and_loading() {
    let mut state = TerminalState { loading: true, last_error: Some("boom".into()), ..Default::default() };
    state.apply_status(status(true, true));
    assert!(!state.loading);
    assert!(state.last_error.is_none());
    assert_eq!(state.mode_label(), "Paper Trading");
    assert_eq!(state.scheduler_label(), "Scheduler running");
}

#[test]
fn apply_error_keeps_previous_snapshot() {
    let mut state = TerminalState::default();
    state.apply_status(status(false, false));
    state.apply_error("offline".into());
    assert_eq!(state.last_error.as_deref(), Some("offline"));
    assert_eq!(state.mode_label(), "Live Trading");
    assert!(state.is_live());
}
