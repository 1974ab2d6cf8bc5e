use super::*;

#[test]
fn page_bounds_apply_defaults_and_caps() {
    assert_eq!(page_bounds(None, None), (50, 0));
    assert_eq!(page_bounds(Some(10), Some(20)), (10, 20));
    assert_eq!(page_bounds(Some(10_000), None), (500, 0));
    assert_eq!(page_bounds(Some(0), Some(-5)), (1, 0));
}

#[test]
fn summary_of_no_trades_is_zero() {
    let totals = summarize_pnl(&[]);
    assert_eq!(totals.total_trades, 0);
    assert!(totals.total_pnl.abs() < f64::EPSILON);
    assert!(totals.win_rate.abs() < f64::EPSILON);
}

#[test]
fn summary_counts_wins_and_losses() {
    let totals = summarize_pnl(&[120.456, -40.0, 0.0, 15.0]);
    assert_eq!(totals.total_trades, 4);
    assert_eq!(totals.winning_trades, 2);
    assert_eq!(totals.losing_trades, 1);
    assert!((totals.total_pnl - 95.46).abs() < 1e-9);
    assert!((totals.win_rate - 50.0).abs() < 1e-9);
}

#[test]
fn win_rate_is_rounded_to_two_places() {
    let totals = summarize_pnl(&[1.0, -1.0, -1.0]);
    assert!((totals.win_rate - 33.33).abs() < 1e-9);
}

#[test]
fn round2_rounds_half_away_from_zero() {
    assert!((round2(1.005_1) - 1.01).abs() < 1e-9);
    assert!((round2(-2.345_6) + 2.35).abs() < 1e-9);
}

#[test]
fn order_row_serializes_timestamp_as_rfc3339() {
    let row = OrderRow {
        id: 9,
        strategy_id: None,
        symbol: "TCS".into(),
        exchange: "NSE".into(),
        side: "BUY".into(),
        quantity: 1,
        order_type: "MARKET".into(),
        product: "INTRADAY".into(),
        price: Some(3500.0),
        sl: None,
        target: None,
        status: "PAPER".into(),
        dhan_order_id: Some("PAPER_20240304101500".into()),
        is_paper: true,
        is_exit: false,
        pnl: None,
        notes: None,
        created_at: OffsetDateTime::UNIX_EPOCH,
    };
    let json = serde_json::to_value(&row).unwrap();
    assert_eq!(json["created_at"], "1970-01-01T00:00:00Z");
    assert_eq!(json["status"], "PAPER");
    assert_eq!(json["is_exit"], false);
}
