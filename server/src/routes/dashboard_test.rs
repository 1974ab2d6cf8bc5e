use super::*;

#[test]
fn pnl_response_flattens_totals() {
    let body = PnlResponse {
        totals: orders::summarize_pnl(&[120.0, -20.0]),
        paper_trade: true,
        date: "2026-10-19".into(),
    };
    let json = serde_json::to_value(&body).unwrap();
    assert_eq!(json["total_pnl"], 100.0);
    assert_eq!(json["total_trades"], 2);
    assert_eq!(json["winning_trades"], 1);
    assert_eq!(json["losing_trades"], 1);
    assert_eq!(json["win_rate"], 50.0);
    assert_eq!(json["paper_trade"], true);
    assert_eq!(json["date"], "2026-10-19");
}

#[test]
fn paper_funds_omit_raw_payload() {
    let body = FundsResponse { available_balance: 100_000.0, used_margin: 0.0, paper_trade: true, funds: None };
    let json = serde_json::to_value(&body).unwrap();
    assert!(json.get("funds").is_none());
    assert_eq!(json["available_balance"], 100_000.0);
}
