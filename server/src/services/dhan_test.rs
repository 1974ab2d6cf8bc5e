use super::*;
use time::macros::date;

fn market_buy() -> OrderRequest {
    OrderRequest {
        security_id: "1333".into(),
        exchange: Exchange::Nse,
        side: Side::Buy,
        quantity: 5,
        order_type: OrderType::Market,
        product: ProductType::Intraday,
        price: 1520.5,
    }
}

#[test]
fn order_body_maps_enums_to_dhan_codes() {
    let body = order_body("1100012345", &market_buy());
    assert_eq!(body["dhanClientId"], "1100012345");
    assert_eq!(body["transactionType"], "BUY");
    assert_eq!(body["exchangeSegment"], "NSE_EQ");
    assert_eq!(body["productType"], "INTRADAY");
    assert_eq!(body["orderType"], "MARKET");
    assert_eq!(body["validity"], "DAY");
    assert_eq!(body["securityId"], "1333");
    assert_eq!(body["quantity"], 5);
    assert_eq!(body["price"], 0.0);
}

#[test]
fn limit_orders_carry_their_price() {
    let order = OrderRequest {
        order_type: OrderType::Limit,
        exchange: Exchange::Bse,
        side: Side::Sell,
        product: ProductType::Cnc,
        ..market_buy()
    };
    let body = order_body("c", &order);
    assert_eq!(body["price"], 1520.5);
    assert_eq!(body["exchangeSegment"], "BSE_EQ");
    assert_eq!(body["transactionType"], "SELL");
    assert_eq!(body["productType"], "CNC");
}

#[test]
fn intraday_body_uses_one_minute_equity_bars() {
    let body = intraday_body("1333", Exchange::Nse, date!(2024 - 03 - 04), date!(2024 - 03 - 04));
    assert_eq!(body["instrument"], "EQUITY");
    assert_eq!(body["interval"], "1");
    assert_eq!(body["exchangeSegment"], "NSE_EQ");
    assert_eq!(body["fromDate"], "2024-03-04");
    assert_eq!(body["toDate"], "2024-03-04");
}

#[test]
fn extract_list_accepts_bare_and_wrapped_arrays() {
    assert_eq!(extract_list(json!([{"a": 1}])).len(), 1);
    assert_eq!(extract_list(json!({"data": [{"a": 1}, {"a": 2}]})).len(), 2);
    assert!(extract_list(json!({"data": null})).is_empty());
    assert!(extract_list(json!("nope")).is_empty());
}

#[test]
fn order_ack_reads_string_or_numeric_id() {
    let ack = parse_order_ack(&json!({"orderId": "112111182198", "orderStatus": "PENDING"})).unwrap();
    assert_eq!(ack.order_id, "112111182198");
    assert_eq!(ack.status.as_deref(), Some("PENDING"));

    let ack = parse_order_ack(&json!({"data": {"orderId": 42}})).unwrap();
    assert_eq!(ack.order_id, "42");
    assert_eq!(ack.status, None);

    assert!(matches!(parse_order_ack(&json!({"status": "failure"})), Err(DhanError::Parse(_))));
}

#[test]
fn funds_accept_dhan_spelling_and_numeric_strings() {
    let funds = parse_funds(&json!({"availabelBalance": 98440.0, "utilizedAmount": "1560.5"}));
    assert!((funds.available_balance - 98440.0).abs() < f64::EPSILON);
    assert!((funds.used_margin - 1560.5).abs() < f64::EPSILON);

    let funds = parse_funds(&json!({"data": {"availableBalance": 10}}));
    assert!((funds.available_balance - 10.0).abs() < f64::EPSILON);
    assert!(funds.used_margin.abs() < f64::EPSILON);
}

#[test]
fn columnar_candles_are_zipped_by_index() {
    let payload = json!({
        "open": [100.0, 101.0],
        "high": [102.0, 103.0],
        "low": [99.0, 100.5],
        "close": [101.0, "102.5"],
        "volume": [1000, 2000],
        "timestamp": [1_709_524_500, 1_709_524_560]
    });
    let candles = parse_candles(&payload).unwrap();
    assert_eq!(candles.len(), 2);
    assert_eq!(candles[0].timestamp, Some(1_709_524_500));
    assert!((candles[1].close - 102.5).abs() < f64::EPSILON);
    assert!((candles[1].low - 100.5).abs() < f64::EPSILON);
    assert!((candles[1].volume - 2000.0).abs() < f64::EPSILON);
}

#[test]
fn candles_without_finite_close_are_dropped() {
    let payload = json!({"data": {"close": [101.0, null, "abc", 103.0], "open": [1, 2, 3, 4]}});
    let candles = parse_candles(&payload).unwrap();
    assert_eq!(candles.len(), 2);
    assert!((candles[1].close - 103.0).abs() < f64::EPSILON);
    assert!((candles[1].open - 4.0).abs() < f64::EPSILON);
    // Missing columns fall back to the close.
    assert!((candles[0].high - 101.0).abs() < f64::EPSILON);
}

#[test]
fn row_candles_are_parsed() {
    let payload = json!([
        {"open": 1.0, "high": 2.0, "low": 0.5, "close": 1.5, "volume": 10, "start_Time": 5},
        {"open": 1.0}
    ]);
    let candles = parse_candles(&payload).unwrap();
    assert_eq!(candles.len(), 1);
    assert_eq!(candles[0].timestamp, Some(5));
}

#[test]
fn empty_and_malformed_candle_payloads() {
    assert!(parse_candles(&json!({})).unwrap().is_empty());
    assert!(parse_candles(&json!([])).unwrap().is_empty());
    assert!(matches!(parse_candles(&json!("oops")), Err(DhanError::Parse(_))));
    assert!(matches!(parse_candles(&json!({"status": "x"})), Err(DhanError::Parse(_))));
}

#[test]
fn client_requires_both_credentials() {
    let settings = DhanSettings::default();
    let blank = DhanCredentials { client_id: "c".into(), access_token: "  ".into() };
    assert!(matches!(DhanClient::new(&settings, blank), Err(DhanError::NotConfigured)));

    let ok = DhanCredentials { client_id: "c".into(), access_token: "t".into() };
    assert!(DhanClient::new(&settings, ok).is_ok());
}
