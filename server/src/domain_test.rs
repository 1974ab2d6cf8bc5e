use super::*;

#[test]
fn side_parse_is_case_insensitive() {
    assert_eq!(Side::parse("buy"), Some(Side::Buy));
    assert_eq!(Side::parse(" SELL "), Some(Side::Sell));
    assert_eq!(Side::parse("hold"), None);
    assert_eq!(Side::Buy.opposite(), Side::Sell);
}

#[test]
fn exchange_maps_to_equity_segment() {
    assert_eq!(Exchange::parse("nse").map(Exchange::equity_segment), Some("NSE_EQ"));
    assert_eq!(Exchange::Bse.equity_segment(), "BSE_EQ");
    assert_eq!(Exchange::parse("MCX"), None);
}

#[test]
fn product_accepts_dhan_alias() {
    assert_eq!(ProductType::parse("INTRA"), Some(ProductType::Intraday));
    assert_eq!(ProductType::parse("cnc"), Some(ProductType::Cnc));
}

#[test]
fn only_executed_and_paper_count_as_filled() {
    assert!(OrderStatus::Executed.is_filled());
    assert!(OrderStatus::Paper.is_filled());
    assert!(!OrderStatus::Rejected.is_filled());
    assert!(!OrderStatus::Pending.is_filled());
    assert_eq!(OrderStatus::FILLED, [OrderStatus::Executed.as_str(), OrderStatus::Paper.as_str()]);
}

#[test]
fn enums_serialize_upper_case() {
    assert_eq!(serde_json::to_value(Side::Sell).unwrap(), serde_json::json!("SELL"));
    assert_eq!(serde_json::to_value(ProductType::Cnc).unwrap(), serde_json::json!("CNC"));
    assert_eq!(serde_json::to_value(OrderType::Limit).unwrap(), serde_json::json!("LIMIT"));
}
