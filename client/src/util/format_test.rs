use super::*;

#[test]
fn format_inr_uses_indian_grouping() {
    assert_eq!(format_inr(0.0), "₹0.00");
    assert_eq!(format_inr(999.5), "₹999.50");
    assert_eq!(format_inr(1000.0), "₹1,000.00");
    assert_eq!(format_inr(100_000.0), "₹1,00,000.00");
    assert_eq!(format_inr(1_234_567.891), "₹12,34,567.89");
    assert_eq!(format_inr(123_456_789.0), "₹12,34,56,789.00");
}

#[test]
fn format_inr_handles_negative_and_non_finite() {
    assert_eq!(format_inr(-2500.25), "-₹2,500.25");
    assert_eq!(format_inr(-0.001), "₹0.00");
    assert_eq!(format_inr(f64::NAN), "—");
}

#[test]
fn format_pct_rounds_to_two_places() {
    assert_eq!(format_pct(57.142_857), "57.14%");
    assert_eq!(format_pct(0.0), "0.00%");
}

#[test]
fn pnl_class_reflects_sign() {
    assert_eq!(pnl_class(10.0), "pnl pnl--gain");
    assert_eq!(pnl_class(-0.5), "pnl pnl--loss");
    assert_eq!(pnl_class(0.0), "pnl");
}

#[test]
fn format_price_falls_back_to_dash() {
    assert_eq!(format_price(Some(2450.5)), "2450.50");
    assert_eq!(format_price(None), "—");
}
