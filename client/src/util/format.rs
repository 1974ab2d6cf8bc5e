//! Display formatting for money and percentages.
//!
//! Amounts use Indian digit grouping (`12,34,567.89`), which is what NSE/BSE
//! traders expect to read.

#[cfg(test)]
#[path = "format_test.rs"]
mod format_test;

/// Format an amount as rupees with Indian grouping and two decimals.
#[must_use]
pub fn format_inr(amount: f64) -> String {
    if !amount.is_finite() {
        return "—".to_owned();
    }
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let cents = cents as u64;
    let whole = (cents / 100).to_string();
    let frac = cents % 100;

    let grouped = group_indian(&whole);
    let sign = if negative && cents > 0 { "-" } else { "" };
    format!("{sign}₹{grouped}.{frac:02}")
}

fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_owned();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut rest = head;
    while rest.len() > 2 {
        let (left, right) = rest.split_at(rest.len() - 2);
        groups.push(right);
        rest = left;
    }
    if !rest.is_empty() {
        groups.push(rest);
    }
    groups.reverse();
    format!("{},{tail}", groups.join(","))
}

/// Format a percentage with two decimals, e.g. `"57.14%"`.
#[must_use]
pub fn format_pct(value: f64) -> String {
    format!("{value:.2}%")
}

/// CSS modifier for a P&L value.
#[must_use]
pub fn pnl_class(value: f64) -> &'static str {
    if value > 0.0 {
        "pnl pnl--gain"
    } else if value < 0.0 {
        "pnl pnl--loss"
    } else {
        "pnl"
    }
}

/// Format an optional price, falling back to a dash.
#[must_use]
pub fn format_price(price: Option<f64>) -> String {
    price.map_or_else(|| "—".to_owned(), |p| format!("{p:.2}"))
}
