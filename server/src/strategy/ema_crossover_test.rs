use super::*;
use crate::domain::Exchange;
use serde_json::json;

fn ctx() -> BarContext {
    BarContext { exchange: Exchange::Nse, security_id: "1333".into() }
}

fn candles(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .map(|&c| Candle { timestamp: None, open: c, high: c + 1.0, low: c - 1.0, close: c, volume: 100.0 })
        .collect()
}

/// 40 bars drifting down 0.5, then 20 bars rising 5 each.
fn decline_then_rally() -> Vec<f64> {
    let decline: Vec<f64> = (0..40).map(|i| 100.0 - 0.5 * f64::from(i)).collect();
    let last = *decline.last().unwrap();
    let rally = (1..=20).map(|k| last + 5.0 * f64::from(k));
    decline.into_iter().chain(rally).collect()
}

/// Continues `decline_then_rally` with 20 bars falling 10 each.
fn decline_rally_selloff() -> Vec<f64> {
    let mut closes = decline_then_rally();
    let top = *closes.last().unwrap();
    closes.extend((1..=20).map(|k| top - 10.0 * f64::from(k)));
    closes
}

/// Feed growing prefixes the way the scheduler does each minute. When
/// `fill` is set every intent is confirmed back as filled.
fn replay_with(strategy: &mut EmaCrossover, closes: &[f64], fill: bool) -> Vec<(usize, TradeIntent)> {
    let bars = candles(closes);
    let mut out = Vec::new();
    for n in 1..=bars.len() {
        for intent in strategy.on_bar("RELIANCE", &ctx(), &bars[..n]) {
            if fill {
                strategy.set_position(&intent.symbol, (!intent.is_exit).then_some(intent.side));
            }
            out.push((n, intent));
        }
    }
    out
}

fn replay(strategy: &mut EmaCrossover, closes: &[f64]) -> Vec<(usize, TradeIntent)> {
    replay_with(strategy, closes, true)
}

#[test]
fn defaults_match_documented_values() {
    let p = EmaCrossoverParams::default();
    assert_eq!((p.ema_fast, p.ema_slow, p.rsi_period), (9, 21, 14));
    assert!((p.rsi_buy_threshold - 55.0).abs() < f64::EPSILON);
    assert!((p.rsi_sell_threshold - 45.0).abs() < f64::EPSILON);
    assert!((p.sl_pct - 1.0).abs() < f64::EPSILON);
    assert!(p.sl_atr_mult.abs() < f64::EPSILON);
    assert!((p.target_pct - 2.0).abs() < f64::EPSILON);
    assert_eq!(p.qty, 1);
    assert_eq!(p.product, ProductType::Intraday);
    assert_eq!(default_params()["product"], json!("INTRADAY"));
}

#[test]
fn user_params_override_key_by_key() {
    let p = EmaCrossoverParams::from_json(&json!({"ema_fast": 5, "qty": 10, "unknown": true})).unwrap();
    assert_eq!(p.ema_fast, 5);
    assert_eq!(p.qty, 10);
    assert_eq!(p.ema_slow, 21);
    assert_eq!(EmaCrossoverParams::from_json(&serde_json::Value::Null).unwrap(), EmaCrossoverParams::default());
}

#[test]
fn wrongly_typed_param_is_rejected() {
    let err = EmaCrossoverParams::from_json(&json!({"ema_fast": "nine"})).unwrap_err();
    assert!(matches!(err, StrategyError::InvalidParam { .. }));
    assert!(EmaCrossoverParams::from_json(&json!([1, 2])).is_err());
}

#[test]
fn unusable_combinations_are_rejected() {
    assert!(EmaCrossoverParams::from_json(&json!({"ema_fast": 30})).is_err());
    assert!(EmaCrossoverParams::from_json(&json!({"rsi_period": 0})).is_err());
    assert!(EmaCrossoverParams::from_json(&json!({"qty": 0})).is_err());
    assert!(EmaCrossoverParams::from_json(&json!({"sl_pct": -1.0})).is_err());
    assert!(EmaCrossoverParams::from_json(&json!({"sl_atr_mult": -0.5})).is_err());
}

#[test]
fn too_few_candles_emit_nothing() {
    let mut strategy = EmaCrossover::new(EmaCrossoverParams::default());
    let bars = candles(&[100.0; 25]);
    assert!(strategy.on_bar("RELIANCE", &ctx(), &bars).is_empty());
}

#[test]
fn flat_market_emits_nothing() {
    let mut strategy = EmaCrossover::new(EmaCrossoverParams::default());
    assert!(replay(&mut strategy, &[100.0; 60]).is_empty());
}

#[test]
fn bullish_cross_with_strong_rsi_goes_long_once() {
    let mut strategy = EmaCrossover::new(EmaCrossoverParams::default());
    let intents = replay(&mut strategy, &decline_then_rally());

    assert_eq!(intents.len(), 1, "{intents:?}");
    let (bar, entry) = &intents[0];
    assert_eq!(*bar, 43);
    assert_eq!(entry.side, Side::Buy);
    assert!(!entry.is_exit);
    assert_eq!(entry.symbol, "RELIANCE");
    assert_eq!(entry.security_id, "1333");
    assert_eq!(entry.exchange, Exchange::Nse);
    assert_eq!(entry.order_type, OrderType::Market);
    assert!((entry.price - 95.5).abs() < 1e-9);
    assert!((entry.sl.unwrap() - 95.5 * 0.99).abs() < 1e-9);
    assert!((entry.target.unwrap() - 95.5 * 1.02).abs() < 1e-9);
    assert!(entry.reason.starts_with("EMA Cross BUY"));
    assert_eq!(strategy.position("RELIANCE"), Some(Side::Buy));
}

#[test]
fn bearish_cross_after_long_exits_then_goes_short() {
    let mut strategy = EmaCrossover::new(EmaCrossoverParams::default());
    let intents = replay(&mut strategy, &decline_rally_selloff());

    assert_eq!(intents.len(), 3, "{intents:?}");
    let (bar_exit, exit) = &intents[1];
    let (bar_entry, entry) = &intents[2];
    assert_eq!((*bar_exit, *bar_entry), (68, 68));
    assert!(exit.is_exit);
    assert_eq!(exit.side, Side::Sell);
    assert_eq!(exit.reason, "Exit Long + EMA Cross");
    assert!(exit.sl.is_none());
    assert!(!entry.is_exit);
    assert_eq!(entry.side, Side::Sell);
    assert!((entry.sl.unwrap() - 100.5 * 1.01).abs() < 1e-9);
    assert!((entry.target.unwrap() - 100.5 * 0.98).abs() < 1e-9);
    assert_eq!(strategy.position("RELIANCE"), Some(Side::Sell));
}

#[test]
fn rsi_filter_blocks_weak_crosses() {
    let params = EmaCrossoverParams::from_json(&json!({"rsi_buy_threshold": 90})).unwrap();
    let mut strategy = EmaCrossover::new(params);
    assert!(replay(&mut strategy, &decline_then_rally()).is_empty());
    assert_eq!(strategy.position("RELIANCE"), None);
}

#[test]
fn positions_are_tracked_per_symbol() {
    let mut strategy = EmaCrossover::new(EmaCrossoverParams::default());
    replay(&mut strategy, &decline_then_rally());
    assert_eq!(strategy.position("RELIANCE"), Some(Side::Buy));
    assert_eq!(strategy.position("TCS"), None);
    assert_eq!(strategy.name(), NAME);
}

#[test]
fn emitting_an_entry_does_not_mark_it_held() {
    let mut strategy = EmaCrossover::new(EmaCrossoverParams::default());
    let intents = replay_with(&mut strategy, &decline_then_rally(), false);
    assert_eq!(intents.len(), 1);
    assert_eq!(strategy.position("RELIANCE"), None);
}

#[test]
fn unfilled_entry_is_never_followed_by_an_exit() {
    let mut strategy = EmaCrossover::new(EmaCrossoverParams::default());
    let intents = replay_with(&mut strategy, &decline_rally_selloff(), false);

    assert_eq!(intents.len(), 2, "{intents:?}");
    assert!(intents.iter().all(|(_, i)| !i.is_exit));
    assert_eq!(intents[0].1.side, Side::Buy);
    assert_eq!(intents[1].1.side, Side::Sell);
}

#[test]
fn confirmed_flat_position_forgets_the_held_side() {
    let mut strategy = EmaCrossover::new(EmaCrossoverParams::default());
    replay(&mut strategy, &decline_then_rally());
    strategy.set_position("RELIANCE", None);
    assert_eq!(strategy.position("RELIANCE"), None);
}

#[test]
fn atr_multiplier_sets_stop_distance() {
    let params = EmaCrossoverParams::from_json(&json!({"sl_atr_mult": 2.0})).unwrap();
    let mut strategy = EmaCrossover::new(params);
    let intents = replay(&mut strategy, &decline_then_rally());

    let (bar, entry) = &intents[0];
    let expected = crate::strategy::indicators::atr_stop_distance(&candles(&decline_then_rally())[..*bar], 2.0);
    assert!(expected > 0.0);
    assert!((entry.sl.unwrap() - (entry.price - expected)).abs() < 1e-9);
    assert!((entry.target.unwrap() - entry.price * 1.02).abs() < 1e-9);
}
