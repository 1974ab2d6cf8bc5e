use super::*;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn candle(high: f64, low: f64, close: f64) -> Candle {
    Candle { timestamp: None, open: close, high, low, close, volume: 0.0 }
}

#[test]
fn ema_is_seeded_with_first_value() {
    let out = ema(&[10.0, 11.0, 12.0], 3);
    assert_eq!(out.len(), 3);
    assert!(approx(out[0], 10.0));
    // alpha = 0.5
    assert!(approx(out[1], 10.5));
    assert!(approx(out[2], 11.25));
}

#[test]
fn ema_of_constant_series_is_constant() {
    let out = ema(&[5.0; 30], 9);
    assert!(out.iter().all(|v| approx(*v, 5.0)));
}

#[test]
fn ema_zero_period_or_empty_input_is_empty() {
    assert!(ema(&[1.0, 2.0], 0).is_empty());
    assert!(ema(&[], 5).is_empty());
}

#[test]
fn rsi_is_undefined_for_the_first_period_points() {
    let values: Vec<f64> = (0..20).map(f64::from).collect();
    let out = rsi(&values, 14);
    assert_eq!(out.len(), 20);
    assert!(out[..14].iter().all(Option::is_none));
    assert!(out[14].is_some());
}

#[test]
fn rsi_of_rising_series_is_100() {
    let values: Vec<f64> = (0..30).map(f64::from).collect();
    let out = rsi(&values, 14);
    assert!(approx(out.last().copied().flatten().unwrap(), 100.0));
}

#[test]
fn rsi_of_falling_series_is_0() {
    let values: Vec<f64> = (0..30).rev().map(f64::from).collect();
    let out = rsi(&values, 14);
    assert!(approx(out.last().copied().flatten().unwrap(), 0.0));
}

#[test]
fn rsi_of_alternating_series_is_near_50() {
    let values: Vec<f64> = (0..40).map(|i| if i % 2 == 0 { 100.0 } else { 101.0 }).collect();
    let last = rsi(&values, 14).last().copied().flatten().unwrap();
    assert!((last - 50.0).abs() < 5.0, "{last}");
}

#[test]
fn rsi_with_short_input_is_all_none() {
    assert!(rsi(&[1.0, 2.0, 3.0], 14).iter().all(Option::is_none));
}

#[test]
fn atr_of_constant_range_equals_range() {
    let highs = vec![102.0; 20];
    let lows = vec![98.0; 20];
    let closes = vec![100.0; 20];
    let out = atr(&highs, &lows, &closes, 14);
    assert_eq!(out[13], None);
    assert!(approx(out[14].unwrap(), 4.0));
    assert!(approx(out[19].unwrap(), 4.0));
}

#[test]
fn atr_uses_gap_from_previous_close() {
    // Gap up: range 1 but distance from previous close is 5.
    let highs = [100.0, 106.0];
    let lows = [99.0, 105.0];
    let closes = [100.0, 105.5];
    let out = atr(&highs, &lows, &closes, 1);
    assert!(approx(out[1].unwrap(), 6.0));
}

#[test]
fn atr_stop_distance_scales_atr() {
    let candles: Vec<Candle> = (0..20).map(|_| candle(102.0, 98.0, 100.0)).collect();
    assert!(approx(atr_stop_distance(&candles, 1.5), 6.0));
}

#[test]
fn atr_stop_distance_falls_back_to_one_percent() {
    let candles: Vec<Candle> = (0..5).map(|_| candle(251.0, 249.0, 250.0)).collect();
    assert!(approx(atr_stop_distance(&candles, 1.5), 2.5));
    assert!(approx(atr_stop_distance(&[], 1.5), 0.0));
}
