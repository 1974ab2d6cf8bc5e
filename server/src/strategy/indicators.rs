//! Pure technical indicators over `f64` series.
//!
//! No I/O, no side effects. Every function returns a series aligned with its
//! input (same length) so callers can index the latest bar with `last()`.
//! Points that cannot be computed yet are `None`.
//!
//! - EMA: `alpha = 2 / (period + 1)`, seeded with the first value.
//! - RSI and ATR: Wilder smoothing (`1 / period`), seeded with a simple mean.

#[cfg(test)]
#[path = "indicators_test.rs"]
mod indicators_test;

use crate::domain::Candle;

/// ATR look-back used for stop distances.
pub const ATR_PERIOD: usize = 14;

/// Stop distance as a fraction of price when ATR is unavailable.
const FALLBACK_STOP_FRACTION: f64 = 0.01;

/// Exponential moving average, seeded with the first value.
///
/// Returns an empty series for `period == 0`.
#[must_use]
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.is_empty() {
        return Vec::new();
    }
    #[allow(clippy::cast_precision_loss)]
    let alpha = 2.0 / (period as f64 + 1.0);

    let mut out = Vec::with_capacity(values.len());
    let mut prev = values[0];
    out.push(prev);
    for &v in &values[1..] {
        prev = alpha * v + (1.0 - alpha) * prev;
        out.push(prev);
    }
    out
}

/// Relative strength index with Wilder smoothing.
///
/// The first `period` points are `None`. A window with no losses reads 100.
#[must_use]
pub fn rsi(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() <= period {
        return out;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = period as f64;

    let changes: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
    let mut avg_gain = changes[..period].iter().map(|c| c.max(0.0)).sum::<f64>() / n;
    let mut avg_loss = changes[..period].iter().map(|c| (-c).max(0.0)).sum::<f64>() / n;
    out[period] = Some(rsi_from(avg_gain, avg_loss));

    for (offset, &c) in changes[period..].iter().enumerate() {
        avg_gain = (avg_gain * (n - 1.0) + c.max(0.0)) / n;
        avg_loss = (avg_loss * (n - 1.0) + (-c).max(0.0)) / n;
        out[period + 1 + offset] = Some(rsi_from(avg_gain, avg_loss));
    }
    out
}

fn rsi_from(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
}

/// Average true range with Wilder smoothing.
///
/// True range needs the previous close, so the first defined point is at
/// index `period`.
#[must_use]
pub fn atr(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let len = highs.len().min(lows.len()).min(closes.len());
    let mut out = vec![None; len];
    if period == 0 || len <= period {
        return out;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = period as f64;

    let true_range = |i: usize| {
        let prev_close = closes[i - 1];
        (highs[i] - lows[i])
            .max((highs[i] - prev_close).abs())
            .max((lows[i] - prev_close).abs())
    };

    let mut value = (1..=period).map(true_range).sum::<f64>() / n;
    out[period] = Some(value);
    for (i, slot) in out.iter_mut().enumerate().skip(period + 1) {
        value = (value * (n - 1.0) + true_range(i)) / n;
        *slot = Some(value);
    }
    out
}

/// Stop-loss distance from the latest ATR, or 1% of the last close.
#[must_use]
pub fn atr_stop_distance(candles: &[Candle], multiplier: f64) -> f64 {
    let Some(last) = candles.last() else {
        return 0.0;
    };
    let highs: Vec<f64> = candles.iter().map(|c| c.high).collect();
    let lows: Vec<f64> = candles.iter().map(|c| c.low).collect();
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();

    match atr(&highs, &lows, &closes, ATR_PERIOD).last().copied().flatten() {
        Some(value) if value.is_finite() && value > 0.0 => value * multiplier,
        _ => last.close * FALLBACK_STOP_FRACTION,
    }
}
