//! EMA crossover with an RSI confirmation filter.
//!
//! A bullish cross (fast EMA moves above slow EMA) with RSI at or above the
//! buy threshold goes long; the bearish mirror with RSI at or below the sell
//! threshold goes short. Reversing first emits an exit for the open side.
//! A repeated signal in the direction already held is ignored. What counts
//! as held is whatever the engine last confirmed through `set_position`.

#[cfg(test)]
#[path = "ema_crossover_test.rs"]
mod ema_crossover_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::indicators::{atr_stop_distance, ema, rsi};
use super::{BarContext, Strategy, StrategyError, TradeIntent};
use crate::domain::{Candle, OrderType, ProductType, Side};

pub const NAME: &str = "ema_crossover";
pub const DESCRIPTION: &str = "EMA Crossover with RSI filter - intraday NSE/BSE stocks";

/// Candles needed beyond the slow period before signals are considered.
const WARMUP_EXTRA: usize = 5;
const NEUTRAL_RSI: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmaCrossoverParams {
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub rsi_period: usize,
    pub rsi_buy_threshold: f64,
    pub rsi_sell_threshold: f64,
    pub sl_pct: f64,
    /// When positive, the stop sits this many ATRs away instead of `sl_pct`.
    pub sl_atr_mult: f64,
    pub target_pct: f64,
    pub qty: i32,
    pub product: ProductType,
}

impl Default for EmaCrossoverParams {
    fn default() -> Self {
        Self {
            ema_fast: 9,
            ema_slow: 21,
            rsi_period: 14,
            rsi_buy_threshold: 55.0,
            rsi_sell_threshold: 45.0,
            sl_pct: 1.0,
            sl_atr_mult: 0.0,
            target_pct: 2.0,
            qty: 1,
            product: ProductType::Intraday,
        }
    }
}

impl EmaCrossoverParams {
    /// Overlay user params on the defaults. Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns `StrategyError::InvalidParam` for a wrongly typed value or an
    /// unusable combination (zero periods, fast not faster than slow).
    pub fn from_json(params: &serde_json::Value) -> Result<Self, StrategyError> {
        let parsed: Self = match params {
            serde_json::Value::Null => Self::default(),
            serde_json::Value::Object(_) => serde_json::from_value(params.clone())
                .map_err(|e| invalid("params", e.to_string()))?,
            other => return Err(invalid("params", format!("expected an object, got {other}"))),
        };
        parsed.validate()?;
        Ok(parsed)
    }

    fn validate(&self) -> Result<(), StrategyError> {
        if self.ema_fast == 0 || self.ema_slow == 0 || self.rsi_period == 0 {
            return Err(invalid("ema_fast/ema_slow/rsi_period", "periods must be positive".into()));
        }
        if self.ema_fast >= self.ema_slow {
            return Err(invalid(
                "ema_fast",
                format!("fast period {} must be below slow period {}", self.ema_fast, self.ema_slow),
            ));
        }
        if self.qty <= 0 {
            return Err(invalid("qty", format!("{} is not a positive quantity", self.qty)));
        }
        if !(self.sl_pct >= 0.0 && self.target_pct >= 0.0) {
            return Err(invalid("sl_pct/target_pct", "percentages must be non-negative".into()));
        }
        if !(self.sl_atr_mult >= 0.0) {
            return Err(invalid("sl_atr_mult", format!("{} is not a non-negative multiplier", self.sl_atr_mult)));
        }
        Ok(())
    }
}

fn invalid(key: &str, reason: String) -> StrategyError {
    StrategyError::InvalidParam { key: key.to_owned(), reason }
}

/// Default params as JSON, for the registry listing.
#[must_use]
pub fn default_params() -> serde_json::Value {
    serde_json::to_value(EmaCrossoverParams::default()).unwrap_or_default()
}

pub struct EmaCrossover {
    params: EmaCrossoverParams,
    /// Side confirmed held per symbol.
    positions: HashMap<String, Side>,
}

impl EmaCrossover {
    #[must_use]
    pub fn new(params: EmaCrossoverParams) -> Self {
        Self { params, positions: HashMap::new() }
    }

    #[must_use]
    pub fn params(&self) -> &EmaCrossoverParams {
        &self.params
    }

    #[must_use]
    pub fn position(&self, symbol: &str) -> Option<Side> {
        self.positions.get(symbol).copied()
    }

    fn intent(&self, symbol: &str, ctx: &BarContext, side: Side, price: f64) -> TradeIntent {
        TradeIntent {
            symbol: symbol.to_owned(),
            exchange: ctx.exchange,
            side,
            quantity: self.params.qty,
            order_type: OrderType::Market,
            price,
            product: self.params.product,
            sl: None,
            target: None,
            security_id: ctx.security_id.clone(),
            is_exit: false,
            reason: String::new(),
        }
    }
}

impl Strategy for EmaCrossover {
    fn name(&self) -> &'static str {
        NAME
    }

    fn on_bar(&mut self, symbol: &str, ctx: &BarContext, candles: &[Candle]) -> Vec<TradeIntent> {
        let p = &self.params;
        if candles.len() < p.ema_slow + WARMUP_EXTRA {
            return Vec::new();
        }

        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let fast = ema(&closes, p.ema_fast);
        let slow = ema(&closes, p.ema_slow);
        let n = closes.len();
        let (prev_fast, curr_fast) = (fast[n - 2], fast[n - 1]);
        let (prev_slow, curr_slow) = (slow[n - 2], slow[n - 1]);
        if !(curr_fast.is_finite() && curr_slow.is_finite()) {
            return Vec::new();
        }
        let curr_rsi = rsi(&closes, p.rsi_period)
            .last()
            .copied()
            .flatten()
            .unwrap_or(NEUTRAL_RSI);
        let price = closes[n - 1];

        let bullish = prev_fast <= prev_slow && curr_fast > curr_slow;
        let bearish = prev_fast >= prev_slow && curr_fast < curr_slow;

        let side = if bullish && curr_rsi >= p.rsi_buy_threshold {
            Side::Buy
        } else if bearish && curr_rsi <= p.rsi_sell_threshold {
            Side::Sell
        } else {
            return Vec::new();
        };

        let held = self.position(symbol);
        if held == Some(side) {
            return Vec::new();
        }

        let mut intents = Vec::with_capacity(2);
        if held == Some(side.opposite()) {
            let mut exit = self.intent(symbol, ctx, side, price);
            exit.is_exit = true;
            exit.reason = match side {
                Side::Buy => "Exit Short + EMA Cross".to_owned(),
                Side::Sell => "Exit Long + EMA Cross".to_owned(),
            };
            intents.push(exit);
        }

        let stop_distance = if p.sl_atr_mult > 0.0 {
            atr_stop_distance(candles, p.sl_atr_mult)
        } else {
            price * p.sl_pct / 100.0
        };
        let target_distance = price * p.target_pct / 100.0;
        let mut entry = self.intent(symbol, ctx, side, price);
        let (sl, target) = match side {
            Side::Buy => (price - stop_distance, price + target_distance),
            Side::Sell => (price + stop_distance, price - target_distance),
        };
        entry.sl = Some(sl);
        entry.target = Some(target);
        entry.reason = format!(
            "EMA Cross {}: fast={curr_fast:.2} slow={curr_slow:.2} rsi={curr_rsi:.1}",
            side.as_str()
        );
        intents.push(entry);

        tracing::info!(symbol, side = side.as_str(), price, "ema crossover signal");
        intents
    }

    fn set_position(&mut self, symbol: &str, held: Option<Side>) {
        match held {
            Some(side) => self.positions.insert(symbol.to_owned(), side),
            None => self.positions.remove(symbol),
        };
    }
}
