//! Signal generation: indicators, the strategy trait, and the registry.
//!
//! DESIGN
//! ======
//! A strategy instance is created per configured strategy row and kept by
//! the scheduler between cycles, so it can remember which way it is
//! positioned for each symbol. Each cycle hands it the full intraday candle
//! history; it answers with zero or more `TradeIntent`s, which the risk
//! manager then gates. Strategies never touch the broker or the database.
//!
//! Emitting an intent does not change what a strategy holds. The engine
//! reports the book back through `set_position` once an order has actually
//! filled (or when an exit finds nothing to close), so a blocked or rejected
//! entry leaves the strategy flat.

pub mod ema_crossover;
pub mod indicators;
pub mod registry;

use serde::Serialize;

use crate::domain::{Candle, Exchange, OrderType, ProductType, Side};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StrategyError {
    #[error("unknown strategy '{name}'. Available: {available}")]
    Unknown { name: String, available: String },

    #[error("invalid parameter {key}: {reason}")]
    InvalidParam { key: String, reason: String },
}

/// Where the bar came from. Copied onto every intent the strategy emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarContext {
    pub exchange: Exchange,
    pub security_id: String,
}

/// A strategy's request to trade, before risk gating.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeIntent {
    pub symbol: String,
    pub exchange: Exchange,
    pub side: Side,
    pub quantity: i32,
    pub order_type: OrderType,
    /// Reference price: the last close for market orders.
    pub price: f64,
    pub product: ProductType,
    pub sl: Option<f64>,
    pub target: Option<f64>,
    pub security_id: String,
    /// Closes an existing position rather than opening one.
    pub is_exit: bool,
    pub reason: String,
}

pub trait Strategy: Send {
    /// Registry key this instance was built from.
    fn name(&self) -> &'static str;

    /// Evaluate the latest bar for `symbol`.
    fn on_bar(&mut self, symbol: &str, ctx: &BarContext, candles: &[Candle]) -> Vec<TradeIntent>;

    /// The side actually held for `symbol` after a fill, `None` when flat.
    fn set_position(&mut self, symbol: &str, held: Option<Side>);
}
