//! Strategy scheduler and the per-minute trading cycle.
//!
//! SYSTEM CONTEXT
//! ==============
//! `Scheduler::start` spawns one background loop that wakes once a minute at
//! the configured second and runs `run_cycle`. A cycle loads the active
//! strategies, fetches intraday candles through the `Broker`, asks each
//! strategy for intents, gates every intent through the risk manager, and
//! journals the result (paper fill, live fill, or rejection).
//!
//! DESIGN
//! ======
//! - Strategy instances live in a `StrategyCache` owned by the loop, so
//!   per-symbol position memory survives between cycles. An instance is
//!   rebuilt when its params change and dropped when its row goes inactive.
//! - The risk snapshot (open positions, realized P&L, capital) is read once
//!   per cycle and then advanced locally as orders fill.
//! - An exit is matched to the open entry it closes before it reaches the
//!   gate and always trades the entry's full quantity. An exit with nothing
//!   to close is dropped.
//! - Strategies learn what they hold only from fills reported back through
//!   `Strategy::set_position`.
//! - Cycles are serialized through `cycle_lock`, so a stop followed by a
//!   quick restart can never run two cycles at once.
//!
//! ERROR HANDLING
//! ==============
//! A failure inside one strategy is logged and journaled, then the cycle
//! moves on to the next strategy. Only failures that make the whole cycle
//! meaningless (database down, live funds unknown) abort it.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::{Value, json};
use sqlx::PgPool;
use time::{OffsetDateTime, Weekday};
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;

use super::dhan::{self, Broker, DhanError, OrderRequest, parse_funds};
use super::event_log::{self, LogLevel, LogSource};
use super::orders::{self, NewOrder, OpenEntry, OrderRow};
use super::risk::{self, RiskDecision, RiskError, RiskSettings, RiskSnapshot};
use super::strategies::{self, StrategyRow};
use crate::config::{MarketHours, Settings};
use crate::domain::{Exchange, OrderStatus, Side};
use crate::strategy::{BarContext, Strategy, StrategyError, TradeIntent, registry};

/// Fewer candles than this and a strategy is not consulted.
pub const MIN_CANDLES: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("scheduler already running")]
    AlreadyRunning,

    #[error("scheduler not running")]
    NotRunning,

    #[error("invalid strategy row: {0}")]
    InvalidRow(String),

    #[error(transparent)]
    Strategy(#[from] StrategyError),

    #[error(transparent)]
    Dhan(#[from] DhanError),

    #[error(transparent)]
    Risk(#[from] RiskError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

// =============================================================================
// CLOCK
// =============================================================================

/// Weekday session check in exchange-local time, both ends inclusive.
#[must_use]
pub fn is_market_open(now: OffsetDateTime, hours: &MarketHours) -> bool {
    let local = now.to_offset(hours.utc_offset);
    if matches!(local.weekday(), Weekday::Saturday | Weekday::Sunday) {
        return false;
    }
    let t = local.time();
    hours.open <= t && t <= hours.close
}

/// Time until the next `second` past a minute boundary.
#[must_use]
pub fn next_fire_delay(now: OffsetDateTime, second: u8) -> Duration {
    let into_minute = Duration::from_secs(u64::from(now.second())) + Duration::from_nanos(u64::from(now.nanosecond()));
    let target = Duration::from_secs(u64::from(second.min(59)));
    if into_minute < target {
        target - into_minute
    } else {
        Duration::from_secs(60) - into_minute + target
    }
}

/// Synthetic broker id for a paper fill, stamped in exchange-local time.
#[must_use]
pub fn paper_order_id(local: OffsetDateTime) -> String {
    format!(
        "PAPER_{:04}{:02}{:02}{:02}{:02}{:02}",
        local.year(),
        u8::from(local.month()),
        local.day(),
        local.hour(),
        local.minute(),
        local.second()
    )
}

// =============================================================================
// STRATEGY CACHE
// =============================================================================

struct CachedStrategy {
    name: String,
    params: Value,
    instance: Box<dyn Strategy>,
}

#[derive(Default)]
pub struct StrategyCache {
    entries: HashMap<i64, CachedStrategy>,
}

impl StrategyCache {
    /// Reuse the instance for `id` unless its type or params changed.
    ///
    /// # Errors
    ///
    /// Registry errors when the instance has to be (re)built.
    pub fn get_or_build(&mut self, id: i64, name: &str, params: &Value) -> Result<&mut dyn Strategy, StrategyError> {
        let build = || -> Result<CachedStrategy, StrategyError> {
            let instance = registry::build(name, params)?;
            tracing::debug!(strategy_id = id, name, "strategy instance built");
            Ok(CachedStrategy { name: name.to_owned(), params: params.clone(), instance })
        };
        let cached = match self.entries.entry(id) {
            Entry::Occupied(slot) if slot.get().name == name && &slot.get().params == params => slot.into_mut(),
            Entry::Occupied(mut slot) => {
                slot.insert(build()?);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(build()?),
        };
        Ok(cached.instance.as_mut())
    }

    /// Drop instances whose rows are no longer active.
    pub fn retain_ids(&mut self, active: &[i64]) {
        self.entries.retain(|id, _| active.contains(id));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Row params with the row's quantity filled in as `qty` when unset.
#[must_use]
pub fn effective_params(row: &StrategyRow) -> Value {
    let mut params = match &row.params.0 {
        Value::Object(map) => map.clone(),
        _ => serde_json::Map::new(),
    };
    params.entry("qty").or_insert_with(|| json!(row.quantity));
    Value::Object(params)
}

/// Resize an entry by risk when params carry `risk_pct` and the intent has
/// a stop. Exits are sized by `match_exit` instead.
#[must_use]
pub fn size_intent(mut intent: TradeIntent, params: &Value, capital: f64) -> TradeIntent {
    if intent.is_exit {
        return intent;
    }
    let risk_pct = params.get("risk_pct").and_then(Value::as_f64).unwrap_or(0.0);
    if let Some(sl) = intent.sl.filter(|_| risk_pct > 0.0) {
        intent.quantity = risk::position_size(capital, risk_pct, (intent.price - sl).abs(), intent.price);
    }
    intent
}

/// Tie an exit to the entry it closes: the exit trades the entry's whole
/// quantity. `None` when there is no open entry or the entry is on the
/// exit's own side.
#[must_use]
pub fn match_exit(mut exit: TradeIntent, open: Option<&OpenEntry>) -> Option<TradeIntent> {
    let entry = open?;
    if Side::parse(&entry.side) == Some(exit.side) {
        return None;
    }
    exit.quantity = entry.quantity;
    Some(exit)
}

/// Realized P&L of closing `entry` at `exit_price`, rounded to paise.
#[must_use]
pub fn round_trip_pnl(entry: &OpenEntry, exit_side: Side, exit_price: f64, exit_quantity: i32) -> f64 {
    let entry_side = Side::parse(&entry.side).unwrap_or(exit_side.opposite());
    let entry_price = entry.price.unwrap_or(exit_price);
    orders::round2(risk::realized_pnl(entry_side, entry_price, exit_price, entry.quantity.min(exit_quantity)))
}

// =============================================================================
// CYCLE
// =============================================================================

/// Counters for one cycle, logged at debug level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub skipped: Option<&'static str>,
    pub evaluated: usize,
    pub intents: usize,
    pub placed: usize,
    pub blocked: usize,
    pub failed: usize,
}

impl CycleReport {
    fn skipped(reason: &'static str) -> Self {
        Self { skipped: Some(reason), ..Self::default() }
    }
}

/// Everything one cycle reads from.
pub struct CycleContext<'a> {
    pub pool: &'a PgPool,
    pub settings: &'a Settings,
    pub broker: &'a dyn Broker,
    pub now: OffsetDateTime,
}

/// One scheduler tick.
///
/// # Errors
///
/// Database failures while loading settings or strategies, and broker
/// failures other than missing credentials.
pub async fn run_cycle(
    pool: &PgPool,
    settings: &Settings,
    cache: &mut StrategyCache,
    now: OffsetDateTime,
) -> Result<CycleReport, EngineError> {
    if !is_market_open(now, &settings.market) {
        return Ok(CycleReport::skipped("market closed"));
    }
    let risk_settings = risk::get(pool).await?;
    if !risk_settings.trading_enabled {
        return Ok(CycleReport::skipped("trading disabled"));
    }
    let rows = strategies::list_active(pool).await?;
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    cache.retain_ids(&ids);
    if rows.is_empty() {
        return Ok(CycleReport::skipped("no active strategies"));
    }

    let client = match dhan::connect(pool, &settings.dhan).await {
        Ok(client) => client,
        Err(DhanError::NotConfigured) => {
            tracing::warn!("dhan credentials missing; cycle skipped");
            return Ok(CycleReport::skipped("dhan not configured"));
        }
        Err(e) => return Err(e.into()),
    };

    let ctx = CycleContext { pool, settings, broker: &client, now };
    run_strategies(&ctx, &risk_settings, &rows, cache).await
}

/// Evaluate `rows` against an already-connected broker.
///
/// # Errors
///
/// Database failures while reading the risk snapshot, or a live-mode funds
/// lookup failure.
pub async fn run_strategies(
    ctx: &CycleContext<'_>,
    risk_settings: &RiskSettings,
    rows: &[StrategyRow],
    cache: &mut StrategyCache,
) -> Result<CycleReport, EngineError> {
    let paper = risk_settings.paper_trading || ctx.settings.paper_only;
    let capital = if paper {
        ctx.settings.paper_capital
    } else {
        parse_funds(&ctx.broker.fund_limits().await?).available_balance
    };
    let since = risk::window_start(ctx.now, ctx.settings.market.utc_offset, risk_settings.pnl_reset_at);
    let mut snapshot = RiskSnapshot {
        open_positions: orders::count_open_positions(ctx.pool, since).await?,
        realized_pnl_today: orders::realized_pnl_since(ctx.pool, since).await?,
        capital,
    };

    let mut report = CycleReport::default();
    for row in rows {
        report.evaluated += 1;
        if let Err(e) = run_strategy(ctx, risk_settings, row, cache, paper, &mut snapshot, &mut report).await {
            report.failed += 1;
            tracing::error!(strategy_id = row.id, symbol = %row.symbol, error = %e, "strategy evaluation failed");
            event_log::record(
                ctx.pool,
                LogLevel::Error,
                LogSource::Strategy,
                &format!("Strategy {} ({}) on {} failed: {e}", row.id, row.name, row.symbol),
                Some(json!({ "strategy_id": row.id })),
            )
            .await;
        }
    }
    Ok(report)
}

async fn run_strategy(
    ctx: &CycleContext<'_>,
    risk_settings: &RiskSettings,
    row: &StrategyRow,
    cache: &mut StrategyCache,
    paper: bool,
    snapshot: &mut RiskSnapshot,
    report: &mut CycleReport,
) -> Result<(), EngineError> {
    let exchange = Exchange::parse(&row.exchange)
        .ok_or_else(|| EngineError::InvalidRow(format!("strategy {} has exchange {}", row.id, row.exchange)))?;
    let bar = BarContext { exchange, security_id: row.broker_security_id().to_owned() };
    let today = ctx.now.to_offset(ctx.settings.market.utc_offset).date();

    let candles = ctx
        .broker
        .intraday_candles(&bar.security_id, exchange, today, today)
        .await?;
    if candles.len() < MIN_CANDLES {
        tracing::debug!(strategy_id = row.id, symbol = %row.symbol, candles = candles.len(), "not enough candles");
        return Ok(());
    }

    let params = effective_params(row);
    let strategy = cache.get_or_build(row.id, &row.name, &params)?;
    let intents = strategy.on_bar(&row.symbol, &bar, &candles);
    if !intents.is_empty() {
        tracing::debug!(strategy_id = row.id, strategy = strategy.name(), intents = intents.len(), "intents emitted");
    }
    report.intents += intents.len();

    for intent in intents {
        let (intent, closes) = if intent.is_exit {
            let open = orders::find_open_entry(ctx.pool, Some(row.id), &intent.symbol).await?;
            let side = intent.side;
            let Some(exit) = match_exit(intent, open.as_ref()) else {
                report.blocked += 1;
                strategy.set_position(&row.symbol, None);
                tracing::warn!(strategy_id = row.id, symbol = %row.symbol, side = side.as_str(), "exit dropped: no open entry");
                event_log::record(
                    ctx.pool,
                    LogLevel::Warn,
                    LogSource::Engine,
                    &format!("Skipped exit {} {}: no open entry to close", side.as_str(), row.symbol),
                    Some(json!({ "strategy_id": row.id })),
                )
                .await;
                continue;
            };
            (exit, open)
        } else {
            (size_intent(intent, &params, snapshot.capital), None)
        };

        match risk::evaluate(risk_settings, snapshot, &intent) {
            RiskDecision::Block(reason) => {
                report.blocked += 1;
                tracing::info!(strategy_id = row.id, symbol = %intent.symbol, side = intent.side.as_str(), %reason, "intent blocked");
                event_log::record(
                    ctx.pool,
                    LogLevel::Warn,
                    LogSource::Engine,
                    &format!("Blocked {} {} {}: {reason}", intent.side.as_str(), intent.quantity, intent.symbol),
                    Some(json!({ "strategy_id": row.id })),
                )
                .await;
            }
            RiskDecision::Allow { quantity } => {
                let order = place(ctx, row, &intent, quantity, paper, closes.as_ref(), snapshot).await?;
                if order.status != OrderStatus::Rejected.as_str() {
                    report.placed += 1;
                    strategy.set_position(&intent.symbol, (!intent.is_exit).then_some(intent.side));
                }
            }
        }
    }
    Ok(())
}

/// Execute one gated intent and journal it.
async fn place(
    ctx: &CycleContext<'_>,
    row: &StrategyRow,
    intent: &TradeIntent,
    quantity: i32,
    paper: bool,
    closes: Option<&OpenEntry>,
    snapshot: &mut RiskSnapshot,
) -> Result<OrderRow, EngineError> {
    let local_now = ctx.now.to_offset(ctx.settings.market.utc_offset);
    let (status, dhan_order_id, broker_error) = if paper {
        (OrderStatus::Paper, Some(paper_order_id(local_now)), None)
    } else {
        let request = OrderRequest {
            security_id: intent.security_id.clone(),
            exchange: intent.exchange,
            side: intent.side,
            quantity,
            order_type: intent.order_type,
            product: intent.product,
            price: intent.price,
        };
        match ctx.broker.place_order(&request).await {
            Ok(ack) => (OrderStatus::Executed, Some(ack.order_id), None),
            Err(e) => (OrderStatus::Rejected, None, Some(e.to_string())),
        }
    };

    let notes = match &broker_error {
        Some(e) => format!("{} | broker error: {e}", intent.reason),
        None => intent.reason.clone(),
    };
    let order = orders::insert(
        ctx.pool,
        &NewOrder {
            strategy_id: Some(row.id),
            symbol: intent.symbol.clone(),
            exchange: intent.exchange.as_str().to_owned(),
            side: intent.side,
            quantity,
            order_type: intent.order_type.as_str().to_owned(),
            product: intent.product.as_str().to_owned(),
            price: Some(intent.price),
            sl: intent.sl,
            target: intent.target,
            status,
            dhan_order_id,
            is_paper: paper,
            is_exit: intent.is_exit,
            notes: Some(notes),
        },
    )
    .await?;

    let summary = format!(
        "{} {} {} @ {:.2} (strategy {})",
        intent.side.as_str(),
        quantity,
        intent.symbol,
        intent.price,
        row.id
    );
    if let Some(e) = broker_error {
        tracing::error!(strategy_id = row.id, order_id = order.id, error = %e, "live order rejected");
        event_log::record(
            ctx.pool,
            LogLevel::Error,
            LogSource::Dhan,
            &format!("Order error: {summary}: {e}"),
            Some(json!({ "order_id": order.id })),
        )
        .await;
        return Ok(order);
    }

    let (source, label) = if paper { (LogSource::Engine, "[PAPER]") } else { (LogSource::Dhan, "Order placed:") };
    tracing::info!(
        strategy_id = row.id,
        order_id = order.id,
        symbol = %intent.symbol,
        side = intent.side.as_str(),
        quantity,
        paper,
        "order filled"
    );
    event_log::record(
        ctx.pool,
        LogLevel::Info,
        source,
        &format!("{label} {summary}: {}", intent.reason),
        Some(json!({ "order_id": order.id, "is_exit": intent.is_exit })),
    )
    .await;

    match (intent.is_exit, closes) {
        (true, Some(entry)) => settle_exit(ctx, row, intent, &order, entry, snapshot).await?,
        (true, None) => tracing::warn!(strategy_id = row.id, order_id = order.id, "exit filled with no matched entry"),
        (false, _) => snapshot.open_positions += 1,
    }
    Ok(order)
}

/// Close the matched entry and book the round trip's P&L on the exit row.
async fn settle_exit(
    ctx: &CycleContext<'_>,
    row: &StrategyRow,
    intent: &TradeIntent,
    exit: &OrderRow,
    entry: &OpenEntry,
    snapshot: &mut RiskSnapshot,
) -> Result<(), EngineError> {
    if !orders::close_entry(ctx.pool, entry.id).await? {
        tracing::warn!(strategy_id = row.id, entry_id = entry.id, exit_id = exit.id, "entry already closed");
        return Ok(());
    }
    let pnl = round_trip_pnl(entry, intent.side, intent.price, exit.quantity);
    orders::set_pnl(ctx.pool, exit.id, pnl).await?;

    snapshot.open_positions = (snapshot.open_positions - 1).max(0);
    snapshot.realized_pnl_today += pnl;
    tracing::info!(strategy_id = row.id, entry_id = entry.id, exit_id = exit.id, pnl, "position closed");
    Ok(())
}

// =============================================================================
// SCHEDULER
// =============================================================================

struct RunningLoop {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Handle to the background cycle loop. Cheap to clone.
#[derive(Clone, Default)]
pub struct Scheduler {
    running: Arc<Mutex<Option<RunningLoop>>>,
    cycle_lock: Arc<Mutex<()>>,
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn the cycle loop.
    ///
    /// # Errors
    ///
    /// `AlreadyRunning` when a loop is alive.
    pub async fn start(&self, pool: PgPool, settings: Arc<Settings>) -> Result<(), EngineError> {
        let mut running = self.running.lock().await;
        if running.as_ref().is_some_and(|r| !r.handle.is_finished()) {
            return Err(EngineError::AlreadyRunning);
        }
        let (stop, stop_rx) = oneshot::channel();
        let cycle_second = settings.cycle_second;
        let handle = tokio::spawn(cycle_loop(pool, settings, self.cycle_lock.clone(), stop_rx));
        *running = Some(RunningLoop { stop, handle });
        tracing::info!(cycle_second, "strategy scheduler started");
        Ok(())
    }

    /// Signal the loop to exit. An in-flight cycle finishes first.
    ///
    /// # Errors
    ///
    /// `NotRunning` when no loop is alive.
    pub async fn stop(&self) -> Result<(), EngineError> {
        let mut running = self.running.lock().await;
        let Some(current) = running.take() else {
            return Err(EngineError::NotRunning);
        };
        if current.handle.is_finished() {
            return Err(EngineError::NotRunning);
        }
        // The receiver only disappears once the loop has exited on its own.
        let _ = current.stop.send(());
        tracing::info!("strategy scheduler stopping");
        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        self.running
            .lock()
            .await
            .as_ref()
            .is_some_and(|r| !r.handle.is_finished())
    }
}

async fn cycle_loop(
    pool: PgPool,
    settings: Arc<Settings>,
    cycle_lock: Arc<Mutex<()>>,
    mut stop: oneshot::Receiver<()>,
) {
    let mut cache = StrategyCache::default();
    loop {
        let delay = next_fire_delay(OffsetDateTime::now_utc(), settings.cycle_second);
        tokio::select! {
            _ = &mut stop => break,
            () = tokio::time::sleep(delay) => {}
        }

        let _cycle = cycle_lock.lock().await;
        match run_cycle(&pool, &settings, &mut cache, OffsetDateTime::now_utc()).await {
            Ok(report) => tracing::debug!(?report, "strategy cycle finished"),
            Err(e) => {
                tracing::error!(error = %e, "strategy cycle failed");
                event_log::record(&pool, LogLevel::Error, LogSource::Engine, &format!("Cycle failed: {e}"), None).await;
            }
        }
    }
    tracing::info!("strategy scheduler stopped");
}
