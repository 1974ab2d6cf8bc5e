//! Process settings parsed from environment variables.
//!
//! SYSTEM CONTEXT
//! ==============
//! `main` loads `.env` through `dotenvy`, then calls `Settings::from_env`
//! once. The resulting value is shared read-only through `AppState`.
//!
//! ERROR HANDLING
//! ==============
//! Only `DATABASE_URL` is required. Optional values that fail to parse fall
//! back to their defaults; combinations that cannot describe a trading
//! session (open after close, cycle second past 59) are rejected.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use time::{Time, UtcOffset};

use crate::services::dhan::DEFAULT_DHAN_BASE_URL;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_PAPER_CAPITAL: f64 = 100_000.0;
pub const DEFAULT_CYCLE_SECOND: u8 = 5;
pub const DEFAULT_DHAN_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DHAN_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Asia/Kolkata, which observes no daylight saving.
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 330;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("missing required env var {0}")]
    Missing(&'static str),

    #[error("invalid market hours: {0}")]
    MarketHours(String),

    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

// =============================================================================
// TYPES
// =============================================================================

/// Regular cash-market session in exchange-local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketHours {
    pub open: Time,
    pub close: Time,
    pub utc_offset: UtcOffset,
}

impl Default for MarketHours {
    fn default() -> Self {
        Self {
            open: Time::from_hms(9, 15, 0).unwrap_or(Time::MIDNIGHT),
            close: Time::from_hms(15, 30, 0).unwrap_or(Time::MIDNIGHT),
            utc_offset: UtcOffset::from_whole_seconds(DEFAULT_UTC_OFFSET_MINUTES * 60).unwrap_or(UtcOffset::UTC),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhanSettings {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for DhanSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_DHAN_BASE_URL.to_owned(),
            request_timeout_secs: DEFAULT_DHAN_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_DHAN_CONNECT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub database_url: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub market: MarketHours,
    /// Hard paper-only switch. When set, no order reaches the broker
    /// regardless of the database paper flag.
    pub paper_only: bool,
    pub paper_capital: f64,
    pub cycle_second: u8,
    pub dhan: DhanSettings,
    pub start_scheduler: bool,
}

impl Settings {
    /// Build settings from the process environment.
    ///
    /// Required:
    /// - `DATABASE_URL`
    ///
    /// Optional:
    /// - `PORT` (3000), `DB_MAX_CONNECTIONS` (5)
    /// - `MARKET_OPEN_HOUR`/`MARKET_OPEN_MINUTE` (9/15)
    /// - `MARKET_CLOSE_HOUR`/`MARKET_CLOSE_MINUTE` (15/30)
    /// - `MARKET_UTC_OFFSET_MINUTES` (330)
    /// - `PAPER_TRADING` (true), `PAPER_CAPITAL` (100000)
    /// - `STRATEGY_CYCLE_SECOND` (5)
    /// - `DHAN_BASE_URL`, `DHAN_REQUEST_TIMEOUT_SECS` (30), `DHAN_CONNECT_TIMEOUT_SECS` (10)
    /// - `START_SCHEDULER` (true)
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` when `DATABASE_URL` is unset or the market
    /// session is malformed.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// See [`Settings::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(SettingsError::Missing("DATABASE_URL"))?;

        let market = market_hours(&lookup)?;

        let cycle_second = parse_or(&lookup, "STRATEGY_CYCLE_SECOND", DEFAULT_CYCLE_SECOND);
        if cycle_second > 59 {
            return Err(SettingsError::Invalid {
                key: "STRATEGY_CYCLE_SECOND",
                reason: format!("{cycle_second} is not a second of the minute"),
            });
        }

        let paper_capital = parse_or(&lookup, "PAPER_CAPITAL", DEFAULT_PAPER_CAPITAL);
        let paper_capital =
            if paper_capital.is_finite() && paper_capital > 0.0 { paper_capital } else { DEFAULT_PAPER_CAPITAL };

        let dhan = DhanSettings {
            base_url: lookup("DHAN_BASE_URL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DHAN_BASE_URL.to_owned())
                .trim_end_matches('/')
                .to_owned(),
            request_timeout_secs: parse_or(&lookup, "DHAN_REQUEST_TIMEOUT_SECS", DEFAULT_DHAN_REQUEST_TIMEOUT_SECS),
            connect_timeout_secs: parse_or(&lookup, "DHAN_CONNECT_TIMEOUT_SECS", DEFAULT_DHAN_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self {
            database_url,
            port: parse_or(&lookup, "PORT", DEFAULT_PORT),
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS),
            market,
            paper_only: bool_or(&lookup, "PAPER_TRADING", true),
            paper_capital,
            cycle_second,
            dhan,
            start_scheduler: bool_or(&lookup, "START_SCHEDULER", true),
        })
    }
}

// =============================================================================
// PARSING
// =============================================================================

fn market_hours(lookup: &impl Fn(&str) -> Option<String>) -> Result<MarketHours, SettingsError> {
    let open_hour: u8 = parse_or(lookup, "MARKET_OPEN_HOUR", 9);
    let open_minute: u8 = parse_or(lookup, "MARKET_OPEN_MINUTE", 15);
    let close_hour: u8 = parse_or(lookup, "MARKET_CLOSE_HOUR", 15);
    let close_minute: u8 = parse_or(lookup, "MARKET_CLOSE_MINUTE", 30);
    let offset_minutes: i32 = parse_or(lookup, "MARKET_UTC_OFFSET_MINUTES", DEFAULT_UTC_OFFSET_MINUTES);

    let open = Time::from_hms(open_hour, open_minute, 0)
        .map_err(|e| SettingsError::MarketHours(format!("open {open_hour}:{open_minute}: {e}")))?;
    let close = Time::from_hms(close_hour, close_minute, 0)
        .map_err(|e| SettingsError::MarketHours(format!("close {close_hour}:{close_minute}: {e}")))?;
    if open >= close {
        return Err(SettingsError::MarketHours(format!("open {open} is not before close {close}")));
    }
    let utc_offset = UtcOffset::from_whole_seconds(offset_minutes.saturating_mul(60))
        .map_err(|e| SettingsError::MarketHours(format!("utc offset {offset_minutes}m: {e}")))?;

    Ok(MarketHours { open, close, utc_offset })
}

fn parse_or<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn bool_or(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    lookup(key).as_deref().and_then(parse_bool).unwrap_or(default)
}

/// Parse the usual truthy/falsy spellings, case-insensitive.
#[must_use]
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
