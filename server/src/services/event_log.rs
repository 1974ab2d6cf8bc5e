//! Operator-facing event journal.
//!
//! Trading decisions (signals, blocks, fills, broker errors) are written to
//! `event_log` so the dashboard can show them. Writing is best effort: a
//! failed insert is reported through `tracing` and otherwise ignored, so
//! journaling can never break an order flow.

#[cfg(test)]
#[path = "event_log_test.rs"]
mod event_log_test;

use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;
use time::OffsetDateTime;

pub const DEFAULT_RECENT_LIMIT: i64 = 100;
pub const MAX_RECENT_LIMIT: i64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSource {
    Engine,
    Api,
    Strategy,
    Dhan,
}

impl LogSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Engine => "ENGINE",
            Self::Api => "API",
            Self::Strategy => "STRATEGY",
            Self::Dhan => "DHAN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct EventRow {
    pub id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub level: String,
    pub source: String,
    pub message: String,
    pub extra: Option<sqlx::types::Json<Value>>,
}

/// Append one event. Never fails the caller.
pub async fn record(pool: &PgPool, level: LogLevel, source: LogSource, message: &str, extra: Option<Value>) {
    let result = sqlx::query("INSERT INTO event_log (level, source, message, extra) VALUES ($1, $2, $3, $4)")
        .bind(level.as_str())
        .bind(source.as_str())
        .bind(message)
        .bind(extra.map(sqlx::types::Json))
        .execute(pool)
        .await;
    if let Err(e) = result {
        tracing::error!(error = %e, level = level.as_str(), source = source.as_str(), message, "event log write failed");
    }
}

/// Newest first.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn recent(pool: &PgPool, limit: Option<i64>) -> Result<Vec<EventRow>, sqlx::Error> {
    let limit = limit.unwrap_or(DEFAULT_RECENT_LIMIT).clamp(1, MAX_RECENT_LIMIT);
    sqlx::query_as::<_, EventRow>(
        "SELECT id, created_at, level, source, message, extra FROM event_log ORDER BY created_at DESC, id DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}
