//! Dhan HQ v2 REST client.
//!
//! SYSTEM CONTEXT
//! ==============
//! The scheduler reads intraday candles and places orders through the
//! `Broker` trait; dashboard routes read funds, positions, and holdings.
//! `DhanClient` is the only implementation that talks HTTP. Tests substitute
//! their own `Broker` so no network is needed.
//!
//! ERROR HANDLING
//! ==============
//! Transport failures, non-2xx statuses, and unparseable bodies are kept
//! apart in `DhanError` so callers can decide between "broker said no" and
//! "broker unreachable". Response parsing is pure and unit-tested.

#[cfg(test)]
#[path = "dhan_test.rs"]
mod dhan_test;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use sqlx::PgPool;
use time::Date;

use crate::config::DhanSettings;
use crate::domain::{Candle, Exchange, OrderType, ProductType, Side};

pub const DEFAULT_DHAN_BASE_URL: &str = "https://api.dhan.co/v2";

#[derive(Debug, thiserror::Error)]
pub enum DhanError {
    #[error("Dhan not configured")]
    NotConfigured,

    #[error("Dhan request failed: {0}")]
    Request(String),

    #[error("Dhan API error: status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Dhan response parse failed: {0}")]
    Parse(String),

    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhanCredentials {
    pub client_id: String,
    pub access_token: String,
}

impl DhanCredentials {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.client_id.trim().is_empty() && !self.access_token.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub security_id: String,
    pub exchange: Exchange,
    pub side: Side,
    pub quantity: i32,
    pub order_type: OrderType,
    pub product: ProductType,
    /// Only sent for limit orders; market orders go out at 0.
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderAck {
    pub order_id: String,
    pub status: Option<String>,
}

/// Cash balances extracted from `/fundlimit`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FundSummary {
    pub available_balance: f64,
    pub used_margin: f64,
}

// =============================================================================
// BROKER TRAIT
// =============================================================================

#[async_trait]
pub trait Broker: Send + Sync {
    async fn fund_limits(&self) -> Result<Value, DhanError>;
    async fn positions(&self) -> Result<Vec<Value>, DhanError>;
    async fn holdings(&self) -> Result<Vec<Value>, DhanError>;
    async fn order_list(&self) -> Result<Vec<Value>, DhanError>;
    async fn place_order(&self, order: &OrderRequest) -> Result<OrderAck, DhanError>;
    /// One-minute candles for an equity between two calendar dates.
    async fn intraday_candles(
        &self,
        security_id: &str,
        exchange: Exchange,
        from: Date,
        to: Date,
    ) -> Result<Vec<Candle>, DhanError>;
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct DhanClient {
    http: reqwest::Client,
    base_url: String,
    credentials: DhanCredentials,
}

impl DhanClient {
    /// Build a client for the given credentials.
    ///
    /// # Errors
    ///
    /// `NotConfigured` when either credential is blank; `HttpClientBuild`
    /// if the TLS stack cannot be initialized.
    pub fn new(settings: &DhanSettings, credentials: DhanCredentials) -> Result<Self, DhanError> {
        if !credentials.is_complete() {
            return Err(DhanError::NotConfigured);
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .build()
            .map_err(|e| DhanError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: settings.base_url.trim_end_matches('/').to_owned(), credentials })
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value, DhanError> {
        let response = request
            .header("access-token", &self.credentials.access_token)
            .header("client-id", &self.credentials.client_id)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| DhanError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| DhanError::Request(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(DhanError::Status { status, body: text });
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| DhanError::Parse(e.to_string()))
    }

    async fn get(&self, path: &str) -> Result<Value, DhanError> {
        self.send(self.http.get(format!("{}{path}", self.base_url))).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, DhanError> {
        self.send(self.http.post(format!("{}{path}", self.base_url)).json(body))
            .await
    }
}

#[async_trait]
impl Broker for DhanClient {
    async fn fund_limits(&self) -> Result<Value, DhanError> {
        self.get("/fundlimit").await
    }

    async fn positions(&self) -> Result<Vec<Value>, DhanError> {
        self.get("/positions").await.map(extract_list)
    }

    async fn holdings(&self) -> Result<Vec<Value>, DhanError> {
        self.get("/holdings").await.map(extract_list)
    }

    async fn order_list(&self) -> Result<Vec<Value>, DhanError> {
        self.get("/orders").await.map(extract_list)
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<OrderAck, DhanError> {
        let body = order_body(&self.credentials.client_id, order);
        let response = self.post("/orders", &body).await?;
        parse_order_ack(&response)
    }

    async fn intraday_candles(
        &self,
        security_id: &str,
        exchange: Exchange,
        from: Date,
        to: Date,
    ) -> Result<Vec<Candle>, DhanError> {
        let body = intraday_body(security_id, exchange, from, to);
        let response = self.post("/charts/intraday", &body).await?;
        parse_candles(&response)
    }
}

/// Load stored credentials and build a live client.
///
/// # Errors
///
/// `NotConfigured` when no credentials are stored.
pub async fn connect(pool: &PgPool, settings: &DhanSettings) -> Result<DhanClient, DhanError> {
    let credentials = super::config::credentials(pool)
        .await?
        .ok_or(DhanError::NotConfigured)?;
    DhanClient::new(settings, credentials)
}

// =============================================================================
// WIRE FORMAT
// =============================================================================

#[must_use]
pub fn order_body(client_id: &str, order: &OrderRequest) -> Value {
    let price = match order.order_type {
        OrderType::Limit => order.price,
        OrderType::Market => 0.0,
    };
    json!({
        "dhanClientId": client_id,
        "transactionType": order.side.as_str(),
        "exchangeSegment": order.exchange.equity_segment(),
        "productType": order.product.as_str(),
        "orderType": order.order_type.as_str(),
        "validity": "DAY",
        "securityId": order.security_id,
        "quantity": order.quantity,
        "price": price,
    })
}

#[must_use]
pub fn intraday_body(security_id: &str, exchange: Exchange, from: Date, to: Date) -> Value {
    json!({
        "securityId": security_id,
        "exchangeSegment": exchange.equity_segment(),
        "instrument": "EQUITY",
        "interval": "1",
        "oi": false,
        "fromDate": from.to_string(),
        "toDate": to.to_string(),
    })
}

/// Accept either a bare array or `{ "data": [...] }`.
#[must_use]
pub fn extract_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Read an order id out of a place-order response.
///
/// # Errors
///
/// `Parse` when the body carries no order id.
pub fn parse_order_ack(value: &Value) -> Result<OrderAck, DhanError> {
    let body = value.get("data").filter(|d| d.is_object()).unwrap_or(value);
    let order_id = match body.get("orderId") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(DhanError::Parse(format!("missing orderId in {value}"))),
    };
    let status = body
        .get("orderStatus")
        .and_then(Value::as_str)
        .map(str::to_owned);
    Ok(OrderAck { order_id, status })
}

/// Pull available and utilized cash out of a `/fundlimit` body.
///
/// Dhan spells the balance field `availabelBalance`; the corrected spelling
/// is accepted as well.
#[must_use]
pub fn parse_funds(value: &Value) -> FundSummary {
    let body = value.get("data").filter(|d| d.is_object()).unwrap_or(value);
    let field = |keys: &[&str]| keys.iter().find_map(|k| body.get(*k).and_then(as_number)).unwrap_or(0.0);
    FundSummary {
        available_balance: field(&["availabelBalance", "availableBalance"]),
        used_margin: field(&["utilizedAmount", "usedMargin"]),
    }
}

/// Parse candles from the columnar chart payload or a list of row objects.
///
/// Rows without a finite close are dropped.
///
/// # Errors
///
/// `Parse` when the payload is neither shape.
pub fn parse_candles(value: &Value) -> Result<Vec<Candle>, DhanError> {
    let body = match value.get("data") {
        Some(inner @ (Value::Object(_) | Value::Array(_))) => inner,
        _ => value,
    };

    match body {
        Value::Object(map) if map.contains_key("close") => {
            let column = |key: &str| -> Vec<Option<f64>> {
                map.get(key)
                    .and_then(Value::as_array)
                    .map(|items| items.iter().map(as_number).collect())
                    .unwrap_or_default()
            };
            let closes = column("close");
            let opens = column("open");
            let highs = column("high");
            let lows = column("low");
            let volumes = column("volume");
            let timestamps = column("timestamp");

            Ok(closes
                .iter()
                .enumerate()
                .filter_map(|(i, close)| {
                    let close = close.filter(|c| c.is_finite())?;
                    let at = |col: &[Option<f64>]| col.get(i).copied().flatten();
                    Some(Candle {
                        timestamp: at(&timestamps).map(epoch_seconds),
                        open: at(&opens).unwrap_or(close),
                        high: at(&highs).unwrap_or(close),
                        low: at(&lows).unwrap_or(close),
                        close,
                        volume: at(&volumes).unwrap_or(0.0),
                    })
                })
                .collect())
        }
        Value::Array(rows) => Ok(rows
            .iter()
            .filter_map(|row| {
                let close = row.get("close").and_then(as_number).filter(|c| c.is_finite())?;
                let get = |key: &str| row.get(key).and_then(as_number);
                Some(Candle {
                    timestamp: get("timestamp").or_else(|| get("start_Time")).map(epoch_seconds),
                    open: get("open").unwrap_or(close),
                    high: get("high").unwrap_or(close),
                    low: get("low").unwrap_or(close),
                    close,
                    volume: get("volume").unwrap_or(0.0),
                })
            })
            .collect()),
        Value::Object(map) if map.is_empty() => Ok(Vec::new()),
        other => Err(DhanError::Parse(format!("unexpected candle payload: {}", truncate(&other.to_string())))),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn epoch_seconds(raw: f64) -> i64 {
    raw as i64
}

fn truncate(text: &str) -> String {
    const MAX: usize = 200;
    match text.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_owned(),
    }
}
