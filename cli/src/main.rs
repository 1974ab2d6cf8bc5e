//! Command-line client for the terminal's JSON API.
//!
//! Every subcommand maps onto one `/api` call and prints the response as
//! pretty JSON. Non-2xx responses become errors carrying the server's
//! `detail` message.


use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned HTTP {status}: {detail}")]
    Server { status: u16, detail: String },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("nothing to update; pass at least one field")]
    EmptyUpdate,
}

#[derive(Parser, Debug)]
#[command(name = "dhan-cli", about = "Dhan Algo Terminal API CLI")]
struct Cli {
    #[arg(long, env = "TERMINAL_BASE_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone)]
struct CliContext {
    base_url: String,
    timeout: Duration,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check `/health`.
    Ping,
    /// System status flags.
    Status,
    /// Today's realized P&L.
    Pnl,
    /// Order history, newest first.
    Orders {
        #[arg(long, default_value_t = 50)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        skip: u32,
    },
    Strategies(StrategiesCommand),
    Control(ControlCommand),
    Config(ConfigCommand),
}

#[derive(Args, Debug)]
struct StrategiesCommand {
    #[command(subcommand)]
    command: StrategiesSubcommand,
}

#[derive(Subcommand, Debug)]
enum StrategiesSubcommand {
    List,
    Available,
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        symbol: String,
        #[arg(long, default_value = "NSE")]
        exchange: String,
        #[arg(long)]
        security_id: Option<String>,
        #[arg(long, default_value_t = 1)]
        quantity: i32,
        /// Strategy parameters as a JSON object.
        #[arg(long)]
        params: Option<String>,
    },
    Toggle {
        id: i64,
    },
    Delete {
        id: i64,
    },
}

#[derive(Args, Debug)]
struct ControlCommand {
    #[command(subcommand)]
    command: ControlSubcommand,
}

#[derive(Subcommand, Debug)]
enum ControlSubcommand {
    /// Deactivate all strategies, disable trading, stop the scheduler.
    KillSwitch,
    Start,
    Stop,
    Status,
    ResetPnl,
    TogglePaper,
    /// Show risk limits, or update them when any flag is given.
    Risk {
        #[arg(long)]
        max_daily_loss_pct: Option<f64>,
        #[arg(long)]
        max_positions: Option<i32>,
        #[arg(long)]
        max_capital_per_trade_pct: Option<f64>,
    },
}

#[derive(Args, Debug)]
struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Subcommand, Debug)]
enum ConfigSubcommand {
    Show,
    Set {
        #[arg(long)]
        client_id: String,
        #[arg(long, env = "DHAN_ACCESS_TOKEN")]
        access_token: String,
        #[arg(long)]
        paper_trade: Option<bool>,
    },
    Test,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let ctx = CliContext { base_url: cli.base_url, timeout: Duration::from_secs(cli.timeout) };
    let (method, path, body) = plan(cli.command)?;
    let json = api_request(&ctx, method, &path, body).await?;
    print_json(&json)
}

/// Resolve a command to the HTTP call it performs.
fn plan(command: Command) -> Result<(reqwest::Method, String, Option<Value>), CliError> {
    use reqwest::Method;

    let call = match command {
        Command::Ping => (Method::GET, "/health".to_owned(), None),
        Command::Status => (Method::GET, "/api/dashboard/status".to_owned(), None),
        Command::Pnl => (Method::GET, "/api/dashboard/pnl".to_owned(), None),
        Command::Orders { limit, skip } => {
            (Method::GET, format!("/api/dashboard/orders?limit={limit}&skip={skip}"), None)
        }
        Command::Strategies(cmd) => match cmd.command {
            StrategiesSubcommand::List => (Method::GET, "/api/strategies".to_owned(), None),
            StrategiesSubcommand::Available => (Method::GET, "/api/strategies/available".to_owned(), None),
            StrategiesSubcommand::Create { name, symbol, exchange, security_id, quantity, params } => {
                let params = match params {
                    Some(raw) => serde_json::from_str::<Value>(&raw)?,
                    None => Value::Object(Map::new()),
                };
                let mut body = serde_json::json!({
                    "name": name,
                    "symbol": symbol,
                    "exchange": exchange,
                    "quantity": quantity,
                    "params": params,
                });
                if let (Some(id), Some(map)) = (security_id, body.as_object_mut()) {
                    map.insert("security_id".to_owned(), Value::String(id));
                }
                (Method::POST, "/api/strategies".to_owned(), Some(body))
            }
            StrategiesSubcommand::Toggle { id } => (Method::POST, format!("/api/strategies/{id}/toggle"), None),
            StrategiesSubcommand::Delete { id } => (Method::DELETE, format!("/api/strategies/{id}"), None),
        },
        Command::Control(cmd) => match cmd.command {
            ControlSubcommand::KillSwitch => (Method::POST, "/api/control/kill-switch".to_owned(), None),
            ControlSubcommand::Start => (Method::POST, "/api/control/start-scheduler".to_owned(), None),
            ControlSubcommand::Stop => (Method::POST, "/api/control/stop-scheduler".to_owned(), None),
            ControlSubcommand::Status => (Method::GET, "/api/control/scheduler-status".to_owned(), None),
            ControlSubcommand::ResetPnl => (Method::POST, "/api/control/reset-daily-pnl".to_owned(), None),
            ControlSubcommand::TogglePaper => (Method::POST, "/api/control/toggle-paper-trade".to_owned(), None),
            ControlSubcommand::Risk { max_daily_loss_pct, max_positions, max_capital_per_trade_pct } => {
                match risk_body(max_daily_loss_pct, max_positions, max_capital_per_trade_pct) {
                    Ok(body) => (Method::PUT, "/api/control/risk-settings".to_owned(), Some(body)),
                    Err(CliError::EmptyUpdate) => (Method::GET, "/api/control/risk-settings".to_owned(), None),
                    Err(e) => return Err(e),
                }
            }
        },
        Command::Config(cmd) => match cmd.command {
            ConfigSubcommand::Show => (Method::GET, "/api/config".to_owned(), None),
            ConfigSubcommand::Set { client_id, access_token, paper_trade } => {
                let mut body = Map::new();
                body.insert("client_id".to_owned(), Value::String(client_id));
                body.insert("access_token".to_owned(), Value::String(access_token));
                if let Some(paper) = paper_trade {
                    body.insert("paper_trade".to_owned(), Value::Bool(paper));
                }
                (Method::POST, "/api/config".to_owned(), Some(Value::Object(body)))
            }
            ConfigSubcommand::Test => (Method::GET, "/api/config/test-connection".to_owned(), None),
        },
    };
    Ok(call)
}

fn risk_body(
    max_daily_loss_pct: Option<f64>,
    max_positions: Option<i32>,
    max_capital_per_trade_pct: Option<f64>,
) -> Result<Value, CliError> {
    let mut body = Map::new();
    if let Some(pct) = max_daily_loss_pct {
        body.insert("max_daily_loss_pct".to_owned(), serde_json::json!(pct));
    }
    if let Some(n) = max_positions {
        body.insert("max_positions".to_owned(), serde_json::json!(n));
    }
    if let Some(pct) = max_capital_per_trade_pct {
        body.insert("max_capital_per_trade_pct".to_owned(), serde_json::json!(pct));
    }
    if body.is_empty() {
        return Err(CliError::EmptyUpdate);
    }
    Ok(Value::Object(body))
}

async fn api_request(
    cli: &CliContext,
    method: reqwest::Method,
    path: &str,
    body: Option<Value>,
) -> Result<Value, CliError> {
    let client = reqwest::Client::builder().timeout(cli.timeout).build()?;
    let url = format!("{}{}", cli.base_url.trim_end_matches('/'), path);

    let request = client.request(method, &url);
    let request = if let Some(json) = body { request.json(&json) } else { request };

    let response = request.send().await?;
    let status = response.status();
    let value = response.json::<Value>().await.unwrap_or(Value::Null);

    if !status.is_success() {
        return Err(CliError::Server { status: status.as_u16(), detail: error_detail(&value) });
    }

    Ok(value)
}

/// The server's `detail` string, or the whole body when it has none.
fn error_detail(value: &Value) -> String {
    match value.get("detail").and_then(Value::as_str) {
        Some(detail) => detail.to_owned(),
        None if value.is_null() => "no response body".to_owned(),
        None => value.to_string(),
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
