// Tool registry for the agent layer
// A model picks a tool by name with JSON arguments; `ToolCall::parse` turns
// that into a closed enum and `ToolExecutor` runs it against a candle source

pub mod orders;

pub use orders::{DryRunOrderSink, OrderRequest, OrderSink};

use crate::api::{normalize_symbol, ApiError, CandleSource};
use crate::config::AppConfig;
use crate::error::AnalysisError;
use crate::levels::{LevelCalculator, OrderSide, TradeLevels};
use crate::models::Timeframe;
use crate::report::{analyze, AnalysisConfig, AnalysisReport};
use crate::structure::{classify_market_structure, detect_swing_points};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// `get_ticker` always returns this many candles
pub const TICKER_CANDLES: usize = 100;

/// `calculate_market_structure` uses immediate neighbours only
const QUICK_STRUCTURE_LOOKBACK: usize = 1;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Source(#[from] ApiError),

    #[error("order rejected: {0}")]
    Order(String),

    #[error("failed to encode tool result: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnalysisArgs {
    pub symbol: String,
    #[serde(default)]
    pub timeframe: Option<Timeframe>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TickerArgs {
    pub symbol: String,
    #[serde(default)]
    pub timeframe: Option<Timeframe>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateOrderArgs {
    pub symbol: String,
    #[serde(deserialize_with = "side_from_str")]
    pub side: OrderSide,
    #[serde(deserialize_with = "number_or_string")]
    pub entry: f64,
    #[serde(deserialize_with = "number_or_string")]
    pub stop_loss: f64,
    #[serde(deserialize_with = "number_or_string")]
    pub take_profit: f64,
}

/// Models send prices either as JSON numbers or as numeric strings
fn number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Price {
        Number(f64),
        Text(String),
    }

    match Price::deserialize(deserializer)? {
        Price::Number(n) => Ok(n),
        Price::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("expected a price, got {:?}", s))),
    }
}

fn side_from_str<'de, D: Deserializer<'de>>(deserializer: D) -> Result<OrderSide, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(de::Error::custom)
}

/// A parsed tool invocation
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    SmcAnalysis(AnalysisArgs),
    CalculateMarketStructure(AnalysisArgs),
    GetTicker(TickerArgs),
    CreateOrder(CreateOrderArgs),
}

impl ToolCall {
    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::SmcAnalysis(_) => "smc_analysis",
            ToolCall::CalculateMarketStructure(_) => "calculate_market_structure",
            ToolCall::GetTicker(_) => "get_ticker",
            ToolCall::CreateOrder(_) => "create_order",
        }
    }

    /// Resolve a tool name and its JSON arguments
    pub fn parse(name: &str, arguments: &Value) -> Result<Self, ToolError> {
        match name {
            "smc_analysis" => Ok(ToolCall::SmcAnalysis(parse_args(name, arguments)?)),
            "calculate_market_structure" => Ok(ToolCall::CalculateMarketStructure(parse_args(
                name, arguments,
            )?)),
            "get_ticker" => Ok(ToolCall::GetTicker(parse_args(name, arguments)?)),
            "create_order" => Ok(ToolCall::CreateOrder(parse_args(name, arguments)?)),
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }
}

fn parse_args<T: for<'de> Deserialize<'de>>(tool: &str, arguments: &Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments.clone()).map_err(|e| ToolError::InvalidArguments {
        tool: tool.to_string(),
        message: e.to_string(),
    })
}

#[derive(Serialize)]
struct SmcAnalysisResult<'a> {
    symbol: String,
    timeframe: Timeframe,
    #[serde(flatten)]
    report: &'a AnalysisReport,
    trade_levels: Option<TradeLevels>,
}

/// Runs tool calls against a candle source and an order sink
pub struct ToolExecutor<S: CandleSource, O: OrderSink> {
    source: S,
    orders: O,
    analysis: AnalysisConfig,
    levels: LevelCalculator,
    default_timeframe: Timeframe,
    default_limit: usize,
}

impl<S: CandleSource, O: OrderSink> ToolExecutor<S, O> {
    pub fn new(source: S, orders: O) -> Self {
        Self::with_config(source, orders, &AppConfig::default())
    }

    pub fn with_config(source: S, orders: O, config: &AppConfig) -> Self {
        Self {
            source,
            orders,
            analysis: config.analysis.clone(),
            levels: config.levels,
            default_timeframe: config.default_timeframe,
            default_limit: config.default_limit,
        }
    }

    /// Parse and run in one step
    pub async fn execute_named(&self, name: &str, arguments: &Value) -> Result<Value, ToolError> {
        let call = ToolCall::parse(name, arguments)?;
        self.execute(&call).await
    }

    pub async fn execute(&self, call: &ToolCall) -> Result<Value, ToolError> {
        tracing::debug!("Executing tool {}", call.name());

        match call {
            ToolCall::SmcAnalysis(args) => self.smc_analysis(args).await,
            ToolCall::CalculateMarketStructure(args) => self.market_structure(args).await,
            ToolCall::GetTicker(args) => self.ticker(args).await,
            ToolCall::CreateOrder(args) => self.create_order(args).await,
        }
    }

    async fn smc_analysis(&self, args: &AnalysisArgs) -> Result<Value, ToolError> {
        let timeframe = args.timeframe.unwrap_or(self.default_timeframe);
        let limit = args.limit.unwrap_or(self.default_limit);

        let series = self
            .source
            .fetch_candles(&args.symbol, timeframe, limit)
            .await?;
        let report = analyze(&series, &self.analysis)?;

        // A directionless trend is a normal outcome here, not a failure
        let trade_levels = match report.trade_levels(&self.levels) {
            Ok(levels) => Some(levels),
            Err(AnalysisError::NoSetup(_)) => None,
            Err(e) => return Err(e.into()),
        };

        Ok(serde_json::to_value(SmcAnalysisResult {
            symbol: normalize_symbol(&args.symbol),
            timeframe,
            report: &report,
            trade_levels,
        })?)
    }

    async fn market_structure(&self, args: &AnalysisArgs) -> Result<Value, ToolError> {
        let timeframe = args.timeframe.unwrap_or(self.default_timeframe);
        let limit = args.limit.unwrap_or(self.default_limit);

        let series = self
            .source
            .fetch_candles(&args.symbol, timeframe, limit)
            .await?;
        let swings = detect_swing_points(&series, QUICK_STRUCTURE_LOOKBACK)?;

        Ok(json!({
            "symbol": normalize_symbol(&args.symbol),
            "timeframe": timeframe,
            "structure": classify_market_structure(&swings),
            "swing_highs": swings.highs,
            "swing_lows": swings.lows,
        }))
    }

    async fn ticker(&self, args: &TickerArgs) -> Result<Value, ToolError> {
        let timeframe = args.timeframe.unwrap_or(self.default_timeframe);

        let series = self
            .source
            .fetch_candles(&args.symbol, timeframe, TICKER_CANDLES)
            .await?;

        let rows: Vec<Value> = series
            .candles()
            .iter()
            .map(|c| json!([c.timestamp, c.open, c.high, c.low, c.close, c.volume]))
            .collect();

        Ok(json!({
            "symbol": normalize_symbol(&args.symbol),
            "timeframe": timeframe,
            "candles": rows,
        }))
    }

    async fn create_order(&self, args: &CreateOrderArgs) -> Result<Value, ToolError> {
        let request = OrderRequest {
            symbol: normalize_symbol(&args.symbol),
            side: args.side,
            entry: args.entry,
            stop_loss: args.stop_loss,
            take_profit: args.take_profit,
        };

        if request.symbol.is_empty() {
            return Err(ToolError::Order("symbol is empty".to_string()));
        }
        request.validate().map_err(ToolError::Order)?;

        self.orders
            .place_order(&request)
            .await
            .map_err(|e| ToolError::Order(e.to_string()))
    }
}

/// Function declarations (name, description, JSON-schema parameters) to
/// advertise to the model
pub fn tool_declarations() -> Vec<Value> {
    let symbol = json!({
        "type": "string",
        "description": "The trading pair symbol (e.g., 'SOLUSDT')."
    });
    let timeframe = json!({
        "type": "string",
        "description": "The candle timeframe (e.g., 1h, 2h, 4h).",
        "default": "1h"
    });
    let limit = json!({
        "type": "integer",
        "description": "Number of candles to fetch for analysis.",
        "default": 100
    });
    let price = |what: &str| {
        json!({
            "type": "string",
            "description": format!("{} price for the trade. Number or numeric string.", what)
        })
    };

    vec![
        json!({
            "name": "smc_analysis",
            "description": "Perform Smart Money Concept analysis on live candles for a symbol and timeframe.",
            "parameters": {
                "type": "object",
                "properties": { "symbol": symbol, "timeframe": timeframe, "limit": limit },
                "required": ["symbol", "timeframe"]
            }
        }),
        json!({
            "name": "calculate_market_structure",
            "description": "Classify recent market structure (trend, breakout or consolidation) from swing highs and lows.",
            "parameters": {
                "type": "object",
                "properties": { "symbol": symbol, "timeframe": timeframe, "limit": limit },
                "required": ["symbol"]
            }
        }),
        json!({
            "name": "get_ticker",
            "description": format!("Fetch the last {} OHLCV candles for a symbol.", TICKER_CANDLES),
            "parameters": {
                "type": "object",
                "properties": { "symbol": symbol, "timeframe": timeframe },
                "required": ["symbol"]
            }
        }),
        json!({
            "name": "create_order",
            "description": "Save a trade setup with entry, stop loss, and take profit.",
            "parameters": {
                "type": "object",
                "properties": {
                    "symbol": symbol,
                    "side": {
                        "type": "string",
                        "description": "Type of order (e.g., 'BUY', 'SELL')."
                    },
                    "entry": { "type": "number", "description": "Entry price for the trade." },
                    "stop_loss": price("Stop loss"),
                    "take_profit": price("Take profit")
                },
                "required": ["symbol", "side", "entry", "take_profit", "stop_loss"]
            }
        }),
    ]
}
