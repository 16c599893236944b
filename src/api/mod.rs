// Market data sources
// The analysis core only sees `CandleSeries`; fetching is behind `CandleSource`

pub mod binance;

pub use binance::BinanceClient;

use crate::error::AnalysisError;
use crate::models::{CandleSeries, Timeframe};
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised while fetching candles
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network failure, timeout or body decoding error
    #[error("API request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-retryable HTTP status (4xx) or a 5xx / 429 that outlived every retry
    #[error("API error ({status}): {body}")]
    Status { status: u16, body: String },

    /// The response parsed as JSON but not in the expected shape
    #[error("Unexpected response: {0}")]
    Parse(String),

    /// The request was rejected before being sent
    #[error("Invalid request: {0}")]
    Validation(String),

    /// The exchange returned candles that fail series validation
    #[error("Invalid candle data: {0}")]
    Candles(#[from] AnalysisError),
}

/// Anything that can supply OHLCV history, oldest candle first
#[async_trait]
pub trait CandleSource: Send + Sync {
    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<CandleSeries, ApiError>;
}

/// Normalize a pair to exchange notation: "sol/usdt", "SOL/USDT:USDT" and
/// "SOL-USDT" all become "SOLUSDT"
pub fn normalize_symbol(symbol: &str) -> String {
    let pair = symbol.trim();
    // Unified futures notation carries the settle currency after ':'
    let pair = pair.split(':').next().unwrap_or(pair);
    pair.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_uppercase()
}
