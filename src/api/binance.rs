use crate::api::{normalize_symbol, ApiError, CandleSource};
use crate::config::AppConfig;
use crate::models::{Candle, CandleSeries, Timeframe};
use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use tokio::time::{sleep, Duration};

/// Binance USD-M futures caps a klines page at 1500 candles
pub const MAX_KLINES_PER_REQUEST: usize = 1500;

// Type alias for the rate limiter to simplify signatures
type BinanceRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Binance USD-M futures public market data client
///
/// Cloneable; all clones share one rate limiter.
#[derive(Clone)]
pub struct BinanceClient {
    client: Client,
    base_url: String,
    max_retries: u32,
    retry_backoff_ms: u64,
    rate_limiter: Arc<BinanceRateLimiter>,
}

impl BinanceClient {
    /// Client against the public futures endpoint with default settings
    pub fn new() -> Result<Self, ApiError> {
        Self::from_config(&AppConfig::default())
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        let rpm = NonZeroU32::new(config.rate_limit_per_minute).ok_or_else(|| {
            ApiError::Validation("rate_limit_per_minute must be at least 1".to_string())
        })?;
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_minute(rpm)));

        Ok(Self {
            client,
            base_url: config.binance_base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries.max(1),
            retry_backoff_ms: config.retry_backoff_ms,
            rate_limiter,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make a rate-limited GET request with retry logic
    ///
    /// 429 and 5xx responses and network errors are retried with exponential
    /// backoff; other 4xx responses fail immediately.
    async fn make_request(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}{}", self.base_url, path);

        for attempt in 1..=self.max_retries {
            // Wait for rate limiter
            self.rate_limiter.until_ready().await;

            let backoff_ms = self.retry_backoff_ms * 2_u64.pow(attempt - 1);
            let last_attempt = attempt == self.max_retries;

            match self.client.get(&url).query(query).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return Ok(response);
                    }

                    let retryable = status.as_u16() == 429 || status.is_server_error();
                    if retryable && !last_attempt {
                        tracing::warn!(
                            "Binance returned {} for {}, retrying in {}ms (attempt {}/{})",
                            status,
                            path,
                            backoff_ms,
                            attempt,
                            self.max_retries
                        );
                        sleep(Duration::from_millis(backoff_ms)).await;
                        continue;
                    }

                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    return Err(ApiError::Status {
                        status: status.as_u16(),
                        body,
                    });
                }
                Err(e) if !last_attempt => {
                    tracing::warn!(
                        "Network error: {}, retrying in {}ms (attempt {}/{})",
                        e,
                        backoff_ms,
                        attempt,
                        self.max_retries
                    );
                    sleep(Duration::from_millis(backoff_ms)).await;
                }
                Err(e) => return Err(ApiError::Request(e)),
            }
        }

        Err(ApiError::Validation(format!(
            "no request attempted (max_retries = {})",
            self.max_retries
        )))
    }

    /// Get klines (candles), oldest first
    /// Endpoint: GET /fapi/v1/klines?symbol={symbol}&interval={interval}&limit={limit}
    pub async fn get_klines(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, ApiError> {
        if limit == 0 || limit > MAX_KLINES_PER_REQUEST {
            return Err(ApiError::Validation(format!(
                "limit must be between 1 and {}, got {}",
                MAX_KLINES_PER_REQUEST, limit
            )));
        }

        let symbol = normalize_symbol(symbol);
        if symbol.is_empty() {
            return Err(ApiError::Validation("symbol is empty".to_string()));
        }

        let query = [
            ("symbol", symbol.clone()),
            ("interval", timeframe.label().to_string()),
            ("limit", limit.to_string()),
        ];

        let response = self.make_request("/fapi/v1/klines", &query).await?;
        let rows: Vec<Vec<Value>> = response.json().await?;

        let candles = rows
            .iter()
            .map(|row| parse_kline(row))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            "Fetched {} {} candles for {}",
            candles.len(),
            timeframe,
            symbol
        );

        Ok(candles)
    }
}

#[async_trait]
impl CandleSource for BinanceClient {
    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<CandleSeries, ApiError> {
        let candles = self.get_klines(symbol, timeframe, limit).await?;
        Ok(CandleSeries::new(candles)?)
    }
}

/// Parse one kline row:
/// `[openTime, "open", "high", "low", "close", "volume", closeTime, ...]`
fn parse_kline(row: &[Value]) -> Result<Candle, ApiError> {
    if row.len() < 6 {
        return Err(ApiError::Parse(format!(
            "kline row has {} fields, expected at least 6",
            row.len()
        )));
    }

    let timestamp = row[0]
        .as_i64()
        .ok_or_else(|| ApiError::Parse(format!("invalid open time: {}", row[0])))?;

    let field = |i: usize, name: &str| -> Result<f64, ApiError> {
        let value = match &row[i] {
            Value::String(s) => s.parse::<f64>().ok(),
            Value::Number(n) => n.as_f64(),
            _ => None,
        };
        value.ok_or_else(|| ApiError::Parse(format!("invalid {}: {}", name, row[i])))
    };

    Ok(Candle::new(
        timestamp,
        field(1, "open")?,
        field(2, "high")?,
        field(3, "low")?,
        field(4, "close")?,
        field(5, "volume")?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_kline_strings() {
        let row = json!([
            1499040000000i64,
            "0.01634790",
            "0.80000000",
            "0.01575800",
            "0.01577100",
            "148976.11427815",
            1499644799999i64,
            "2434.19055334",
            308,
            "1756.87402397",
            "28.46694368",
            "0"
        ]);
        let candle = parse_kline(row.as_array().unwrap()).unwrap();

        assert_eq!(candle.timestamp, 1499040000000);
        assert_eq!(candle.open, 0.0163479);
        assert_eq!(candle.high, 0.8);
        assert_eq!(candle.volume, 148976.11427815);
    }

    #[test]
    fn test_parse_kline_numbers() {
        let row = json!([1000, 1.0, 2.0, 0.5, 1.5, 10.0]);
        let candle = parse_kline(row.as_array().unwrap()).unwrap();
        assert_eq!(candle.close, 1.5);
    }

    #[test]
    fn test_parse_kline_rejects_bad_rows() {
        let short = json!([1000, "1.0"]);
        assert!(matches!(
            parse_kline(short.as_array().unwrap()),
            Err(ApiError::Parse(_))
        ));

        let garbage = json!([1000, "abc", "2", "0.5", "1.5", "10"]);
        assert!(matches!(
            parse_kline(garbage.as_array().unwrap()),
            Err(ApiError::Parse(_))
        ));
    }

    #[test]
    fn test_client_creation() {
        let config = AppConfig {
            binance_base_url: "http://localhost:1234/".to_string(),
            ..AppConfig::default()
        };
        let client = BinanceClient::from_config(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:1234");
    }

    #[tokio::test]
    async fn test_limit_validated_before_request() {
        let client = BinanceClient::new().unwrap();
        let result = client.get_klines("SOLUSDT", Timeframe::Hour1, 0).await;
        assert!(matches!(result, Err(ApiError::Validation(_))));

        let result = client
            .get_klines("SOLUSDT", Timeframe::Hour1, MAX_KLINES_PER_REQUEST + 1)
            .await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    #[ignore] // Ignore by default to avoid hitting API in tests
    async fn test_get_klines_live() {
        let client = BinanceClient::new().unwrap();
        let series = client
            .fetch_candles("SOL/USDT", Timeframe::Hour1, 50)
            .await
            .unwrap();
        assert_eq!(series.len(), 50);
        println!("SOL last close: {:.4}", series.current_price().unwrap());
    }
}
