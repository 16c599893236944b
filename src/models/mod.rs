pub mod timeframe;

pub use timeframe::Timeframe;

use crate::error::AnalysisError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV candlestick, keyed by its open time in epoch milliseconds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Candle {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Open time as a UTC datetime (None if out of chrono's range)
    pub fn open_time(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(self.timestamp)
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// Check the OHLC invariant: low <= min(open, close) <= max(open, close) <= high
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let fields = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(AnalysisError::MalformedInput(format!(
                    "candle {}: {} is not finite ({})",
                    self.timestamp, name, value
                )));
            }
        }

        if self.high < self.low {
            return Err(AnalysisError::MalformedInput(format!(
                "candle {}: high ({}) is less than low ({})",
                self.timestamp, self.high, self.low
            )));
        }

        // True range and ATR are built from this difference
        if !(self.high - self.low).is_finite() {
            return Err(AnalysisError::MalformedInput(format!(
                "candle {}: range {}..{} overflows",
                self.timestamp, self.low, self.high
            )));
        }

        let body_low = self.open.min(self.close);
        let body_high = self.open.max(self.close);
        if body_low < self.low || body_high > self.high {
            return Err(AnalysisError::MalformedInput(format!(
                "candle {}: open/close ({}/{}) outside high-low range ({}..{})",
                self.timestamp, self.open, self.close, self.low, self.high
            )));
        }

        // Volume can be 0.0 on illiquid intervals
        if self.volume < 0.0 {
            return Err(AnalysisError::MalformedInput(format!(
                "candle {}: negative volume ({})",
                self.timestamp, self.volume
            )));
        }

        Ok(())
    }
}

/// Validated, immutable candle sequence ordered oldest first
///
/// Every analysis function consumes a `CandleSeries`. Construction rejects
/// candles that break the OHLC invariant and timestamps that are not strictly
/// increasing, so downstream code never sees NaN-producing input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(candles: Vec<Candle>) -> Result<Self, AnalysisError> {
        for candle in &candles {
            candle.validate()?;
        }

        for pair in candles.windows(2) {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(AnalysisError::MalformedInput(format!(
                    "timestamps must be strictly increasing: {} follows {}",
                    pair[1].timestamp, pair[0].timestamp
                )));
            }
        }

        Ok(Self { candles })
    }

    /// Build from `[timestamp, open, high, low, close, volume]` rows
    /// (the usual exchange OHLCV array layout)
    pub fn from_rows(rows: &[[f64; 6]]) -> Result<Self, AnalysisError> {
        let mut candles = Vec::with_capacity(rows.len());
        for row in rows {
            let ts = row[0];
            if !ts.is_finite() || ts.fract() != 0.0 {
                return Err(AnalysisError::MalformedInput(format!(
                    "timestamp must be integer milliseconds, got {}",
                    ts
                )));
            }
            // i64::MAX rounds up to 2^63 as f64, so the upper bound is exclusive
            if ts < i64::MIN as f64 || ts >= i64::MAX as f64 {
                return Err(AnalysisError::MalformedInput(format!(
                    "timestamp {} is outside the i64 millisecond range",
                    ts
                )));
            }
            candles.push(Candle::new(ts as i64, row[1], row[2], row[3], row[4], row[5]));
        }
        Self::new(candles)
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn get(&self, index: usize) -> Option<&Candle> {
        self.candles.get(index)
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// Close of the newest candle
    pub fn current_price(&self) -> Result<f64, AnalysisError> {
        self.last()
            .map(|c| c.close)
            .ok_or_else(|| AnalysisError::insufficient(1, 0))
    }

    pub fn timestamps(&self) -> Vec<i64> {
        self.candles.iter().map(|c| c.timestamp).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.low).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.volume).collect()
    }

    /// Arithmetic mean of volume over the whole series
    pub fn mean_volume(&self) -> Result<f64, AnalysisError> {
        if self.candles.is_empty() {
            return Err(AnalysisError::insufficient(1, 0));
        }
        let total: f64 = self.candles.iter().map(|c| c.volume).sum();
        Ok(total / self.candles.len() as f64)
    }

    /// The newest `n` candles as a new series
    pub fn tail(&self, n: usize) -> CandleSeries {
        let start = self.candles.len().saturating_sub(n);
        Self {
            candles: self.candles[start..].to_vec(),
        }
    }
}

impl TryFrom<Vec<Candle>> for CandleSeries {
    type Error = AnalysisError;

    fn try_from(candles: Vec<Candle>) -> Result<Self, Self::Error> {
        Self::new(candles)
    }
}
