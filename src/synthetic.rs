/// Seeded synthetic candles for offline demos and tests
///
/// Every scenario produces a valid `CandleSeries`: OHLC is built around each
/// close so the invariant holds, and timestamps step by the timeframe.

use crate::error::AnalysisError;
use crate::models::{Candle, CandleSeries, Timeframe};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketScenario {
    /// Upward drift with small noise
    Uptrend,
    /// Downward drift with small noise
    Downtrend,
    /// Mean-reverting chop around the base price
    Sideways,
    /// Large random moves
    Volatile,
}

impl MarketScenario {
    pub fn all() -> &'static [MarketScenario] {
        &[
            MarketScenario::Uptrend,
            MarketScenario::Downtrend,
            MarketScenario::Sideways,
            MarketScenario::Volatile,
        ]
    }
}

impl FromStr for MarketScenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "uptrend" | "up" => Ok(MarketScenario::Uptrend),
            "downtrend" | "down" => Ok(MarketScenario::Downtrend),
            "sideways" | "range" => Ok(MarketScenario::Sideways),
            "volatile" => Ok(MarketScenario::Volatile),
            _ => Err(format!("unknown scenario: {}", s)),
        }
    }
}

pub struct SyntheticDataGenerator {
    rng: StdRng,
    base_price: f64,
    base_volume: f64,
}

impl SyntheticDataGenerator {
    /// Same seed, same candles
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            base_price: 150.0,
            base_volume: 1_000_000.0,
        }
    }

    pub fn with_base_price(mut self, base_price: f64) -> Self {
        self.base_price = base_price;
        self
    }

    pub fn base_price(&self) -> f64 {
        self.base_price
    }

    /// Generate `count` candles ending at `end_ms` (exclusive of the next open)
    pub fn generate(
        &mut self,
        scenario: MarketScenario,
        count: usize,
        timeframe: Timeframe,
        end_ms: i64,
    ) -> Result<CandleSeries, AnalysisError> {
        let step = timeframe.millis();
        let start = end_ms - step * count as i64;
        let mut price = self.base_price;
        let mut candles = Vec::with_capacity(count);

        for i in 0..count {
            price = self.next_close(scenario, price);
            let timestamp = start + step * i as i64;
            candles.push(self.create_candle(price, timestamp));
        }

        CandleSeries::new(candles)
    }

    fn next_close(&mut self, scenario: MarketScenario, price: f64) -> f64 {
        let next = match scenario {
            MarketScenario::Uptrend => price * (1.0 + 0.004 + self.rng.gen_range(-0.006..0.006)),
            MarketScenario::Downtrend => {
                price * (1.0 - 0.004 + self.rng.gen_range(-0.006..0.006))
            }
            MarketScenario::Sideways => {
                let reversion = (self.base_price - price) * 0.1;
                price + reversion + price * self.rng.gen_range(-0.01..0.01)
            }
            MarketScenario::Volatile => price * (1.0 + self.rng.gen_range(-0.05..0.05)),
        };

        // Keep prices well away from zero
        next.max(self.base_price * 0.2)
    }

    fn create_candle(&mut self, close: f64, timestamp: i64) -> Candle {
        let wick = 0.004;

        let open = close * (1.0 + self.rng.gen_range(-wick..wick));
        let high = open.max(close) * (1.0 + self.rng.gen_range(0.0..wick));
        let low = open.min(close) * (1.0 - self.rng.gen_range(0.0..wick));
        let volume = self.base_volume * self.rng.gen_range(0.5..2.5);

        Candle::new(timestamp, open, high, low, close, volume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const END: i64 = 1_700_000_000_000;

    #[test]
    fn test_generate_uptrend() {
        let mut gen = SyntheticDataGenerator::new(42);
        let series = gen
            .generate(MarketScenario::Uptrend, 200, Timeframe::Hour1, END)
            .unwrap();

        assert_eq!(series.len(), 200);
        let first = series.candles()[0].close;
        let last = series.current_price().unwrap();
        assert!(last > first, "uptrend should end higher: {} -> {}", first, last);
    }

    #[test]
    fn test_generate_downtrend() {
        let mut gen = SyntheticDataGenerator::new(42);
        let series = gen
            .generate(MarketScenario::Downtrend, 200, Timeframe::Hour1, END)
            .unwrap();

        let first = series.candles()[0].close;
        let last = series.current_price().unwrap();
        assert!(last < first, "downtrend should end lower: {} -> {}", first, last);
    }

    #[test]
    fn test_sideways_stays_near_base() {
        let mut gen = SyntheticDataGenerator::new(7);
        let base = gen.base_price();
        let series = gen
            .generate(MarketScenario::Sideways, 300, Timeframe::Min15, END)
            .unwrap();

        for candle in series.candles() {
            assert!(
                candle.close > base * 0.85 && candle.close < base * 1.15,
                "sideways drifted: {} vs {}",
                candle.close,
                base
            );
        }
    }

    #[test]
    fn test_timestamps_step_by_timeframe() {
        let mut gen = SyntheticDataGenerator::new(1);
        let series = gen
            .generate(MarketScenario::Volatile, 10, Timeframe::Hour4, END)
            .unwrap();

        let ts = series.timestamps();
        assert!(ts.windows(2).all(|w| w[1] - w[0] == Timeframe::Hour4.millis()));
        assert_eq!(*ts.last().unwrap(), END - Timeframe::Hour4.millis());
    }

    #[test]
    fn test_same_seed_same_candles() {
        let a = SyntheticDataGenerator::new(99)
            .generate(MarketScenario::Volatile, 50, Timeframe::Hour1, END)
            .unwrap();
        let b = SyntheticDataGenerator::new(99)
            .generate(MarketScenario::Volatile, 50, Timeframe::Hour1, END)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_scenario_parsing() {
        assert_eq!("Uptrend".parse::<MarketScenario>(), Ok(MarketScenario::Uptrend));
        assert_eq!("range".parse::<MarketScenario>(), Ok(MarketScenario::Sideways));
        assert!("moon".parse::<MarketScenario>().is_err());
    }
}
