/// Entry / stop-loss / take-profit levels from ATR multiples
///
/// A bullish trend gives a long setup below and above the current price, a
/// bearish trend the mirrored short. Any other trend yields `NoSetup`.

use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        }
    }
}

impl FromStr for OrderSide {
    type Err = String;

    /// Case-insensitive; accepts "long" / "short" as well
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BUY" | "LONG" => Ok(OrderSide::Buy),
            "SELL" | "SHORT" => Ok(OrderSide::Sell),
            _ => Err(format!("unknown order side: {}", s)),
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TradeLevels {
    pub side: OrderSide,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

impl TradeLevels {
    /// Reward distance over risk distance; None when the stop sits on the entry
    pub fn risk_reward(&self) -> Option<f64> {
        let risk = (self.entry - self.stop_loss).abs();
        if risk == 0.0 {
            return None;
        }
        Some((self.take_profit - self.entry).abs() / risk)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelCalculator {
    pub stop_atr_multiple: f64,
    pub target_atr_multiple: f64,
}

impl Default for LevelCalculator {
    fn default() -> Self {
        Self {
            stop_atr_multiple: 1.0,
            target_atr_multiple: 2.0,
        }
    }
}

impl LevelCalculator {
    pub fn new(stop_atr_multiple: f64, target_atr_multiple: f64) -> Self {
        Self {
            stop_atr_multiple,
            target_atr_multiple,
        }
    }

    /// Derive levels for `trend` (matched on its `BULLISH` / `BEARISH` prefix)
    pub fn calculate(
        &self,
        current_price: f64,
        atr: f64,
        trend: &str,
    ) -> Result<TradeLevels, AnalysisError> {
        if !current_price.is_finite() || !atr.is_finite() {
            return Err(AnalysisError::InvalidParameter(format!(
                "price and ATR must be finite (price {}, atr {})",
                current_price, atr
            )));
        }
        if atr < 0.0 {
            return Err(AnalysisError::InvalidParameter(format!(
                "ATR must be non-negative, got {}",
                atr
            )));
        }

        let stop_distance = atr * self.stop_atr_multiple;
        let target_distance = atr * self.target_atr_multiple;

        if trend.starts_with("BULLISH") {
            Ok(TradeLevels {
                side: OrderSide::Buy,
                entry: current_price,
                stop_loss: current_price - stop_distance,
                take_profit: current_price + target_distance,
            })
        } else if trend.starts_with("BEARISH") {
            Ok(TradeLevels {
                side: OrderSide::Sell,
                entry: current_price,
                stop_loss: current_price + stop_distance,
                take_profit: current_price - target_distance,
            })
        } else {
            Err(AnalysisError::NoSetup(format!(
                "trend {} has no direction",
                trend
            )))
        }
    }
}

/// Levels with the default 1x ATR stop and 2x ATR target
pub fn calculate_levels(
    current_price: f64,
    atr: f64,
    trend: &str,
) -> Result<TradeLevels, AnalysisError> {
    LevelCalculator::default().calculate(current_price, atr, trend)
}
