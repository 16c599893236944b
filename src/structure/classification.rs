/// Market structure classification
///
/// Compares the two most recent swing highs and the two most recent swing lows
/// to tag the trend (higher highs / higher lows and their mirrors)

use crate::structure::swings::SwingPoints;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketTrend {
    BullishTrend,    // Higher high + higher low
    BearishTrend,    // Lower high + lower low
    BullishBreakout, // Higher high + lower low
    BearishBreakout, // Lower high + higher low
    Consolidation,   // Equal highs or lows
    Undefined,       // Fewer than two swings of a kind
}

impl MarketTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketTrend::BullishTrend => "BULLISH_TREND",
            MarketTrend::BearishTrend => "BEARISH_TREND",
            MarketTrend::BullishBreakout => "BULLISH_BREAKOUT",
            MarketTrend::BearishBreakout => "BEARISH_BREAKOUT",
            MarketTrend::Consolidation => "CONSOLIDATION",
            MarketTrend::Undefined => "UNDEFINED",
        }
    }

    pub fn is_bullish(&self) -> bool {
        matches!(self, MarketTrend::BullishTrend | MarketTrend::BullishBreakout)
    }

    pub fn is_bearish(&self) -> bool {
        matches!(self, MarketTrend::BearishTrend | MarketTrend::BearishBreakout)
    }
}

impl fmt::Display for MarketTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify the trend from the latest swing pair of each kind
///
/// Comparisons are strict in both directions, so an equal pair of highs or
/// lows never counts as higher or lower and lands in `Consolidation`.
pub fn classify_market_structure(swings: &SwingPoints) -> MarketTrend {
    let highs = swings.recent_highs(2);
    let lows = swings.recent_lows(2);

    // Need at least 2 swing highs and 2 swing lows to determine structure
    if highs.len() < 2 || lows.len() < 2 {
        return MarketTrend::Undefined;
    }

    // recent_* is newest first
    let (latest_high, prior_high) = (highs[0].price, highs[1].price);
    let (latest_low, prior_low) = (lows[0].price, lows[1].price);

    let higher_high = latest_high > prior_high;
    let lower_high = latest_high < prior_high;
    let higher_low = latest_low > prior_low;
    let lower_low = latest_low < prior_low;

    if higher_high && higher_low {
        MarketTrend::BullishTrend
    } else if lower_high && lower_low {
        MarketTrend::BearishTrend
    } else if higher_high && lower_low {
        MarketTrend::BullishBreakout
    } else if lower_high && higher_low {
        MarketTrend::BearishBreakout
    } else {
        MarketTrend::Consolidation
    }
}
