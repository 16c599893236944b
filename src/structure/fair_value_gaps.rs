/// Fair value gap detection
///
/// A gap is the price range skipped between the first and third candle of a
/// triple. Gaps are keyed to the timestamp of the first candle.
///
/// `top` and `bottom` keep the candle they were read from rather than the
/// numeric order: a bullish gap runs from `top = high[i]` up to
/// `bottom = low[i+2]`, a bearish gap from `top = low[i]` down to
/// `bottom = high[i+2]`. Use `upper()` / `lower()` for the ordered bounds.

use crate::error::{ensure_len, AnalysisError};
use crate::models::CandleSeries;
use crate::structure::Direction;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FairValueGap {
    pub top: f64,
    pub bottom: f64,
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub kind: Direction,
}

impl FairValueGap {
    /// Build a gap, rejecting zero-width or wrongly oriented ranges
    pub fn new(
        top: f64,
        bottom: f64,
        timestamp: i64,
        kind: Direction,
    ) -> Result<Self, AnalysisError> {
        if !top.is_finite() || !bottom.is_finite() {
            return Err(AnalysisError::MalformedInput(format!(
                "gap bounds must be finite (top {}, bottom {})",
                top, bottom
            )));
        }

        let opens_in_direction = match kind {
            Direction::Bullish => bottom > top,
            Direction::Bearish => top > bottom,
        };
        if !opens_in_direction {
            return Err(AnalysisError::MalformedInput(format!(
                "{:?} gap at {} has no width (top {}, bottom {})",
                kind, timestamp, top, bottom
            )));
        }

        Ok(Self {
            top,
            bottom,
            timestamp,
            kind,
        })
    }

    pub fn upper(&self) -> f64 {
        self.top.max(self.bottom)
    }

    pub fn lower(&self) -> f64 {
        self.top.min(self.bottom)
    }

    pub fn width(&self) -> f64 {
        self.upper() - self.lower()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FairValueGaps {
    pub bullish: Vec<FairValueGap>,
    pub bearish: Vec<FairValueGap>,
}

impl FairValueGaps {
    pub fn len(&self) -> usize {
        self.bullish.len() + self.bearish.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bullish.is_empty() && self.bearish.is_empty()
    }
}

/// Scan every candle triple for bullish and bearish gaps
pub fn detect_fair_value_gaps(series: &CandleSeries) -> Result<FairValueGaps, AnalysisError> {
    ensure_len(series.len(), 3)?;

    let candles = series.candles();
    let mut gaps = FairValueGaps::default();

    for triple in candles.windows(3) {
        let first = &triple[0];
        let third = &triple[2];

        // Both directions are checked; a well-formed triple can only satisfy one
        if third.low > first.high {
            gaps.bullish.push(FairValueGap::new(
                first.high,
                third.low,
                first.timestamp,
                Direction::Bullish,
            )?);
        }

        if first.low > third.high {
            gaps.bearish.push(FairValueGap::new(
                first.low,
                third.high,
                first.timestamp,
                Direction::Bearish,
            )?);
        }
    }

    Ok(gaps)
}
