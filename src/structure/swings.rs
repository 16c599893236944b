/// Swing point detection
///
/// Index `i` is a swing high when `high[i]` is strictly above every high within
/// `lookback` candles on both sides, and a swing low when `low[i]` is strictly
/// below every such low. Indices closer than `lookback` to either end of the
/// series never qualify.

use crate::error::{ensure_len, AnalysisError};
use crate::models::CandleSeries;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SwingKind {
    High,
    Low,
}

/// A candle extreme that satisfies the local-extremum rule
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SwingPoint {
    pub index: usize,
    pub timestamp: i64,
    pub price: f64,
    pub kind: SwingKind,
}

/// Swing highs and lows in time order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SwingPoints {
    pub highs: Vec<SwingPoint>,
    pub lows: Vec<SwingPoint>,
}

impl SwingPoints {
    pub fn is_empty(&self) -> bool {
        self.highs.is_empty() && self.lows.is_empty()
    }

    /// The `n` most recent swing highs, newest first
    pub fn recent_highs(&self, n: usize) -> Vec<&SwingPoint> {
        self.highs.iter().rev().take(n).collect()
    }

    /// The `n` most recent swing lows, newest first
    pub fn recent_lows(&self, n: usize) -> Vec<&SwingPoint> {
        self.lows.iter().rev().take(n).collect()
    }
}

/// Minimum series length for a swing scan with the given lookback
pub fn min_candles_for_swings(lookback: usize) -> usize {
    2 * lookback + 1
}

/// Detect swing highs and lows
///
/// Fails with `InsufficientData` when no index could possibly qualify, so an
/// empty result always means "searched, found nothing".
pub fn detect_swing_points(
    series: &CandleSeries,
    lookback: usize,
) -> Result<SwingPoints, AnalysisError> {
    if lookback == 0 {
        return Err(AnalysisError::InvalidParameter(
            "swing lookback must be at least 1".to_string(),
        ));
    }
    ensure_len(series.len(), min_candles_for_swings(lookback))?;

    let candles = series.candles();
    let mut swings = SwingPoints::default();

    for i in lookback..candles.len() - lookback {
        let high = candles[i].high;
        let low = candles[i].low;

        let is_high =
            (1..=lookback).all(|j| high > candles[i - j].high && high > candles[i + j].high);
        let is_low =
            (1..=lookback).all(|j| low < candles[i - j].low && low < candles[i + j].low);

        if is_high {
            swings.highs.push(SwingPoint {
                index: i,
                timestamp: candles[i].timestamp,
                price: high,
                kind: SwingKind::High,
            });
        }

        if is_low {
            swings.lows.push(SwingPoint {
                index: i,
                timestamp: candles[i].timestamp,
                price: low,
                kind: SwingKind::Low,
            });
        }
    }

    tracing::trace!(
        lookback,
        highs = swings.highs.len(),
        lows = swings.lows.len(),
        "swing scan complete"
    );

    Ok(swings)
}

/// Price and time of an extreme swing
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SwingExtreme {
    pub price: f64,
    pub at: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SwingExtremes {
    pub highest_swing_high: Option<SwingExtreme>,
    pub lowest_swing_low: Option<SwingExtreme>,
}

/// Highest swing high and lowest swing low (earliest wins on ties)
pub fn swing_extremes(swings: &SwingPoints) -> SwingExtremes {
    let highest = swings.highs.iter().fold(None::<&SwingPoint>, |best, p| match best {
        Some(b) if b.price >= p.price => Some(b),
        _ => Some(p),
    });
    let lowest = swings.lows.iter().fold(None::<&SwingPoint>, |best, p| match best {
        Some(b) if b.price <= p.price => Some(b),
        _ => Some(p),
    });

    SwingExtremes {
        highest_swing_high: highest.map(|p| SwingExtreme {
            price: p.price,
            at: p.timestamp,
        }),
        lowest_swing_low: lowest.map(|p| SwingExtreme {
            price: p.price,
            at: p.timestamp,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Candle;

    fn series_from_highs_lows(points: &[(f64, f64)]) -> CandleSeries {
        let candles = points
            .iter()
            .enumerate()
            .map(|(i, &(high, low))| {
                let mid = (high + low) / 2.0;
                Candle::new(i as i64 * 60_000, mid, high, low, mid, 1000.0)
            })
            .collect();
        CandleSeries::new(candles).unwrap()
    }

    #[test]
    fn test_single_peak_and_trough() {
        let series = series_from_highs_lows(&[
            (10.0, 9.0),
            (11.0, 8.0),
            (15.0, 12.0), // swing high
            (12.0, 7.0),
            (11.0, 5.0), // swing low
            (13.0, 6.0),
            (14.0, 9.0),
        ]);

        let swings = detect_swing_points(&series, 2).unwrap();
        assert_eq!(swings.highs.len(), 1);
        assert_eq!(swings.highs[0].index, 2);
        assert_eq!(swings.highs[0].price, 15.0);
        assert_eq!(swings.highs[0].timestamp, 120_000);

        assert_eq!(swings.lows.len(), 1);
        assert_eq!(swings.lows[0].index, 4);
        assert_eq!(swings.lows[0].kind, SwingKind::Low);
    }

    #[test]
    fn test_edges_never_qualify() {
        // The first candle has the highest high but no left neighbours
        let series = series_from_highs_lows(&[(20.0, 1.0), (10.0, 9.0), (11.0, 9.5)]);
        let swings = detect_swing_points(&series, 1).unwrap();
        assert!(swings.highs.is_empty());
        assert!(swings.lows.is_empty());
    }

    #[test]
    fn test_equal_highs_are_not_swings() {
        let series =
            series_from_highs_lows(&[(10.0, 9.0), (12.0, 9.0), (12.0, 9.0), (10.0, 9.0)]);
        let swings = detect_swing_points(&series, 1).unwrap();
        assert!(swings.is_empty());
    }

    #[test]
    fn test_degenerate_outside_bar_is_high_and_low() {
        let series = series_from_highs_lows(&[(10.0, 9.0), (12.0, 7.0), (10.0, 9.0)]);
        let swings = detect_swing_points(&series, 1).unwrap();
        assert_eq!(swings.highs.len(), 1);
        assert_eq!(swings.lows.len(), 1);
        assert_eq!(swings.highs[0].index, swings.lows[0].index);
    }

    #[test]
    fn test_too_short_for_lookback() {
        let series = series_from_highs_lows(&[(10.0, 9.0); 10]);
        assert_eq!(
            detect_swing_points(&series, 5),
            Err(AnalysisError::InsufficientData {
                required: 11,
                actual: 10
            })
        );
    }

    #[test]
    fn test_zero_lookback_rejected() {
        let series = series_from_highs_lows(&[(10.0, 9.0); 3]);
        assert!(matches!(
            detect_swing_points(&series, 0),
            Err(AnalysisError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_extremes() {
        let series = series_from_highs_lows(&[
            (10.0, 9.0),
            (14.0, 8.0),
            (11.0, 6.0),
            (16.0, 10.0),
            (12.0, 7.0),
            (13.0, 9.0),
        ]);
        let swings = detect_swing_points(&series, 1).unwrap();
        let extremes = swing_extremes(&swings);

        assert_eq!(
            extremes.highest_swing_high,
            Some(SwingExtreme {
                price: 16.0,
                at: 180_000
            })
        );
        assert_eq!(
            extremes.lowest_swing_low,
            Some(SwingExtreme {
                price: 6.0,
                at: 120_000
            })
        );
        assert_eq!(swings.recent_highs(1)[0].index, 3);
    }
}
