/// Liquidity pool detection
///
/// High-volume candles that also mark a one-candle price extreme: a local low
/// is resting demand, a local high resting supply.

use crate::error::{ensure_len, AnalysisError};
use crate::models::CandleSeries;
use crate::structure::{top_by_score, HIGH_VOLUME_MULTIPLE, TOP_RANKED};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PoolKind {
    Demand,
    Supply,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LiquidityPool {
    #[serde(rename = "type")]
    pub kind: PoolKind,
    pub index: usize,
    pub timestamp: i64,
    /// Low of a demand candle, high of a supply candle
    pub price: f64,
    pub volume: f64,
    /// Volume as a multiple of the series mean
    pub strength: f64,
}

/// Find the three strongest liquidity pools
///
/// A candle that is both a local low and a local high is recorded as demand.
pub fn find_liquidity_pools(series: &CandleSeries) -> Result<Vec<LiquidityPool>, AnalysisError> {
    ensure_len(series.len(), 3)?;

    let candles = series.candles();
    let avg_volume = series.mean_volume()?;
    let threshold = avg_volume * HIGH_VOLUME_MULTIPLE;

    let mut pools = Vec::new();

    for i in 1..candles.len() - 1 {
        let (prev, current, next) = (&candles[i - 1], &candles[i], &candles[i + 1]);

        if current.volume <= threshold {
            continue;
        }

        let (kind, price) = if current.low < prev.low && current.low < next.low {
            (PoolKind::Demand, current.low)
        } else if current.high > prev.high && current.high > next.high {
            (PoolKind::Supply, current.high)
        } else {
            continue;
        };

        pools.push(LiquidityPool {
            kind,
            index: i,
            timestamp: current.timestamp,
            price,
            volume: current.volume,
            strength: current.volume / avg_volume,
        });
    }

    Ok(top_by_score(pools, TOP_RANKED, |p| p.strength))
}
