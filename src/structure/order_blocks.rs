/// Order block extraction
///
/// Two detectors:
/// - swing-based: every swing point seeds a block spanning its candle's range,
///   kept when the range is at most twice the ATR
/// - volume-based: high-volume candles followed by a >1% close-to-close move
///   in the candle's own direction, ranked by the size of that move

use crate::error::{ensure_len, AnalysisError};
use crate::models::CandleSeries;
use crate::structure::swings::SwingPoints;
use crate::structure::{
    serialize_label, top_by_score, Direction, HIGH_VOLUME_MULTIPLE, TOP_RANKED,
};
use serde::Serialize;

/// Blocks wider than this many ATRs are discarded
pub const MAX_BLOCK_ATR_MULTIPLE: f64 = 2.0;

/// Minimum close-to-close move (percent) for a volume order block
pub const MIN_BLOCK_MOVE_PCT: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrderBlock {
    pub index: usize,
    pub high: f64,
    pub low: f64,
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub kind: Direction,
}

impl OrderBlock {
    pub fn size(&self) -> f64 {
        self.high - self.low
    }
}

/// Build order blocks from swing points
///
/// A swing high seeds a *bearish* block and a swing low a *bullish* one: the
/// reaction away from the extreme is what the block records. Blocks come out
/// in candle order, with the high-origin block first when one candle is both.
pub fn extract_order_blocks(
    series: &CandleSeries,
    swings: &SwingPoints,
    atr: f64,
) -> Vec<OrderBlock> {
    let candles = series.candles();

    let seeds = swings
        .highs
        .iter()
        .map(|p| (p.index, Direction::Bearish))
        .chain(swings.lows.iter().map(|p| (p.index, Direction::Bullish)));

    let mut blocks: Vec<OrderBlock> = seeds
        .filter_map(|(index, kind)| {
            let candle = candles.get(index)?;
            Some(OrderBlock {
                index,
                high: candle.high,
                low: candle.low,
                timestamp: candle.timestamp,
                kind,
            })
        })
        .filter(|block| block.size() <= atr * MAX_BLOCK_ATR_MULTIPLE)
        .collect();

    // Stable: for equal indices the bearish (high-origin) block stays first
    blocks.sort_by_key(|block| block.index);
    blocks
}

/// High-volume reaction candle
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VolumeOrderBlock {
    pub index: usize,
    pub timestamp: i64,
    #[serde(rename = "type", serialize_with = "serialize_label")]
    pub kind: Direction,
    /// Close of the block candle
    pub price: f64,
    pub volume: f64,
    /// Absolute percentage move used for ranking
    pub strength: f64,
}

/// Find the three strongest volume-based order blocks
///
/// For each interior candle with volume above 1.5x the series mean, the move is
/// measured from its close to the close of the next older candle. A bullish
/// candle with a move above +1% is a bullish block; a bearish candle with a
/// move below -1% is a bearish block.
pub fn find_volume_order_blocks(
    series: &CandleSeries,
) -> Result<Vec<VolumeOrderBlock>, AnalysisError> {
    ensure_len(series.len(), 3)?;

    let candles = series.candles();
    let avg_volume = series.mean_volume()?;
    let threshold = avg_volume * HIGH_VOLUME_MULTIPLE;

    let mut blocks = Vec::new();

    for i in 1..candles.len() - 1 {
        let current = &candles[i];
        let older = &candles[i - 1];

        if current.volume <= threshold || current.close == 0.0 {
            continue;
        }

        let price_change = (older.close - current.close) / current.close * 100.0;

        let kind = if price_change > MIN_BLOCK_MOVE_PCT && current.is_bullish() {
            Direction::Bullish
        } else if price_change < -MIN_BLOCK_MOVE_PCT && current.is_bearish() {
            Direction::Bearish
        } else {
            continue;
        };

        blocks.push(VolumeOrderBlock {
            index: i,
            timestamp: current.timestamp,
            kind,
            price: current.close,
            volume: current.volume,
            strength: price_change.abs(),
        });
    }

    Ok(top_by_score(blocks, TOP_RANKED, |b| b.strength))
}
