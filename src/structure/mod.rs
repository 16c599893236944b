// Market structure (Smart Money Concepts) module
// Swing points, order blocks, fair value gaps, BOS/CHoCH events,
// liquidity pools and trend classification

pub mod classification;
pub mod events;
pub mod fair_value_gaps;
pub mod liquidity;
pub mod order_blocks;
pub mod swings;

pub use classification::{classify_market_structure, MarketTrend};
pub use events::{
    detect_break_of_structure, detect_change_of_character, ChochAnalysis, StructureEvent,
    StructureEventKind,
};
pub use fair_value_gaps::{detect_fair_value_gaps, FairValueGap, FairValueGaps};
pub use liquidity::{find_liquidity_pools, LiquidityPool, PoolKind};
pub use order_blocks::{
    extract_order_blocks, find_volume_order_blocks, OrderBlock, VolumeOrderBlock,
};
pub use swings::{
    detect_swing_points, swing_extremes, SwingExtreme, SwingExtremes, SwingKind, SwingPoint,
    SwingPoints,
};

use serde::{Serialize, Serializer};

/// Volume above this multiple of the series mean counts as "high volume"
pub const HIGH_VOLUME_MULTIPLE: f64 = 1.5;

/// Ranked detectors (liquidity pools, volume order blocks) keep this many entries
pub const TOP_RANKED: usize = 3;

/// Directional polarity shared by blocks, gaps and structure bias
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Bullish,
    Bearish,
}

impl Direction {
    /// Uppercase label used by the volume-ranked detectors
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Bullish => "BULLISH",
            Direction::Bearish => "BEARISH",
        }
    }
}

/// `serialize_with` helper writing a direction as `BULLISH` / `BEARISH`
pub(crate) fn serialize_label<S: Serializer>(
    direction: &Direction,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(direction.label())
}

/// Sort descending by a score, keeping input order for ties, and keep the top `n`
pub(crate) fn top_by_score<T>(mut items: Vec<T>, n: usize, score: impl Fn(&T) -> f64) -> Vec<T> {
    items.sort_by(|a, b| score(b).total_cmp(&score(a)));
    items.truncate(n);
    items
}
