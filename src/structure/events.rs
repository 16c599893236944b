/// Break of structure (BOS) and change of character (CHoCH) detection
///
/// Both detectors walk the candles forward while tracking the most recently
/// confirmed swing high and swing low. A swing becomes trackable on the first
/// candle whose timestamp is past it; at most one swing of each kind is taken
/// from the queue per candle.

use crate::models::CandleSeries;
use crate::structure::swings::{SwingPoint, SwingPoints};
use crate::structure::Direction;
use serde::{Serialize, Serializer};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureEventKind {
    BosBullish,
    BosBearish,
    ChochBullish,
    ChochBearish,
}

impl StructureEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StructureEventKind::BosBullish => "BOS_bullish",
            StructureEventKind::BosBearish => "BOS_bearish",
            StructureEventKind::ChochBullish => "CHoCH_bullish",
            StructureEventKind::ChochBearish => "CHoCH_bearish",
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            StructureEventKind::BosBullish | StructureEventKind::ChochBullish => {
                Direction::Bullish
            }
            StructureEventKind::BosBearish | StructureEventKind::ChochBearish => {
                Direction::Bearish
            }
        }
    }

    pub fn is_bos(&self) -> bool {
        matches!(
            self,
            StructureEventKind::BosBullish | StructureEventKind::BosBearish
        )
    }
}

impl Serialize for StructureEventKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A structure break at a candle close
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StructureEvent {
    #[serde(rename = "type")]
    pub kind: StructureEventKind,
    pub timestamp: i64,
    /// Close of the breaking candle
    pub price: f64,
}

/// Swing queues in timestamp order plus the currently tracked swing of each kind
struct SwingTracker<'a> {
    highs: VecDeque<&'a SwingPoint>,
    lows: VecDeque<&'a SwingPoint>,
    last_high: Option<&'a SwingPoint>,
    last_low: Option<&'a SwingPoint>,
}

impl<'a> SwingTracker<'a> {
    fn new(swings: &'a SwingPoints) -> Self {
        let mut highs: Vec<&SwingPoint> = swings.highs.iter().collect();
        let mut lows: Vec<&SwingPoint> = swings.lows.iter().collect();
        highs.sort_by_key(|p| p.timestamp);
        lows.sort_by_key(|p| p.timestamp);

        Self {
            highs: highs.into(),
            lows: lows.into(),
            last_high: None,
            last_low: None,
        }
    }

    /// Promote at most one queued swing of each kind that `timestamp` has passed
    fn advance(&mut self, timestamp: i64) {
        if self.highs.front().is_some_and(|p| timestamp > p.timestamp) {
            self.last_high = self.highs.pop_front();
        }
        if self.lows.front().is_some_and(|p| timestamp > p.timestamp) {
            self.last_low = self.lows.pop_front();
        }
    }

    fn close_above_high(&self, close: f64) -> bool {
        self.last_high.is_some_and(|p| close > p.price)
    }

    fn close_below_low(&self, close: f64) -> bool {
        self.last_low.is_some_and(|p| close < p.price)
    }
}

/// Detect BOS events
///
/// A close beyond the tracked swing fires an event and clears that swing, so
/// each swing point produces at most one BOS.
pub fn detect_break_of_structure(
    series: &CandleSeries,
    swings: &SwingPoints,
) -> Vec<StructureEvent> {
    let mut tracker = SwingTracker::new(swings);
    let mut events = Vec::new();

    for candle in series.candles().iter().skip(1) {
        tracker.advance(candle.timestamp);

        if tracker.close_above_high(candle.close) {
            events.push(StructureEvent {
                kind: StructureEventKind::BosBullish,
                timestamp: candle.timestamp,
                price: candle.close,
            });
            tracker.last_high = None;
        }

        if tracker.close_below_low(candle.close) {
            events.push(StructureEvent {
                kind: StructureEventKind::BosBearish,
                timestamp: candle.timestamp,
                price: candle.close,
            });
            tracker.last_low = None;
        }
    }

    events
}

/// CHoCH events together with the bias they started and ended on
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChochAnalysis {
    pub events: Vec<StructureEvent>,
    /// Bias from the two oldest swing highs and lows; None when they disagree
    pub initial_bias: Option<Direction>,
    pub final_bias: Option<Direction>,
}

/// Bias implied by the two oldest swings of each kind
fn initial_bias(swings: &SwingPoints) -> Option<Direction> {
    if swings.highs.len() < 2 || swings.lows.len() < 2 {
        return None;
    }

    let mut highs: Vec<&SwingPoint> = swings.highs.iter().collect();
    let mut lows: Vec<&SwingPoint> = swings.lows.iter().collect();
    highs.sort_by_key(|p| p.timestamp);
    lows.sort_by_key(|p| p.timestamp);

    let (h0, h1) = (highs[0].price, highs[1].price);
    let (l0, l1) = (lows[0].price, lows[1].price);

    if h1 > h0 && l1 > l0 {
        Some(Direction::Bullish)
    } else if h1 < h0 && l1 < l0 {
        Some(Direction::Bearish)
    } else {
        None
    }
}

/// Detect CHoCH events
///
/// Two-state machine: while bearish, a close above the tracked swing high flips
/// the bias to bullish; while bullish, a close below the tracked swing low
/// flips it to bearish. Nothing is emitted when no initial bias exists. Swings
/// are not consumed by a flip.
pub fn detect_change_of_character(
    series: &CandleSeries,
    swings: &SwingPoints,
) -> ChochAnalysis {
    let start = initial_bias(swings);
    let mut bias = start;
    let mut tracker = SwingTracker::new(swings);
    let mut events = Vec::new();

    for candle in series.candles().iter().skip(1) {
        tracker.advance(candle.timestamp);

        match bias {
            Some(Direction::Bearish) if tracker.close_above_high(candle.close) => {
                events.push(StructureEvent {
                    kind: StructureEventKind::ChochBullish,
                    timestamp: candle.timestamp,
                    price: candle.close,
                });
                bias = Some(Direction::Bullish);
            }
            Some(Direction::Bullish) if tracker.close_below_low(candle.close) => {
                events.push(StructureEvent {
                    kind: StructureEventKind::ChochBearish,
                    timestamp: candle.timestamp,
                    price: candle.close,
                });
                bias = Some(Direction::Bearish);
            }
            _ => {}
        }
    }

    ChochAnalysis {
        events,
        initial_bias: start,
        final_bias: bias,
    }
}
