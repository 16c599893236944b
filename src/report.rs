/// Full SMC analysis of one candle series
///
/// `analyze` runs every indicator and structure detector over a single
/// `CandleSeries` and gathers the results into an `AnalysisReport`. Nothing is
/// cached between calls.

use crate::error::{ensure_finite, AnalysisError};
use crate::indicators::{
    calculate_atr, calculate_bollinger_bands, calculate_ema, calculate_rsi, BollingerBands,
};
use crate::levels::{LevelCalculator, TradeLevels};
use crate::models::{CandleSeries, Timeframe};
use crate::structure::{
    classify_market_structure, detect_break_of_structure, detect_change_of_character,
    detect_fair_value_gaps, detect_swing_points, extract_order_blocks, find_liquidity_pools,
    find_volume_order_blocks, swing_extremes, Direction, FairValueGaps, LiquidityPool,
    MarketTrend, OrderBlock, StructureEvent, SwingExtreme, SwingPoint, VolumeOrderBlock,
};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerSetting {
    pub period: usize,
    pub multiplier: f64,
}

/// Periods and windows used by `analyze`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub atr_period: usize,
    /// Used for swing detection and therefore for every swing-derived output
    pub swing_lookback: usize,
    pub ema_periods: Vec<usize>,
    pub rsi_periods: Vec<usize>,
    pub bollinger: Vec<BollingerSetting>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            atr_period: 5,
            swing_lookback: 5,
            ema_periods: vec![9, 20, 50],
            rsi_periods: vec![7, 14, 21],
            bollinger: vec![
                BollingerSetting {
                    period: 14,
                    multiplier: 2.0,
                },
                BollingerSetting {
                    period: 20,
                    multiplier: 2.0,
                },
                BollingerSetting {
                    period: 50,
                    multiplier: 2.5,
                },
            ],
        }
    }
}

/// Outcome of an optional computation
///
/// Serializes as the value itself, or as
/// `{"insufficient_data": {"required": n, "actual": m}}` when the series was
/// too short for the window.
#[derive(Debug, Clone, PartialEq)]
pub enum Computed<T> {
    Ready(T),
    InsufficientData { required: usize, actual: usize },
}

impl<T> Computed<T> {
    /// Keep `InsufficientData` as a marker, propagate every other error
    pub fn from_result(result: Result<T, AnalysisError>) -> Result<Self, AnalysisError> {
        match result {
            Ok(value) => Ok(Computed::Ready(value)),
            Err(AnalysisError::InsufficientData { required, actual }) => {
                Ok(Computed::InsufficientData { required, actual })
            }
            Err(e) => Err(e),
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Computed::Ready(value) => Some(value),
            Computed::InsufficientData { .. } => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Computed::Ready(_))
    }
}

impl<T: Serialize> Serialize for Computed<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Computed::Ready(value) => value.serialize(serializer),
            Computed::InsufficientData { required, actual } => {
                let mut detail = BTreeMap::new();
                detail.insert("required", *required);
                detail.insert("actual", *actual);

                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("insufficient_data", &detail)?;
                map.end()
            }
        }
    }
}

/// Indicator values keyed by period ("9", "14", ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndicatorSet {
    /// Full EMA series, oldest first
    pub ema: BTreeMap<String, Computed<Vec<f64>>>,
    pub rsi: BTreeMap<String, Computed<f64>>,
    pub bollinger: BTreeMap<String, Computed<BollingerBands>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub current_price: f64,
    pub candle_count: usize,
    pub atr: f64,
    pub swing_highs: Vec<SwingPoint>,
    pub swing_lows: Vec<SwingPoint>,
    pub highest_swing_high: Option<SwingExtreme>,
    pub lowest_swing_low: Option<SwingExtreme>,
    pub order_blocks: Vec<OrderBlock>,
    pub volume_order_blocks: Vec<VolumeOrderBlock>,
    pub fair_value_gaps: FairValueGaps,
    /// BOS and CHoCH events merged in time order
    pub structure_events: Vec<StructureEvent>,
    /// CHoCH state after the last candle
    pub structure_bias: Option<Direction>,
    pub liquidity_pools: Vec<LiquidityPool>,
    pub indicators: IndicatorSet,
    pub trend_classification: MarketTrend,
}

impl AnalysisReport {
    /// Entry / stop / target for the classified trend
    pub fn trade_levels(
        &self,
        calculator: &LevelCalculator,
    ) -> Result<TradeLevels, AnalysisError> {
        calculator.calculate(
            self.current_price,
            self.atr,
            self.trend_classification.as_str(),
        )
    }

    pub fn ema(&self, period: usize) -> Option<f64> {
        self.indicators
            .ema
            .get(&period.to_string())
            .and_then(|c| c.value())
            .and_then(|series| series.last().copied())
    }

    pub fn rsi(&self, period: usize) -> Option<f64> {
        self.indicators
            .rsi
            .get(&period.to_string())
            .and_then(|c| c.value())
            .copied()
    }
}

/// Run the full analysis
///
/// Fails when the series is too short for ATR or the swing scan, when a
/// configured parameter is invalid, or with `MalformedInput` when prices are
/// large enough to overflow a computed value. Indicators whose window exceeds
/// the series are reported as `Computed::InsufficientData`.
pub fn analyze(
    series: &CandleSeries,
    config: &AnalysisConfig,
) -> Result<AnalysisReport, AnalysisError> {
    let current_price = series.current_price()?;
    let atr = ensure_finite(calculate_atr(series, config.atr_period)?, "ATR")?;
    let swings = detect_swing_points(series, config.swing_lookback)?;

    let extremes = swing_extremes(&swings);
    let order_blocks = extract_order_blocks(series, &swings, atr);
    let volume_order_blocks = find_volume_order_blocks(series)?;
    let fair_value_gaps = detect_fair_value_gaps(series)?;
    let liquidity_pools = find_liquidity_pools(series)?;

    let bos = detect_break_of_structure(series, &swings);
    let choch = detect_change_of_character(series, &swings);
    let mut structure_events: Vec<StructureEvent> =
        bos.into_iter().chain(choch.events.iter().copied()).collect();
    // Stable: BOS stays ahead of CHoCH on the same candle
    structure_events.sort_by_key(|e| e.timestamp);

    let trend_classification = classify_market_structure(&swings);
    let indicators = compute_indicators(series, config)?;

    tracing::debug!(
        "Analyzed {} candles: atr={:.4}, {} swing highs, {} swing lows, {} order blocks, {} FVGs, trend={}",
        series.len(),
        atr,
        swings.highs.len(),
        swings.lows.len(),
        order_blocks.len(),
        fair_value_gaps.len(),
        trend_classification
    );

    Ok(AnalysisReport {
        current_price,
        candle_count: series.len(),
        atr,
        swing_highs: swings.highs,
        swing_lows: swings.lows,
        highest_swing_high: extremes.highest_swing_high,
        lowest_swing_low: extremes.lowest_swing_low,
        order_blocks,
        volume_order_blocks,
        fair_value_gaps,
        structure_events,
        structure_bias: choch.final_bias,
        liquidity_pools,
        indicators,
        trend_classification,
    })
}

fn compute_indicators(
    series: &CandleSeries,
    config: &AnalysisConfig,
) -> Result<IndicatorSet, AnalysisError> {
    let closes = series.closes();
    let mut indicators = IndicatorSet::default();

    for &period in &config.ema_periods {
        let ema = Computed::from_result(calculate_ema(&closes, period).and_then(|values| {
            for &value in &values {
                ensure_finite(value, "EMA")?;
            }
            Ok(values)
        }))?;
        indicators.ema.insert(period.to_string(), ema);
    }

    for &period in &config.rsi_periods {
        let rsi = Computed::from_result(
            calculate_rsi(&closes, period).and_then(|value| ensure_finite(value, "RSI")),
        )?;
        indicators.rsi.insert(period.to_string(), rsi);
    }

    for setting in &config.bollinger {
        let bands = Computed::from_result(
            calculate_bollinger_bands(&closes, setting.period, setting.multiplier).and_then(
                |bands| {
                    ensure_finite(bands.upper_band, "Bollinger upper band")?;
                    ensure_finite(bands.lower_band, "Bollinger lower band")?;
                    Ok(bands)
                },
            ),
        )?;
        indicators.bollinger.insert(setting.period.to_string(), bands);
    }

    Ok(indicators)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DominantTrend {
    Bullish,
    Bearish,
    Neutral,
}

impl DominantTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            DominantTrend::Bullish => "BULLISH",
            DominantTrend::Bearish => "BEARISH",
            DominantTrend::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for DominantTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeframeTrend {
    pub timeframe: Timeframe,
    pub trend: MarketTrend,
}

/// Agreement of trend classifications across timeframes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeframeConfluence {
    pub timeframes: Vec<TimeframeTrend>,
    pub bullish_signals: usize,
    pub bearish_signals: usize,
    /// Margin between the bullish and bearish timeframe counts
    pub conflicting_signals: usize,
    /// Share of timeframes backing the dominant trend (0.5 when neutral)
    pub timeframe_agreement: f64,
    pub dominant_trend: DominantTrend,
}

impl TimeframeConfluence {
    pub fn from_reports(reports: &[(Timeframe, &AnalysisReport)]) -> Self {
        let timeframes: Vec<TimeframeTrend> = reports
            .iter()
            .map(|(timeframe, report)| TimeframeTrend {
                timeframe: *timeframe,
                trend: report.trend_classification,
            })
            .collect();

        let bullish = timeframes.iter().filter(|t| t.trend.is_bullish()).count();
        let bearish = timeframes.iter().filter(|t| t.trend.is_bearish()).count();
        let total = timeframes.len();

        let (dominant_trend, timeframe_agreement) = if bullish > bearish {
            (DominantTrend::Bullish, bullish as f64 / total as f64)
        } else if bearish > bullish {
            (DominantTrend::Bearish, bearish as f64 / total as f64)
        } else {
            (DominantTrend::Neutral, 0.5)
        };

        Self {
            timeframes,
            bullish_signals: bullish,
            bearish_signals: bearish,
            conflicting_signals: bullish.abs_diff(bearish),
            timeframe_agreement,
            dominant_trend,
        }
    }
}
