use smcbot::indicators::{
    calculate_atr, calculate_atr_series, calculate_ema, calculate_rsi, calculate_rsi_series,
    NEUTRAL_RSI,
};
use smcbot::report::{BollingerSetting, Computed};
use smcbot::structure::{
    detect_break_of_structure, detect_fair_value_gaps, detect_swing_points,
    extract_order_blocks, find_liquidity_pools, find_volume_order_blocks, Direction,
    StructureEventKind,
};
use smcbot::synthetic::{MarketScenario, SyntheticDataGenerator};
use smcbot::*;

const HOUR: i64 = 3_600_000;

fn create_test_candles(rows: &[(f64, f64, f64, f64)]) -> CandleSeries {
    let candles = rows
        .iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| {
            Candle::new(i as i64 * HOUR, open, high, low, close, 1000.0)
        })
        .collect();
    CandleSeries::new(candles).unwrap()
}

fn volatile_series(seed: u64, count: usize) -> CandleSeries {
    SyntheticDataGenerator::new(seed)
        .generate(MarketScenario::Volatile, count, Timeframe::Hour1, 1_700_000_000_000)
        .unwrap()
}

/// Reverse time and negate prices: highs become lows and vice versa
fn mirror(series: &CandleSeries) -> CandleSeries {
    let candles = series
        .candles()
        .iter()
        .rev()
        .enumerate()
        .map(|(i, c)| Candle::new(i as i64 * HOUR, -c.close, -c.low, -c.high, -c.open, c.volume))
        .collect();
    CandleSeries::new(candles).unwrap()
}

#[test]
fn test_atr_converges_under_constant_true_range() {
    let rows: Vec<_> = (0..40).map(|_| (100.0, 101.0, 99.0, 100.0)).collect();
    let series = create_test_candles(&rows);

    let atr_series = calculate_atr_series(&series, 14).unwrap();
    assert_eq!(atr_series.len(), 40 - 14);
    for atr in atr_series {
        assert!((atr - 2.0).abs() < 1e-12, "ATR drifted to {}", atr);
    }
}

#[test]
fn test_atr_insufficient_data() {
    let rows: Vec<_> = (0..5).map(|_| (100.0, 101.0, 99.0, 100.0)).collect();
    let series = create_test_candles(&rows);

    assert_eq!(
        calculate_atr(&series, 14),
        Err(AnalysisError::insufficient(15, 5))
    );
}

#[test]
fn test_ema_period_one_is_identity() {
    let prices = [3.0, 7.5, 1.25, 9.0, 4.0];
    assert_eq!(calculate_ema(&prices, 1).unwrap(), prices.to_vec());
}

#[test]
fn test_rsi_bounds_and_saturation() {
    let series = volatile_series(3, 150);
    for rsi in calculate_rsi_series(&series.closes(), 14).unwrap() {
        assert!((0.0..=100.0).contains(&rsi), "RSI out of range: {}", rsi);
    }

    let rising: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
    assert_eq!(calculate_rsi(&rising, 14).unwrap(), 100.0);

    let falling: Vec<f64> = rising.iter().rev().copied().collect();
    assert_eq!(calculate_rsi(&falling, 14).unwrap(), 0.0);
}

#[test]
fn test_swing_mirror_symmetry() {
    let series = volatile_series(11, 120);
    let mirrored = mirror(&series);
    let n = series.len();

    let swings = detect_swing_points(&series, 3).unwrap();
    let mirror_swings = detect_swing_points(&mirrored, 3).unwrap();

    assert!(!swings.highs.is_empty() && !swings.lows.is_empty());

    let mut expected_highs: Vec<(usize, f64)> = swings
        .lows
        .iter()
        .map(|p| (n - 1 - p.index, -p.price))
        .collect();
    expected_highs.sort_by_key(|&(i, _)| i);
    let mirror_highs: Vec<(usize, f64)> =
        mirror_swings.highs.iter().map(|p| (p.index, p.price)).collect();
    assert_eq!(mirror_highs, expected_highs);

    let mut expected_lows: Vec<(usize, f64)> = swings
        .highs
        .iter()
        .map(|p| (n - 1 - p.index, -p.price))
        .collect();
    expected_lows.sort_by_key(|&(i, _)| i);
    let mirror_lows: Vec<(usize, f64)> =
        mirror_swings.lows.iter().map(|p| (p.index, p.price)).collect();
    assert_eq!(mirror_lows, expected_lows);
}

#[test]
fn test_fvg_directions_are_exclusive() {
    for seed in [1, 2, 3, 4, 5] {
        let series = volatile_series(seed, 200);
        let gaps = detect_fair_value_gaps(&series).unwrap();

        for bullish in &gaps.bullish {
            assert!(
                gaps.bearish.iter().all(|b| b.timestamp != bullish.timestamp),
                "triple at {} produced both directions",
                bullish.timestamp
            );
            assert!(bullish.top < bullish.bottom);
        }
        for bearish in &gaps.bearish {
            assert!(bearish.top > bearish.bottom);
        }
    }
}

#[test]
fn test_bullish_fvg_keeps_raw_bounds() {
    let series = create_test_candles(&[
        (9.0, 10.0, 8.0, 9.5),
        (9.5, 16.0, 9.0, 15.5),
        (15.5, 17.0, 15.0, 16.5),
    ]);
    let gaps = detect_fair_value_gaps(&series).unwrap();

    assert_eq!(gaps.bullish.len(), 1);
    assert!(gaps.bearish.is_empty());

    let gap = gaps.bullish[0];
    assert_eq!(gap.top, 10.0);
    assert_eq!(gap.bottom, 15.0);
    assert_eq!(gap.timestamp, 0);
    assert_eq!(gap.kind, Direction::Bullish);
    assert_eq!((gap.lower(), gap.upper()), (10.0, 15.0));
}

#[test]
fn test_each_swing_breaks_at_most_once() {
    for seed in [7, 8, 9] {
        let series = volatile_series(seed, 250);
        let swings = detect_swing_points(&series, 2).unwrap();
        let events = detect_break_of_structure(&series, &swings);

        let bullish = events
            .iter()
            .filter(|e| e.kind == StructureEventKind::BosBullish)
            .count();
        let bearish = events
            .iter()
            .filter(|e| e.kind == StructureEventKind::BosBearish)
            .count();

        assert!(bullish <= swings.highs.len());
        assert!(bearish <= swings.lows.len());
        assert!(events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }
}

#[test]
fn test_analysis_is_idempotent() {
    let series = volatile_series(21, 150);
    let config = AnalysisConfig::default();

    let first = analyze(&series, &config).unwrap();
    let second = analyze(&series, &config).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_flat_market() {
    let rows: Vec<_> = (0..10).map(|_| (100.0, 100.0, 100.0, 100.0)).collect();
    let series = create_test_candles(&rows);

    let config = AnalysisConfig {
        atr_period: 5,
        swing_lookback: 4,
        ema_periods: vec![5],
        rsi_periods: vec![5],
        bollinger: vec![BollingerSetting {
            period: 5,
            multiplier: 2.0,
        }],
    };
    let report = analyze(&series, &config).unwrap();

    assert_eq!(report.atr, 0.0);
    assert_eq!(report.rsi(5), Some(NEUTRAL_RSI));
    assert_eq!(report.ema(5), Some(100.0));
    assert!(report.swing_highs.is_empty() && report.swing_lows.is_empty());
    assert!(report.highest_swing_high.is_none());
    assert!(report.order_blocks.is_empty());
    assert!(report.volume_order_blocks.is_empty());
    assert!(report.fair_value_gaps.is_empty());
    assert!(report.liquidity_pools.is_empty());
    assert!(report.structure_events.is_empty());
    assert_eq!(report.structure_bias, None);
    assert_eq!(report.trend_classification, MarketTrend::Undefined);

    match &report.indicators.bollinger["5"] {
        Computed::Ready(bands) => assert_eq!(bands.width(), 0.0),
        other => panic!("expected bands, got {:?}", other),
    }

    assert!(matches!(
        report.trade_levels(&LevelCalculator::default()),
        Err(AnalysisError::NoSetup(_))
    ));
}

#[test]
fn test_monotonic_rise_has_no_structure() {
    let rows: Vec<_> = (0..30)
        .map(|i| {
            let base = 100.0 + i as f64;
            (base, base + 1.5, base - 0.5, base + 1.0)
        })
        .collect();
    let series = create_test_candles(&rows);

    let report = analyze(&series, &AnalysisConfig::default()).unwrap();

    assert!(report.swing_highs.is_empty());
    assert!(report.swing_lows.is_empty());
    assert!(report.order_blocks.is_empty());
    assert!(report.structure_events.is_empty());
    // Each low sits exactly on the high two candles back: touching, not a gap
    assert!(report.fair_value_gaps.is_empty());
    assert_eq!(report.rsi(14), Some(100.0));
    assert_eq!(report.trend_classification, MarketTrend::Undefined);
}

#[test]
fn test_rising_closes_with_wicks_classify_bullish() {
    // Closes climb 0.2 per candle; every 12th candle carries a long upper
    // wick (offset 6) or a long lower wick (offset 0)
    let rows: Vec<_> = (0..30)
        .map(|i| {
            let close = 100.0 + 0.2 * i as f64;
            let open = close - 0.2;
            let upper = if i % 12 == 6 { 3.0 } else { 0.5 };
            let lower = if i % 12 == 0 { 3.0 } else { 0.5 };
            (open, close + upper, open - lower, close)
        })
        .collect();
    let series = create_test_candles(&rows);

    let report = analyze(&series, &AnalysisConfig::default()).unwrap();

    let highs: Vec<usize> = report.swing_highs.iter().map(|p| p.index).collect();
    let lows: Vec<usize> = report.swing_lows.iter().map(|p| p.index).collect();
    assert_eq!(highs, vec![6, 18]);
    assert_eq!(lows, vec![12, 24]);
    assert_eq!(report.trend_classification, MarketTrend::BullishTrend);
    assert_eq!(report.rsi(14), Some(100.0));

    let levels = report.trade_levels(&LevelCalculator::default()).unwrap();
    assert_eq!(levels.side, OrderSide::Buy);
    assert!(levels.stop_loss < levels.entry && levels.entry < levels.take_profit);
}

#[test]
fn test_overflowing_prices_fail_fast() {
    let wide = vec![Candle::new(0, 0.0, 1e308, -1e308, 0.0, 1.0)];
    assert!(matches!(
        CandleSeries::new(wide),
        Err(AnalysisError::MalformedInput(_))
    ));

    // Every candle is valid alone, but the gap between them overflows the true range
    let rows: Vec<_> = (0..12)
        .map(|i| {
            let price = if i < 6 { 1e308 } else { -1e308 };
            (price, price, price, price)
        })
        .collect();
    let series = create_test_candles(&rows);

    assert!(matches!(
        analyze(&series, &AnalysisConfig::default()),
        Err(AnalysisError::MalformedInput(_))
    ));
}

#[test]
fn test_detectors_on_swingless_series() {
    let rows: Vec<_> = (0..12).map(|_| (50.0, 51.0, 49.0, 50.0)).collect();
    let series = create_test_candles(&rows);
    let swings = detect_swing_points(&series, 5).unwrap();

    assert!(swings.is_empty());
    assert!(extract_order_blocks(&series, &swings, 1.0).is_empty());
    assert!(find_volume_order_blocks(&series).unwrap().is_empty());
    assert!(find_liquidity_pools(&series).unwrap().is_empty());
}

#[test]
fn test_malformed_candles_rejected() {
    let inverted = vec![Candle::new(0, 10.0, 9.0, 11.0, 10.0, 1.0)];
    assert!(matches!(
        CandleSeries::new(inverted),
        Err(AnalysisError::MalformedInput(_))
    ));

    let out_of_order = vec![
        Candle::new(HOUR, 10.0, 11.0, 9.0, 10.0, 1.0),
        Candle::new(0, 10.0, 11.0, 9.0, 10.0, 1.0),
    ];
    assert!(matches!(
        CandleSeries::new(out_of_order),
        Err(AnalysisError::MalformedInput(_))
    ));

    let nan_volume = vec![Candle::new(0, 10.0, 11.0, 9.0, 10.0, f64::NAN)];
    assert!(matches!(
        CandleSeries::new(nan_volume),
        Err(AnalysisError::MalformedInput(_))
    ));
}
