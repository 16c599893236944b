/// Average True Range (ATR), the volatility yardstick for order-block sizing
/// and trade levels
///
/// True range of candle `i` (from the second candle on) is the largest of
/// `high - low`, `|high - prev_close|` and `|low - prev_close|`.
///
/// Uses Wilder's smoothing: the first ATR is the simple mean of the first
/// `period` true ranges, then `atr = (atr * (period - 1) + tr) / period`.

use crate::error::{ensure_len, ensure_period, AnalysisError};
use crate::models::CandleSeries;

/// True ranges for candles 1..n (the first candle has no previous close)
pub fn calculate_true_ranges(series: &CandleSeries) -> Vec<f64> {
    series
        .candles()
        .windows(2)
        .map(|pair| {
            let prev_close = pair[0].close;
            let high = pair[1].high;
            let low = pair[1].low;

            (high - low)
                .max((high - prev_close).abs())
                .max((low - prev_close).abs())
        })
        .collect()
}

/// Calculate the current ATR
///
/// Fails with `InsufficientData(period + 1, n)` when the series is too short
pub fn calculate_atr(series: &CandleSeries, period: usize) -> Result<f64, AnalysisError> {
    let atr_series = calculate_atr_series(series, period)?;
    atr_series
        .last()
        .copied()
        .ok_or_else(|| AnalysisError::insufficient(period + 1, series.len()))
}

/// Calculate ATR and return all intermediate values
///
/// The first value corresponds to candle index `period`, the last to the newest candle
pub fn calculate_atr_series(
    series: &CandleSeries,
    period: usize,
) -> Result<Vec<f64>, AnalysisError> {
    ensure_period(period, "ATR")?;
    ensure_len(series.len(), period + 1)?;

    let true_ranges = calculate_true_ranges(series);
    let period_f = period as f64;

    let mut atr_series = Vec::with_capacity(true_ranges.len() - period + 1);

    let first_atr: f64 = true_ranges.iter().take(period).sum::<f64>() / period_f;
    atr_series.push(first_atr);

    let mut atr = first_atr;
    for tr in &true_ranges[period..] {
        atr = (atr * (period_f - 1.0) + tr) / period_f;
        atr_series.push(atr);
    }

    Ok(atr_series)
}
