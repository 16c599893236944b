/// Relative Strength Index (RSI), 0..=100
///
/// Above 70 reads as overbought, below 30 as oversold.
///
/// Gains and losses are smoothed with Wilder's `alpha = 1 / period`, seeded
/// with the first price's (zero) change. Degenerate averages saturate instead
/// of dividing by zero: no losses gives 100, no movement at all gives 50.

use crate::error::{ensure_len, ensure_period, AnalysisError};
use crate::indicators::moving_average::exponential_smoothing;

/// RSI returned when neither gains nor losses have been observed
pub const NEUTRAL_RSI: f64 = 50.0;

pub fn calculate_rsi(prices: &[f64], period: usize) -> Result<f64, AnalysisError> {
    let series = calculate_rsi_series(prices, period)?;
    series
        .last()
        .copied()
        .ok_or_else(|| AnalysisError::insufficient(period + 1, prices.len()))
}

/// RSI for every price, aligned with the input
pub fn calculate_rsi_series(prices: &[f64], period: usize) -> Result<Vec<f64>, AnalysisError> {
    ensure_period(period, "RSI")?;
    ensure_len(prices.len(), period + 1)?;

    let mut gains = Vec::with_capacity(prices.len());
    let mut losses = Vec::with_capacity(prices.len());
    gains.push(0.0);
    losses.push(0.0);

    for pair in prices.windows(2) {
        let change = pair[1] - pair[0];
        gains.push(change.max(0.0));
        losses.push((-change).max(0.0));
    }

    let alpha = 1.0 / period as f64;
    let avg_gains = exponential_smoothing(&gains, alpha);
    let avg_losses = exponential_smoothing(&losses, alpha);

    Ok(avg_gains
        .iter()
        .zip(avg_losses.iter())
        .map(|(&avg_gain, &avg_loss)| rsi_from_averages(avg_gain, avg_loss))
        .collect())
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 {
            return NEUTRAL_RSI;
        }
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}
