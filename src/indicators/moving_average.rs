use crate::error::{ensure_len, ensure_period, AnalysisError};

/// Calculate Simple Moving Average (SMA) of the trailing `period` values
pub fn calculate_sma(prices: &[f64], period: usize) -> Result<f64, AnalysisError> {
    ensure_period(period, "SMA")?;
    ensure_len(prices.len(), period)?;

    let sum: f64 = prices.iter().rev().take(period).sum();
    Ok(sum / period as f64)
}

/// Calculate Exponential Moving Average (EMA) over the whole series
///
/// Seeded by the first price (not an SMA), with `alpha = 2 / (period + 1)`:
/// `ema[0] = p[0]`, `ema[i] = alpha * p[i] + (1 - alpha) * ema[i - 1]`.
/// Returns one value per input price; callers usually want the last one.
pub fn calculate_ema(prices: &[f64], period: usize) -> Result<Vec<f64>, AnalysisError> {
    ensure_period(period, "EMA")?;
    ensure_len(prices.len(), period)?;

    let alpha = 2.0 / (period as f64 + 1.0);
    Ok(exponential_smoothing(prices, alpha))
}

/// Recursive exponential smoothing seeded with the first value
pub(crate) fn exponential_smoothing(values: &[f64], alpha: f64) -> Vec<f64> {
    let mut smoothed = Vec::with_capacity(values.len());
    let mut iter = values.iter();

    if let Some(&first) = iter.next() {
        let mut current = first;
        smoothed.push(current);
        for &value in iter {
            current = alpha * value + (1.0 - alpha) * current;
            smoothed.push(current);
        }
    }

    smoothed
}
