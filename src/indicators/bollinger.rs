//! Bollinger Bands indicator

use crate::error::{ensure_len, ensure_period, AnalysisError};
use crate::indicators::moving_average::calculate_sma;
use serde::Serialize;

/// Bands over the trailing window ending at the newest price
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BollingerBands {
    pub upper_band: f64,
    pub sma: f64,
    pub lower_band: f64,
}

impl BollingerBands {
    pub fn width(&self) -> f64 {
        self.upper_band - self.lower_band
    }
}

/// Rolling mean and population standard deviation (ddof = 0) of the last
/// `period` prices; bands sit `multiplier` deviations from the mean
pub fn calculate_bollinger_bands(
    prices: &[f64],
    period: usize,
    multiplier: f64,
) -> Result<BollingerBands, AnalysisError> {
    ensure_period(period, "Bollinger")?;
    if !multiplier.is_finite() || multiplier < 0.0 {
        return Err(AnalysisError::InvalidParameter(format!(
            "Bollinger multiplier must be a non-negative number, got {}",
            multiplier
        )));
    }
    ensure_len(prices.len(), period)?;

    let window = &prices[prices.len() - period..];
    let sma = calculate_sma(window, period)?;
    let variance = window.iter().map(|p| (p - sma).powi(2)).sum::<f64>() / period as f64;
    let std_dev = variance.sqrt();

    Ok(BollingerBands {
        upper_band: sma + multiplier * std_dev,
        sma,
        lower_band: sma - multiplier * std_dev,
    })
}
