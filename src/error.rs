use thiserror::Error;

/// Errors raised by the analysis core
///
/// All of these are deterministic: retrying the same call with the same
/// candles yields the same error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// The series is shorter than the computation's window
    #[error("insufficient data: need {required} candles, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// A candle violates the OHLC invariant or series ordering
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The trend gives no direction to trade
    #[error("no trade setup: {0}")]
    NoSetup(String),

    /// A period, multiplier or price argument is out of range
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl AnalysisError {
    pub fn insufficient(required: usize, actual: usize) -> Self {
        Self::InsufficientData { required, actual }
    }
}

/// Fail with `InsufficientData` when fewer than `required` values are available
pub(crate) fn ensure_len(actual: usize, required: usize) -> Result<(), AnalysisError> {
    if actual < required {
        return Err(AnalysisError::insufficient(required, actual));
    }
    Ok(())
}

pub(crate) fn ensure_period(period: usize, name: &str) -> Result<(), AnalysisError> {
    if period == 0 {
        return Err(AnalysisError::InvalidParameter(format!(
            "{} period must be at least 1",
            name
        )));
    }
    Ok(())
}

/// Fail with `MalformedInput` when a derived value overflowed to inf or NaN
pub(crate) fn ensure_finite(value: f64, name: &str) -> Result<f64, AnalysisError> {
    if !value.is_finite() {
        return Err(AnalysisError::MalformedInput(format!(
            "{} is not finite ({}); candle prices are out of range",
            name, value
        )));
    }
    Ok(value)
}
