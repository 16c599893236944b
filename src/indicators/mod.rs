// Technical indicators module
// Implements ATR, EMA/SMA, RSI and Bollinger Bands over candle data

pub mod atr;
pub mod bollinger;
pub mod moving_average;
pub mod rsi;

pub use atr::{calculate_atr, calculate_atr_series, calculate_true_ranges};
pub use bollinger::{calculate_bollinger_bands, BollingerBands};
pub use moving_average::{calculate_ema, calculate_sma};
pub use rsi::{calculate_rsi, calculate_rsi_series, NEUTRAL_RSI};
