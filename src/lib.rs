// Analysis core (synchronous, no I/O)
pub mod error;
pub mod indicators;
pub mod levels;
pub mod models;
pub mod report;
pub mod structure;

// Collaborators
pub mod api;
pub mod config;
pub mod synthetic;
pub mod tools;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::AnalysisError;
pub use levels::{calculate_levels, LevelCalculator, OrderSide, TradeLevels};
pub use models::{Candle, CandleSeries, Timeframe};
pub use report::{analyze, AnalysisConfig, AnalysisReport, TimeframeConfluence};
pub use structure::MarketTrend;

// Error handling
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
