/// Application configuration
///
/// Layered from (lowest to highest priority):
/// - built-in defaults
/// - an optional `smcbot.toml` in the working directory
/// - `SMCBOT__*` environment variables (after loading `.env`), with `__`
///   separating nested keys, e.g. `SMCBOT__ANALYSIS__SWING_LOOKBACK=3`

use crate::levels::LevelCalculator;
use crate::models::Timeframe;
use crate::report::AnalysisConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "smcbot";
pub const ENV_PREFIX: &str = "SMCBOT";

pub const BINANCE_FUTURES_API_BASE: &str = "https://fapi.binance.com";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub binance_base_url: String,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    /// First retry delay; doubles on every further attempt
    pub retry_backoff_ms: u64,
    pub rate_limit_per_minute: u32,
    pub default_symbol: String,
    pub default_timeframe: Timeframe,
    pub default_limit: usize,
    pub analysis: AnalysisConfig,
    pub levels: LevelCalculator,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            binance_base_url: BINANCE_FUTURES_API_BASE.to_string(),
            request_timeout_secs: 30,
            max_retries: 3,
            retry_backoff_ms: 2000,
            rate_limit_per_minute: 1200,
            default_symbol: "SOLUSDT".to_string(),
            default_timeframe: Timeframe::Hour1,
            default_limit: 100,
            analysis: AnalysisConfig::default(),
            levels: LevelCalculator::default(),
        }
    }
}

impl AppConfig {
    /// Load `.env`, then `smcbot.toml` (if present) and the environment
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load from a specific config file (extension optional, file optional)
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        Self::build(Config::builder().add_source(File::with_name(path).required(false)))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let config: AppConfig = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_retries == 0 {
            return Err(ConfigError::Message(
                "max_retries must be at least 1".to_string(),
            ));
        }
        if self.rate_limit_per_minute == 0 {
            return Err(ConfigError::Message(
                "rate_limit_per_minute must be at least 1".to_string(),
            ));
        }
        if self.default_limit == 0 {
            return Err(ConfigError::Message(
                "default_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
