use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde_json::Value;
use smcbot::api::{BinanceClient, CandleSource};
use smcbot::report::{analyze, AnalysisReport, TimeframeConfluence};
use smcbot::synthetic::{MarketScenario, SyntheticDataGenerator};
use smcbot::tools::{tool_declarations, DryRunOrderSink, ToolExecutor};
use smcbot::{AppConfig, CandleSeries, LevelCalculator, Timeframe};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about = "Smart Money Concept market analysis")]
struct Cli {
    /// Config file (smcbot.toml by default, optional)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis and print the report as JSON
    Analyze {
        #[command(flatten)]
        market: MarketArgs,

        /// Print the compact JSON on one line
        #[arg(long)]
        compact: bool,
    },

    /// Entry, stop-loss and take-profit from the classified trend
    Levels {
        #[command(flatten)]
        market: MarketArgs,
    },

    /// Compare trend classification across timeframes
    Confluence {
        #[arg(long)]
        symbol: Option<String>,

        /// Comma-separated timeframes
        #[arg(long, default_value = "15m,1h,4h")]
        timeframes: String,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Invoke an agent tool by name with JSON arguments (orders are dry-run)
    Tool {
        /// Tool name; omit to list the declarations
        name: Option<String>,

        /// Arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },

    /// Analyze seeded synthetic candles, no network needed
    Demo {
        /// uptrend, downtrend, sideways or volatile (all when omitted)
        #[arg(long)]
        scenario: Option<String>,

        #[arg(long, default_value = "200")]
        count: usize,

        #[arg(long, default_value = "42")]
        seed: u64,
    },
}

#[derive(clap::Args)]
struct MarketArgs {
    /// Trading pair, e.g. SOLUSDT or SOL/USDT
    #[arg(long)]
    symbol: Option<String>,

    /// Candle interval (1m .. 1w)
    #[arg(long)]
    timeframe: Option<String>,

    /// Number of candles to fetch
    #[arg(long)]
    limit: Option<usize>,

    /// Read candles from a JSON file of [timestamp, open, high, low, close, volume] rows
    #[arg(long)]
    input: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    }
    .context("Failed to load configuration")?;

    match cli.command {
        Commands::Analyze { market, compact } => {
            let series = load_series(&config, &market).await?;
            let report = analyze(&series, &config.analysis).context("Analysis failed")?;
            let json = if compact {
                serde_json::to_string(&report)?
            } else {
                serde_json::to_string_pretty(&report)?
            };
            println!("{}", json);
        }
        Commands::Levels { market } => {
            let series = load_series(&config, &market).await?;
            let report = analyze(&series, &config.analysis).context("Analysis failed")?;
            print_levels(&report, &config.levels);
        }
        Commands::Confluence {
            symbol,
            timeframes,
            limit,
        } => {
            run_confluence(&config, symbol, &timeframes, limit).await?;
        }
        Commands::Tool { name, args } => {
            run_tool(&config, name, &args).await?;
        }
        Commands::Demo {
            scenario,
            count,
            seed,
        } => {
            run_demo(&config, scenario, count, seed)?;
        }
    }

    Ok(())
}

fn setup_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("smcbot=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn load_series(config: &AppConfig, market: &MarketArgs) -> anyhow::Result<CandleSeries> {
    if let Some(path) = &market.input {
        return read_series(path);
    }

    let symbol = market
        .symbol
        .clone()
        .unwrap_or_else(|| config.default_symbol.clone());
    let timeframe = match &market.timeframe {
        Some(raw) => parse_timeframe(raw)?,
        None => config.default_timeframe,
    };
    let limit = market.limit.unwrap_or(config.default_limit);

    tracing::info!("Fetching {} {} candles for {}", limit, timeframe, symbol);

    let client = BinanceClient::from_config(config).context("Failed to build Binance client")?;
    let series = client
        .fetch_candles(&symbol, timeframe, limit)
        .await
        .with_context(|| format!("Failed to fetch candles for {}", symbol))?;
    log_latest_candle(&series);
    Ok(series)
}

fn log_latest_candle(series: &CandleSeries) {
    if let Some(opened) = series.last().and_then(|c| c.open_time()) {
        tracing::info!("Latest candle opened at {}", opened.format("%Y-%m-%d %H:%M UTC"));
    }
}

fn read_series(path: &Path) -> anyhow::Result<CandleSeries> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let rows: Vec<[f64; 6]> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not an array of OHLCV rows", path.display()))?;

    tracing::info!("Loaded {} candles from {}", rows.len(), path.display());

    let series = CandleSeries::from_rows(&rows)
        .with_context(|| format!("Invalid candles in {}", path.display()))?;
    log_latest_candle(&series);
    Ok(series)
}

fn parse_timeframe(raw: &str) -> anyhow::Result<Timeframe> {
    raw.parse::<Timeframe>().map_err(anyhow::Error::msg)
}

fn print_levels(report: &AnalysisReport, calculator: &LevelCalculator) {
    println!("💰 Current price: {:.4}", report.current_price);
    println!("📏 ATR: {:.4}", report.atr);
    println!("🧭 Trend: {}", report.trend_classification);

    match report.trade_levels(calculator) {
        Ok(levels) => {
            println!("🎯 {} setup", levels.side);
            println!("   Entry:       {:.4}", levels.entry);
            println!("   Stop loss:   {:.4}", levels.stop_loss);
            println!("   Take profit: {:.4}", levels.take_profit);
            if let Some(rr) = levels.risk_reward() {
                println!("   Risk/reward: {:.2}", rr);
            }
        }
        Err(e) => println!("⏸️  {}", e),
    }
}

async fn run_confluence(
    config: &AppConfig,
    symbol: Option<String>,
    timeframes: &str,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let symbol = symbol.unwrap_or_else(|| config.default_symbol.clone());
    let limit = limit.unwrap_or(config.default_limit);
    let timeframes = timeframes
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(parse_timeframe)
        .collect::<anyhow::Result<Vec<_>>>()?;
    if timeframes.is_empty() {
        bail!("No timeframes given");
    }

    let client = BinanceClient::from_config(config).context("Failed to build Binance client")?;

    let mut reports = Vec::with_capacity(timeframes.len());
    for timeframe in timeframes {
        let series = client
            .fetch_candles(&symbol, timeframe, limit)
            .await
            .with_context(|| format!("Failed to fetch {} candles for {}", timeframe, symbol))?;
        match analyze(&series, &config.analysis) {
            Ok(report) => reports.push((timeframe, report)),
            Err(e) => tracing::warn!("Skipping {} for {}: {}", timeframe, symbol, e),
        }
    }

    let refs: Vec<(Timeframe, &AnalysisReport)> = reports.iter().map(|(tf, r)| (*tf, r)).collect();
    let confluence = TimeframeConfluence::from_reports(&refs);

    for entry in &confluence.timeframes {
        println!("  {:>4}  {}", entry.timeframe, entry.trend);
    }
    println!(
        "📊 {} ({} bullish / {} bearish, agreement {:.0}%)",
        confluence.dominant_trend,
        confluence.bullish_signals,
        confluence.bearish_signals,
        confluence.timeframe_agreement * 100.0
    );

    Ok(())
}

async fn run_tool(config: &AppConfig, name: Option<String>, args: &str) -> anyhow::Result<()> {
    let Some(name) = name else {
        println!("{}", serde_json::to_string_pretty(&tool_declarations())?);
        return Ok(());
    };

    let arguments: Value =
        serde_json::from_str(args).context("--args must be a JSON object")?;

    let client = BinanceClient::from_config(config).context("Failed to build Binance client")?;
    let executor = ToolExecutor::with_config(client, DryRunOrderSink::new(), config);

    let result = executor
        .execute_named(&name, &arguments)
        .await
        .with_context(|| format!("Tool {} failed", name))?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}

fn run_demo(
    config: &AppConfig,
    scenario: Option<String>,
    count: usize,
    seed: u64,
) -> anyhow::Result<()> {
    let scenarios = match scenario {
        Some(raw) => vec![raw.parse::<MarketScenario>().map_err(anyhow::Error::msg)?],
        None => MarketScenario::all().to_vec(),
    };
    let timeframe = config.default_timeframe;

    for scenario in scenarios {
        let series = SyntheticDataGenerator::new(seed)
            .generate(scenario, count, timeframe, Utc::now().timestamp_millis())
            .context("Synthetic candles failed validation")?;
        let report = analyze(&series, &config.analysis)
            .with_context(|| format!("Analysis of {:?} failed", scenario))?;

        println!("\n=== {:?} ({} x {}) ===", scenario, count, timeframe);
        println!(
            "  swings: {} highs / {} lows, order blocks: {}, FVGs: {}, events: {}, pools: {}",
            report.swing_highs.len(),
            report.swing_lows.len(),
            report.order_blocks.len(),
            report.fair_value_gaps.len(),
            report.structure_events.len(),
            report.liquidity_pools.len()
        );
        if let Some(rsi) = report.rsi(14) {
            println!("  RSI(14): {:.2}", rsi);
        }
        print_levels(&report, &config.levels);
    }

    Ok(())
}
