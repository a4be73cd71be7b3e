//! Arb Trader - cross-venue spot arbitrage daemon

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::{fmt, EnvFilter};

use crypto_arb_trader::adapters::cli::{self, Command, RunCmd, ScanCmd};
use crypto_arb_trader::adapters::process::{self, PidFile};
use crypto_arb_trader::adapters::{ExchangeClient, ExchangeKind, YahooFinanceSource};
use crypto_arb_trader::application::{LoopTiming, TraderLoop};
use crypto_arb_trader::config::{load_config, Config, LoggingSection};
use crypto_arb_trader::domain::{Asset, TradingMode};
use crypto_arb_trader::strategy::ArbitrageParams;

type Trader = TraderLoop<YahooFinanceSource, ExchangeClient>;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (secrets go here, not in the TOML file)
    dotenvy::dotenv().ok();

    let app = cli::init();
    let level_override = app.level_override();

    match app.command {
        Command::Run(cmd) => run_command(cmd, level_override).await,
        Command::Scan(cmd) => scan_command(cmd, level_override).await,
    }
}

/// Flags win over RUST_LOG, which wins over the config file
fn init_logging(logging: &LoggingSection, level_override: Option<&str>) -> Result<()> {
    let filter = match level_override {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&logging.level)),
    };

    if logging.log_to_file {
        let path = shellexpand::tilde(&logging.log_file).to_string();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {}", path))?;

        fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        fmt().with_env_filter(filter).with_target(false).init();
    }

    Ok(())
}

fn build_trader(config: &Config, kind: ExchangeKind, mode: TradingMode) -> Result<Trader> {
    let market_data = YahooFinanceSource::new(&config.market_data, config.http.timeout())
        .context("Failed to create market data source")?;

    let exchange = ExchangeClient::connect(
        kind,
        config.exchanges.venue(kind),
        mode,
        config.http.timeout(),
    )
    .with_context(|| format!("Failed to initialize {} client", kind))?;

    TraderLoop::new(
        market_data,
        exchange,
        ArbitrageParams::from(config),
        config.market_data.window(),
        LoopTiming::from(&config.schedule),
    )
    .context("Failed to create trader")
}

async fn run_command(cmd: RunCmd, level_override: Option<&str>) -> Result<()> {
    let config = load_config(&cmd.config)
        .with_context(|| format!("Failed to load configuration from {}", cmd.config.display()))?;
    init_logging(&config.logging, level_override)?;

    let mode = cmd.mode();
    tracing::info!("Starting arbitrage trader on {} ({} mode)", cmd.exchange, mode);
    if mode.is_test() {
        tracing::warn!("TEST MODE - orders are logged, never submitted");
    }

    process::set_umask(process::DAEMON_UMASK);
    if let Some(dir) = config.daemon.working_dir_path() {
        process::enter_working_dir(&dir)?;
    }

    let pid_path = cmd.pid_file.clone().unwrap_or_else(|| config.daemon.pid_path());
    let _pid_file = PidFile::acquire(&pid_path)?;

    let mut trader = build_trader(&config, cmd.exchange, mode)?;
    process::forward_signals(trader.shutdown_handle())?;

    let summary = trader.run().await;
    tracing::info!(
        "Trader stopped after {} cycles ({} failed)",
        summary.cycles,
        summary.failures
    );
    Ok(())
}

async fn scan_command(cmd: ScanCmd, level_override: Option<&str>) -> Result<()> {
    let config = load_config(&cmd.config)
        .with_context(|| format!("Failed to load configuration from {}", cmd.config.display()))?;
    init_logging(&config.logging, level_override)?;

    let mut trader = build_trader(&config, cmd.exchange, TradingMode::Test)?;
    let opportunities = trader.evaluate().await;

    if trader.snapshot().is_none() {
        anyhow::bail!("Market data unavailable; nothing to evaluate");
    }

    println!(
        "{} opportunities on {} (threshold {}%)",
        opportunities.len(),
        cmd.exchange,
        config.strategy.threshold_pct
    );
    for asset in Asset::ALL {
        if let Some(opportunity) = opportunities.get(&asset) {
            println!("  {}", opportunity);
        }
    }

    Ok(())
}
