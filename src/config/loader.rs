//! Configuration Loader
//!
//! Loads and validates configuration from a TOML file. Every section has
//! defaults, so a file only needs the keys it changes. Credentials left empty
//! in the file are read from the environment.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::adapters::exchanges::{Credentials, ExchangeKind};
use crate::application::LoopTiming;
use crate::domain::TradingMode;
use crate::ports::HistoryWindow;
use crate::strategy::{ArbitrageParams, DEFAULT_THRESHOLD_PCT, DEFAULT_TRADE_QUANTITY};

/// Main configuration structure matching config/trader.toml
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub exchanges: ExchangesSection,
    pub market_data: MarketDataSection,
    pub strategy: StrategySection,
    pub schedule: ScheduleSection,
    pub http: HttpSection,
    pub logging: LoggingSection,
    pub daemon: DaemonSection,
}

/// Per-venue credential blocks
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExchangesSection {
    pub coinbase: VenueSection,
    pub gemini: VenueSection,
    pub binance: VenueSection,
}

impl ExchangesSection {
    pub fn venue(&self, kind: ExchangeKind) -> &VenueSection {
        match kind {
            ExchangeKind::Coinbase => &self.coinbase,
            ExchangeKind::Gemini => &self.gemini,
            ExchangeKind::Binance => &self.binance,
        }
    }
}

/// Credentials and endpoints for one venue
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VenueSection {
    pub api_key: String,
    pub api_secret: String,
    pub sandbox_key: String,
    pub sandbox_secret: String,
    /// Coinbase Exchange only
    pub passphrase: Option<String>,
    pub sandbox_passphrase: Option<String>,
    /// Defaults to the venue's usual dollar quote (USD, or USDT on Binance)
    pub quote_currency: Option<String>,
    /// Override the production REST base URL
    pub api_url: Option<String>,
    /// Override the sandbox REST base URL
    pub sandbox_url: Option<String>,
}

impl VenueSection {
    /// Pick the credential pair for the mode: sandbox in test mode,
    /// production otherwise. Empty values fall back to `<VENUE>_*` env vars.
    pub fn credentials(&self, kind: ExchangeKind, mode: TradingMode) -> Credentials {
        let prefix = kind.env_prefix();
        let (key, secret, passphrase, key_var, secret_var, pass_var) = match mode {
            TradingMode::Live => (
                &self.api_key,
                &self.api_secret,
                &self.passphrase,
                "API_KEY",
                "API_SECRET",
                "PASSPHRASE",
            ),
            TradingMode::Test => (
                &self.sandbox_key,
                &self.sandbox_secret,
                &self.sandbox_passphrase,
                "SANDBOX_KEY",
                "SANDBOX_SECRET",
                "SANDBOX_PASSPHRASE",
            ),
        };

        Credentials {
            key: with_env_fallback(key, &format!("{}_{}", prefix, key_var)),
            secret: with_env_fallback(secret, &format!("{}_{}", prefix, secret_var)),
            passphrase: passphrase
                .clone()
                .filter(|p| !p.is_empty())
                .or_else(|| std::env::var(format!("{}_{}", prefix, pass_var)).ok()),
        }
    }

    pub fn quote_currency(&self, kind: ExchangeKind) -> String {
        self.quote_currency
            .clone()
            .filter(|q| !q.is_empty())
            .unwrap_or_else(|| kind.default_quote_currency().to_string())
    }
}

fn with_env_fallback(value: &str, var: &str) -> String {
    if value.is_empty() {
        std::env::var(var).unwrap_or_default()
    } else {
        value.to_string()
    }
}

/// External price feed section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarketDataSection {
    /// Yahoo Finance chart API host
    pub base_url: String,
    /// Lookback range, e.g. "1d"
    pub period: String,
    /// Candle interval, e.g. "1h"
    pub interval: String,
    /// Currency the feed prices assets in
    pub quote_currency: String,
    /// Reject closes older than this
    pub max_staleness_secs: u64,
}

impl Default for MarketDataSection {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com".to_string(),
            period: "1d".to_string(),
            interval: "1h".to_string(),
            quote_currency: "USD".to_string(),
            max_staleness_secs: 7200,
        }
    }
}

impl MarketDataSection {
    pub fn window(&self) -> HistoryWindow {
        HistoryWindow::new(self.period.clone(), self.interval.clone())
    }
}

/// Strategy section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StrategySection {
    /// Minimum profit potential in percent
    pub threshold_pct: f64,
    /// Fixed order size in base units
    pub trade_quantity: f64,
}

impl Default for StrategySection {
    fn default() -> Self {
        Self {
            threshold_pct: DEFAULT_THRESHOLD_PCT,
            trade_quantity: DEFAULT_TRADE_QUANTITY,
        }
    }
}

/// Loop timing section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleSection {
    /// Seconds between trading cycles
    pub cadence_secs: u64,
    /// Seconds between schedule checks
    pub poll_secs: u64,
    /// Seconds to wait after a failed cycle
    pub backoff_secs: u64,
    /// Run the first cycle at startup
    pub run_on_start: bool,
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self {
            cadence_secs: 3600,
            poll_secs: 60,
            backoff_secs: 300,
            run_on_start: false,
        }
    }
}

/// HTTP client section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSection {
    pub timeout_secs: u64,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl HttpSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Write to the log file instead of stdout
    pub log_to_file: bool,
    pub log_file: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_to_file: false,
            log_file: "/var/log/crypto_trader.log".to_string(),
        }
    }
}

/// Process section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DaemonSection {
    pub pid_file: String,
    /// Directory to change into before the loop starts
    pub working_dir: Option<String>,
}

impl Default for DaemonSection {
    fn default() -> Self {
        Self {
            pid_file: "/var/run/crypto_trader.pid".to_string(),
            working_dir: Some("/var/lib/crypto_trader".to_string()),
        }
    }
}

impl DaemonSection {
    /// PID file path with `~` expanded
    pub fn pid_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.pid_file).to_string())
    }

    pub fn working_dir_path(&self) -> Option<PathBuf> {
        self.working_dir
            .as_ref()
            .filter(|d| !d.is_empty())
            .map(|d| PathBuf::from(shellexpand::tilde(d).to_string()))
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        ArbitrageParams::from(self)
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        if self.schedule.cadence_secs == 0 {
            return Err(ConfigError::ValidationError(
                "cadence_secs must be > 0".to_string(),
            ));
        }

        if self.schedule.poll_secs == 0 {
            return Err(ConfigError::ValidationError(
                "poll_secs must be > 0".to_string(),
            ));
        }

        if self.schedule.backoff_secs == 0 {
            return Err(ConfigError::ValidationError(
                "backoff_secs must be > 0".to_string(),
            ));
        }

        if self.market_data.base_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "market_data.base_url cannot be empty".to_string(),
            ));
        }

        if self.market_data.period.is_empty() || self.market_data.interval.is_empty() {
            return Err(ConfigError::ValidationError(
                "market_data.period and market_data.interval cannot be empty".to_string(),
            ));
        }

        if self.http.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "http.timeout_secs must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl From<&Config> for ArbitrageParams {
    fn from(config: &Config) -> Self {
        ArbitrageParams {
            threshold_pct: config.strategy.threshold_pct,
            trade_quantity: config.strategy.trade_quantity,
        }
    }
}

impl From<&ScheduleSection> for LoopTiming {
    fn from(schedule: &ScheduleSection) -> Self {
        LoopTiming {
            cadence: Duration::from_secs(schedule.cadence_secs),
            poll_interval: Duration::from_secs(schedule.poll_secs),
            error_backoff: Duration::from_secs(schedule.backoff_secs),
            run_on_start: schedule.run_on_start,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> String {
        r#"
[exchanges.coinbase]
api_key = "cb-live-key"
api_secret = "cb-live-secret"
sandbox_key = "cb-sandbox-key"
sandbox_secret = "cb-sandbox-secret"
passphrase = "cb-pass"

[exchanges.binance]
api_key = "bn-live-key"
api_secret = "bn-live-secret"

[market_data]
period = "5d"
interval = "1h"

[strategy]
threshold_pct = 0.75
trade_quantity = 0.02

[schedule]
cadence_secs = 1800
poll_secs = 30
backoff_secs = 120
run_on_start = true

[logging]
level = "debug"
log_to_file = true
log_file = "logs/trader.log"

[daemon]
pid_file = "/tmp/trader.pid"
"#
        .to_string()
    }

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let file = write_config(&create_valid_config());
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.strategy.threshold_pct, 0.75);
        assert_eq!(config.strategy.trade_quantity, 0.02);
        assert_eq!(config.market_data.period, "5d");
        assert_eq!(config.schedule.cadence_secs, 1800);
        assert!(config.logging.log_to_file);
        assert_eq!(config.daemon.pid_path(), PathBuf::from("/tmp/trader.pid"));
    }

    #[test]
    fn test_empty_file_uses_reference_defaults() {
        let file = write_config("");
        let config = load_config(file.path()).unwrap();

        let params = ArbitrageParams::from(&config);
        assert_eq!(params.threshold_pct, 0.5);
        assert_eq!(params.trade_quantity, 0.01);

        let timing = LoopTiming::from(&config.schedule);
        assert_eq!(timing, LoopTiming::default());
        assert_eq!(config.market_data.window(), HistoryWindow::new("1d", "1h"));
        assert_eq!(config.http.timeout(), Duration::from_secs(30));
        assert_eq!(
            config.daemon.working_dir_path(),
            Some(PathBuf::from("/var/lib/crypto_trader"))
        );
    }

    #[test]
    fn test_sample_config_loads() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/trader.toml");
        let config = load_config(path).unwrap();
        assert_eq!(config.strategy.threshold_pct, 0.5);
        assert_eq!(config.schedule.cadence_secs, 3600);
        assert_eq!(config.exchanges.binance.quote_currency.as_deref(), Some("USDT"));
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/path/trader.toml");
        assert!(matches!(result.unwrap_err(), ConfigError::IoError(_)));
    }

    #[test]
    fn test_malformed_toml() {
        let file = write_config("[strategy\nthreshold_pct = ");
        assert!(matches!(
            load_config(file.path()).unwrap_err(),
            ConfigError::ParseError(_)
        ));
    }

    #[test]
    fn test_invalid_trade_quantity() {
        let file = write_config("[strategy]\ntrade_quantity = 0.0\n");
        assert!(matches!(
            load_config(file.path()).unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_invalid_schedule() {
        let file = write_config("[schedule]\npoll_secs = 0\n");
        assert!(matches!(
            load_config(file.path()).unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_credentials_follow_mode() {
        let file = write_config(&create_valid_config());
        let config = load_config(file.path()).unwrap();
        let coinbase = config.exchanges.venue(ExchangeKind::Coinbase);

        let live = coinbase.credentials(ExchangeKind::Coinbase, TradingMode::Live);
        assert_eq!(live.key, "cb-live-key");
        assert_eq!(live.secret, "cb-live-secret");
        assert_eq!(live.passphrase.as_deref(), Some("cb-pass"));

        let sandbox = coinbase.credentials(ExchangeKind::Coinbase, TradingMode::Test);
        assert_eq!(sandbox.key, "cb-sandbox-key");
        assert_eq!(sandbox.secret, "cb-sandbox-secret");
    }

    #[test]
    fn test_quote_currency_defaults_per_venue() {
        let file = write_config(&create_valid_config());
        let config = load_config(file.path()).unwrap();

        assert_eq!(
            config.exchanges.venue(ExchangeKind::Binance).quote_currency(ExchangeKind::Binance),
            "USDT"
        );
        assert_eq!(
            config.exchanges.venue(ExchangeKind::Gemini).quote_currency(ExchangeKind::Gemini),
            "USD"
        );
    }
}
