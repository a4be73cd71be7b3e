//! CLI Command Definitions
//!
//! Argument parsing for the arbitrage trader. The handlers live in the binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::adapters::exchanges::ExchangeKind;
use crate::domain::TradingMode;

/// Arb Trader - cross-venue spread monitor for BTC, ETH and XRP
#[derive(Parser, Debug)]
#[command(
    name = "arb-trader",
    version = env!("CARGO_PKG_VERSION"),
    about = "Hourly spot arbitrage trader for Coinbase, Gemini and Binance",
    long_about = "arb-trader compares each venue's best bid against an external market \
                  close once per cadence and places a fixed-size limit buy when the \
                  spread clears the configured threshold."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

impl CliApp {
    /// Log level forced by flags, if any
    pub fn level_override(&self) -> Option<&'static str> {
        if self.debug {
            Some("debug")
        } else if self.verbose {
            Some("info")
        } else {
            None
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the trading daemon
    Run(RunCmd),

    /// Evaluate spreads once and print the opportunities
    Scan(ScanCmd),
}

/// Start the trading loop
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Venue to trade on
    #[arg(short, long, value_enum)]
    pub exchange: ExchangeKind,

    /// Test mode: sandbox credentials, no orders submitted
    #[arg(short, long)]
    pub test: bool,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/trader.toml")]
    pub config: PathBuf,

    /// Override the configured PID file
    #[arg(long, value_name = "FILE")]
    pub pid_file: Option<PathBuf>,
}

impl RunCmd {
    pub fn mode(&self) -> TradingMode {
        TradingMode::from_test_flag(self.test)
    }
}

/// One-shot evaluation, always in test mode
#[derive(Parser, Debug)]
pub struct ScanCmd {
    /// Venue to read quotes from
    #[arg(short, long, value_enum)]
    pub exchange: ExchangeKind,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/trader.toml")]
    pub config: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_live() {
        let app = CliApp::try_parse_from(["arb-trader", "run", "--exchange", "coinbase"]).unwrap();
        let Command::Run(cmd) = app.command else {
            panic!("expected run");
        };
        assert_eq!(cmd.exchange, ExchangeKind::Coinbase);
        assert_eq!(cmd.mode(), TradingMode::Live);
        assert_eq!(cmd.config, PathBuf::from("config/trader.toml"));
        assert!(cmd.pid_file.is_none());
    }

    #[test]
    fn test_parse_run_test_mode() {
        let app = CliApp::try_parse_from([
            "arb-trader",
            "--debug",
            "run",
            "-e",
            "binance",
            "--test",
            "--pid-file",
            "/tmp/arb.pid",
        ])
        .unwrap();
        assert_eq!(app.level_override(), Some("debug"));
        let Command::Run(cmd) = app.command else {
            panic!("expected run");
        };
        assert_eq!(cmd.mode(), TradingMode::Test);
        assert_eq!(cmd.pid_file, Some(PathBuf::from("/tmp/arb.pid")));
    }

    #[test]
    fn test_unknown_exchange_rejected() {
        assert!(CliApp::try_parse_from(["arb-trader", "run", "--exchange", "kraken"]).is_err());
    }

    #[test]
    fn test_exchange_required() {
        assert!(CliApp::try_parse_from(["arb-trader", "run"]).is_err());
    }

    #[test]
    fn test_parse_scan() {
        let app = CliApp::try_parse_from(["arb-trader", "scan", "--exchange", "gemini", "-v"]).unwrap();
        assert_eq!(app.level_override(), Some("info"));
        assert!(matches!(
            app.command,
            Command::Scan(ScanCmd { exchange: ExchangeKind::Gemini, .. })
        ));
    }
}
