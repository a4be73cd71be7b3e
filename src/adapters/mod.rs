//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Exchanges: Coinbase, Gemini and Binance REST clients
//! - Market Data: Yahoo Finance close prices
//! - CLI: Command-line interface definitions
//! - Process: PID file, working directory and signal wiring

pub mod cli;
pub mod exchanges;
pub mod market_data;
pub mod process;

pub use cli::CliApp;
pub use exchanges::{Credentials, ExchangeClient, ExchangeKind};
pub use market_data::YahooFinanceSource;
pub use process::{PidFile, ProcessError};
