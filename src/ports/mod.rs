//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement:
//! - Market data feed (latest close per asset)
//! - Exchange venue (top-of-book quotes, limit buys)

pub mod market_data;
pub mod exchange;
pub mod mocks;

pub use market_data::{HistoryWindow, MarketDataError, MarketDataPort};
pub use exchange::{ExchangeError, ExchangePort, LimitBuy, OrderConfirmation};
