//! Domain Layer - Core types for the arbitrage trader
//!
//! Pure data and arithmetic with no I/O. External interactions go through
//! the ports layer.

pub mod asset;
pub mod market;
pub mod mode;
pub mod opportunity;
pub mod portfolio;

pub use asset::{Asset, TradingPair};
pub use market::{MarketSnapshot, OrderBookQuote};
pub use mode::TradingMode;
pub use opportunity::{profit_potential, ArbitrageOpportunity};
pub use portfolio::{Holding, Portfolio, PortfolioError};
