//! Spread Arbitrage Strategy
//!
//! Signal: `(venue_bid - market_close) / market_close * 100`, taken when it
//! exceeds a fixed percentage threshold.

pub mod params;
pub mod spread;

pub use params::{ArbitrageParams, ParamsError, DEFAULT_THRESHOLD_PCT, DEFAULT_TRADE_QUANTITY};
pub use spread::{Opportunities, SpreadEvaluator};
