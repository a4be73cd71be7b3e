//! Market Data Adapters
//!
//! External price feed for the reference close prices:
//! - `YahooFinanceSource`: Yahoo Finance chart API, one request per asset

mod yahoo;

pub use yahoo::YahooFinanceSource;
