use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Asset, MarketSnapshot};

/// Market data error type. Any of these means "no data this cycle".
#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("No close price for {0}")]
    MissingSymbol(String),

    #[error("Stale data for {symbol}: last close {age_secs}s old")]
    Stale { symbol: String, age_secs: i64 },

    #[error("Data parsing error: {0}")]
    Parse(String),
}

/// Lookback window for the price history query
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryWindow {
    /// Provider range string, e.g. "1d"
    pub period: String,
    /// Candle width, e.g. "1h"
    pub interval: String,
}

impl HistoryWindow {
    pub fn new(period: impl Into<String>, interval: impl Into<String>) -> Self {
        Self {
            period: period.into(),
            interval: interval.into(),
        }
    }
}

impl Default for HistoryWindow {
    fn default() -> Self {
        Self::new("1d", "1h")
    }
}

/// External price feed.
///
/// Returns one close per requested asset or fails as a whole; a partial
/// snapshot is never returned. Implementations do not retry.
#[async_trait]
pub trait MarketDataPort: Send + Sync {
    async fn fetch(
        &self,
        assets: &[Asset],
        window: &HistoryWindow,
    ) -> Result<MarketSnapshot, MarketDataError>;
}
