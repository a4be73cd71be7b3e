//! Market observations: external close prices and venue top-of-book.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::asset::Asset;

/// Latest close price per asset from the external market feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    prices: HashMap<Asset, f64>,
    pub fetched_at: DateTime<Utc>,
}

impl MarketSnapshot {
    pub fn new(prices: HashMap<Asset, f64>, fetched_at: DateTime<Utc>) -> Self {
        Self { prices, fetched_at }
    }

    pub fn empty() -> Self {
        Self::new(HashMap::new(), Utc::now())
    }

    pub fn price(&self, asset: Asset) -> Option<f64> {
        self.prices.get(&asset).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn with_price(mut self, asset: Asset, price: f64) -> Self {
        self.prices.insert(asset, price);
        self
    }
}

/// Best bid and best ask resting on a venue. Either side may be empty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderBookQuote {
    pub bid: Option<f64>,
    pub ask: Option<f64>,
}

impl OrderBookQuote {
    pub fn new(bid: Option<f64>, ask: Option<f64>) -> Self {
        Self { bid, ask }
    }

    /// Both sides present
    pub fn two_sided(&self) -> Option<(f64, f64)> {
        match (self.bid, self.ask) {
            (Some(bid), Some(ask)) => Some((bid, ask)),
            _ => None,
        }
    }

    pub fn spread(&self) -> Option<f64> {
        self.two_sided().map(|(bid, ask)| ask - bid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_lookup() {
        let snapshot = MarketSnapshot::empty().with_price(Asset::Btc, 65_000.0);
        assert!(!snapshot.is_empty());
        assert_eq!(snapshot.price(Asset::Btc), Some(65_000.0));
        assert_eq!(snapshot.price(Asset::Eth), None);
        assert!(MarketSnapshot::empty().is_empty());
    }

    #[test]
    fn test_one_sided_quote() {
        let quote = OrderBookQuote::new(Some(100.0), None);
        assert!(quote.two_sided().is_none());
        assert!(quote.spread().is_none());

        let quote = OrderBookQuote::new(Some(100.0), Some(100.5));
        assert_eq!(quote.spread(), Some(0.5));
    }
}
