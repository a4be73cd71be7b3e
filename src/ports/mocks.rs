//! In-memory port implementations that record calls and return canned responses.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use async_trait::async_trait;

use crate::domain::{Asset, MarketSnapshot, OrderBookQuote, TradingMode, TradingPair};
use super::exchange::{ExchangeError, ExchangePort, LimitBuy, OrderConfirmation};
use super::market_data::{HistoryWindow, MarketDataError, MarketDataPort};

/// Mock market data feed
#[derive(Debug, Clone)]
pub struct MockMarketData {
    calls: Arc<Mutex<Vec<HistoryWindow>>>,
    response: Arc<Mutex<Result<MarketSnapshot, String>>>,
}

impl MockMarketData {
    pub fn new(snapshot: MarketSnapshot) -> Self {
        Self {
            calls: Arc::default(),
            response: Arc::new(Mutex::new(Ok(snapshot))),
        }
    }

    /// Feed that fails every fetch with a provider error
    pub fn failing(message: &str) -> Self {
        Self {
            calls: Arc::default(),
            response: Arc::new(Mutex::new(Err(message.to_string()))),
        }
    }

    /// Replace the response for subsequent fetches
    pub fn set_response(&self, response: Result<MarketSnapshot, String>) {
        *self.response.lock().unwrap() = response;
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl MarketDataPort for MockMarketData {
    async fn fetch(
        &self,
        _assets: &[Asset],
        window: &HistoryWindow,
    ) -> Result<MarketSnapshot, MarketDataError> {
        self.calls.lock().unwrap().push(window.clone());
        self.response
            .lock()
            .unwrap()
            .clone()
            .map_err(MarketDataError::Provider)
    }
}

/// Mock venue. Orders are recorded whatever the mode, so tests can see
/// whether a caller reached the order path at all.
#[derive(Debug, Clone)]
pub struct MockExchange {
    mode: TradingMode,
    quote_currency: String,
    quotes: Arc<Mutex<HashMap<Asset, OrderBookQuote>>>,
    rejected: Arc<Mutex<HashSet<Asset>>>,
    quote_calls: Arc<Mutex<Vec<TradingPair>>>,
    orders: Arc<Mutex<Vec<LimitBuy>>>,
}

impl MockExchange {
    pub fn new(mode: TradingMode) -> Self {
        Self {
            mode,
            quote_currency: "USD".to_string(),
            quotes: Arc::default(),
            rejected: Arc::default(),
            quote_calls: Arc::default(),
            orders: Arc::default(),
        }
    }

    /// Builder method to set the book for an asset; assets without a book fail
    pub fn with_quote(self, asset: Asset, bid: Option<f64>, ask: Option<f64>) -> Self {
        self.quotes
            .lock()
            .unwrap()
            .insert(asset, OrderBookQuote::new(bid, ask));
        self
    }

    /// Builder method to make orders for an asset fail
    pub fn rejecting(self, asset: Asset) -> Self {
        self.rejected.lock().unwrap().insert(asset);
        self
    }

    pub fn quote_calls(&self) -> Vec<TradingPair> {
        self.quote_calls.lock().unwrap().clone()
    }

    pub fn orders(&self) -> Vec<LimitBuy> {
        self.orders.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExchangePort for MockExchange {
    fn mode(&self) -> TradingMode {
        self.mode
    }

    fn pair(&self, asset: Asset) -> TradingPair {
        asset.against(&self.quote_currency)
    }

    async fn fetch_best_quote(&self, pair: &TradingPair) -> Result<OrderBookQuote, ExchangeError> {
        self.quote_calls.lock().unwrap().push(pair.clone());
        self.quotes
            .lock()
            .unwrap()
            .get(&pair.base)
            .copied()
            .ok_or_else(|| ExchangeError::Api {
                venue: "mock".to_string(),
                status: 503,
                message: format!("no book for {}", pair),
            })
    }

    async fn place_limit_buy(&self, order: &LimitBuy) -> Result<OrderConfirmation, ExchangeError> {
        self.orders.lock().unwrap().push(order.clone());
        if self.rejected.lock().unwrap().contains(&order.pair.base) {
            return Err(ExchangeError::Rejected(format!("insufficient funds for {}", order.pair)));
        }
        let id = self.orders.lock().unwrap().len();
        Ok(OrderConfirmation::accepted(format!("mock-{}", id), order))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_market_data() {
        let mock = MockMarketData::new(MarketSnapshot::empty().with_price(Asset::Btc, 100.0));

        let snapshot = mock.fetch(&Asset::ALL, &HistoryWindow::default()).await.unwrap();
        assert_eq!(snapshot.price(Asset::Btc), Some(100.0));
        assert_eq!(mock.call_count(), 1);

        mock.set_response(Err("down".to_string()));
        assert!(mock.fetch(&Asset::ALL, &HistoryWindow::default()).await.is_err());
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_exchange() {
        let mock = MockExchange::new(TradingMode::Live)
            .with_quote(Asset::Eth, Some(10.0), Some(11.0))
            .rejecting(Asset::Xrp);

        let quote = mock.fetch_best_quote(&Asset::Eth.against("USD")).await.unwrap();
        assert_eq!(quote.bid, Some(10.0));
        assert!(mock.fetch_best_quote(&Asset::Btc.against("USD")).await.is_err());

        let ok = LimitBuy::new(Asset::Eth.against("USD"), 0.01, 10.0);
        let bad = LimitBuy::new(Asset::Xrp.against("USD"), 0.01, 0.5);
        assert!(mock.place_limit_buy(&ok).await.is_ok());
        assert!(mock.place_limit_buy(&bad).await.is_err());
        assert_eq!(mock.orders().len(), 2);
        assert_eq!(mock.quote_calls().len(), 2);
    }
}
