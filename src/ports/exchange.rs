use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Asset, OrderBookQuote, TradingMode, TradingPair};

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{venue} API error ({status}): {message}")]
    Api {
        venue: String,
        status: u16,
        message: String,
    },
    #[error("Order rejected: {0}")]
    Rejected(String),
    #[error("Response parsing failed: {0}")]
    Parse(String),
    #[error("Missing credentials: {0}")]
    Credentials(String),
    #[error("Invalid order: {0}")]
    InvalidOrder(String),
}

/// Limit buy request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitBuy {
    pub pair: TradingPair,
    pub quantity: f64,
    pub limit_price: f64,
}

impl LimitBuy {
    pub fn new(pair: TradingPair, quantity: f64, limit_price: f64) -> Self {
        Self {
            pair,
            quantity,
            limit_price,
        }
    }

    pub fn validate(&self) -> Result<(), ExchangeError> {
        if !self.quantity.is_finite() || self.quantity <= 0.0 {
            return Err(ExchangeError::InvalidOrder(format!(
                "quantity must be > 0, got {}",
                self.quantity
            )));
        }
        if !self.limit_price.is_finite() || self.limit_price <= 0.0 {
            return Err(ExchangeError::InvalidOrder(format!(
                "limit price must be > 0, got {}",
                self.limit_price
            )));
        }
        Ok(())
    }
}

/// Venue acknowledgement of a submitted order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    pub order_id: String,
    pub pair: TradingPair,
    pub quantity: f64,
    pub limit_price: f64,
    /// True when produced by the test-mode guard without contacting a venue
    pub simulated: bool,
    pub submitted_at: DateTime<Utc>,
}

impl OrderConfirmation {
    pub fn accepted(order_id: impl Into<String>, order: &LimitBuy) -> Self {
        Self {
            order_id: order_id.into(),
            pair: order.pair.clone(),
            quantity: order.quantity,
            limit_price: order.limit_price,
            simulated: false,
            submitted_at: Utc::now(),
        }
    }

    pub fn simulated(order: &LimitBuy) -> Self {
        Self {
            order_id: format!("test-{:016x}", rand::random::<u64>()),
            simulated: true,
            ..Self::accepted(String::new(), order)
        }
    }
}

/// Trading venue capability set, identical across backends.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExchangePort: Send + Sync {
    /// Mode selected at construction; never changes afterwards
    fn mode(&self) -> TradingMode;

    /// Pair this venue trades the asset in
    fn pair(&self, asset: Asset) -> TradingPair;

    /// Best bid and ask currently resting on the venue
    async fn fetch_best_quote(&self, pair: &TradingPair) -> Result<OrderBookQuote, ExchangeError>;

    /// Submit a limit buy
    async fn place_limit_buy(&self, order: &LimitBuy) -> Result<OrderConfirmation, ExchangeError>;
}
