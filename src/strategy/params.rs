//! Strategy Parameters
//!
//! Thresholds and sizing for the spread strategy. Defaults are the reference
//! values: trade when the venue bid is more than 0.5% above market, 0.01 units
//! per order.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_THRESHOLD_PCT: f64 = 0.5;
pub const DEFAULT_TRADE_QUANTITY: f64 = 0.01;

#[derive(Debug, Error, PartialEq)]
pub enum ParamsError {
    #[error("Invalid threshold: {0} (must be finite and >= 0)")]
    InvalidThreshold(f64),
    #[error("Invalid trade quantity: {0} (must be finite and > 0)")]
    InvalidTradeQuantity(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbitrageParams {
    /// Minimum profit potential in percent; opportunities must exceed it strictly
    pub threshold_pct: f64,
    /// Fixed size of every order, in base units
    pub trade_quantity: f64,
}

impl Default for ArbitrageParams {
    fn default() -> Self {
        Self {
            threshold_pct: DEFAULT_THRESHOLD_PCT,
            trade_quantity: DEFAULT_TRADE_QUANTITY,
        }
    }
}

impl ArbitrageParams {
    pub fn with_threshold(mut self, threshold_pct: f64) -> Self {
        self.threshold_pct = threshold_pct;
        self
    }

    pub fn with_trade_quantity(mut self, quantity: f64) -> Self {
        self.trade_quantity = quantity;
        self
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        if !self.threshold_pct.is_finite() || self.threshold_pct < 0.0 {
            return Err(ParamsError::InvalidThreshold(self.threshold_pct));
        }
        if !self.trade_quantity.is_finite() || self.trade_quantity <= 0.0 {
            return Err(ParamsError::InvalidTradeQuantity(self.trade_quantity));
        }
        Ok(())
    }
}
