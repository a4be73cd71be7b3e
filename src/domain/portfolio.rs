use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use super::asset::Asset;

#[derive(Debug, Error, PartialEq)]
pub enum PortfolioError {
    #[error("Invalid fill quantity for {asset}: {quantity}")]
    InvalidQuantity { asset: Asset, quantity: f64 },
    #[error("Invalid fill price for {asset}: {price}")]
    InvalidPrice { asset: Asset, price: f64 },
}

/// Accumulated buys for one asset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Holding {
    pub quantity: f64,
    /// Quote currency spent at limit prices
    pub total_cost: f64,
    pub buy_count: u32,
}

impl Holding {
    pub fn avg_price(&self) -> Option<f64> {
        if self.quantity > 0.0 {
            Some(self.total_cost / self.quantity)
        } else {
            None
        }
    }
}

/// In-memory holdings, owned by the trader loop.
///
/// Buy-only: quantities start at zero and only ever increase. Nothing is
/// reconciled against the venue account and nothing survives a restart.
#[derive(Debug, Clone)]
pub struct Portfolio {
    holdings: BTreeMap<Asset, Holding>,
}

impl Portfolio {
    pub fn new() -> Self {
        Portfolio {
            holdings: Asset::ALL
                .iter()
                .map(|asset| (*asset, Holding::default()))
                .collect(),
        }
    }

    pub fn quantity(&self, asset: Asset) -> f64 {
        self.holdings.get(&asset).map(|h| h.quantity).unwrap_or(0.0)
    }

    pub fn holding(&self, asset: Asset) -> Option<&Holding> {
        self.holdings.get(&asset)
    }

    /// Record a confirmed buy
    pub fn credit(&mut self, asset: Asset, quantity: f64, price: f64) -> Result<(), PortfolioError> {
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(PortfolioError::InvalidQuantity { asset, quantity });
        }
        if !price.is_finite() || price <= 0.0 {
            return Err(PortfolioError::InvalidPrice { asset, price });
        }

        let holding = self.holdings.entry(asset).or_default();
        holding.quantity += quantity;
        holding.total_cost += quantity * price;
        holding.buy_count += 1;
        Ok(())
    }

    pub fn total_cost(&self) -> f64 {
        self.holdings.values().map(|h| h.total_cost).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Asset, &Holding)> {
        self.holdings.iter()
    }
}

impl Default for Portfolio {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Portfolio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .holdings
            .iter()
            .map(|(asset, h)| format!("{}={}", asset, h.quantity))
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}
