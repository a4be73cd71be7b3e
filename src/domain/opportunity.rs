use serde::{Deserialize, Serialize};
use std::fmt;

use super::asset::Asset;

/// Percentage by which the venue bid sits above the external market price.
pub fn profit_potential(bid: f64, market_price: f64) -> f64 {
    (bid - market_price) / market_price * 100.0
}

/// Spread signal for one asset, valid for a single evaluation cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbitrageOpportunity {
    pub asset: Asset,
    /// Percent, e.g. 0.6 means 0.6%
    pub profit_potential: f64,
    pub market_price: f64,
    pub exchange_bid: f64,
    pub exchange_ask: f64,
}

impl ArbitrageOpportunity {
    pub fn new(asset: Asset, market_price: f64, exchange_bid: f64, exchange_ask: f64) -> Self {
        Self {
            asset,
            profit_potential: profit_potential(exchange_bid, market_price),
            market_price,
            exchange_bid,
            exchange_ask,
        }
    }
}

impl fmt::Display for ArbitrageOpportunity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} market ${:.4} bid ${:.4} ask ${:.4} ({:+.3}%)",
            self.asset, self.market_price, self.exchange_bid, self.exchange_ask, self.profit_potential
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_profit_potential() {
        assert_relative_eq!(profit_potential(100.6, 100.0), 0.6, epsilon = 1e-9);
        assert_relative_eq!(profit_potential(99.0, 100.0), -1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_opportunity_carries_inputs() {
        let opp = ArbitrageOpportunity::new(Asset::Eth, 2_000.0, 2_020.0, 2_021.0);
        assert_relative_eq!(opp.profit_potential, 1.0, epsilon = 1e-9);
        assert_eq!(opp.exchange_ask, 2_021.0);
        assert!(opp.to_string().starts_with("ETH"));
    }
}
