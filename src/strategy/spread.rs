//! Spread Evaluator
//!
//! Compares each venue's best bid with the external market close and keeps
//! the assets whose bid sits more than the threshold above market.
//!
//! Failure policy differs by source:
//! - market feed: all-or-nothing, an absent or empty snapshot yields nothing
//! - venue book: per asset, a failed quote skips only that asset

use std::collections::HashMap;

use crate::domain::{ArbitrageOpportunity, Asset, MarketSnapshot, OrderBookQuote};
use crate::ports::ExchangePort;

/// Opportunities found in one cycle, keyed by asset
pub type Opportunities = HashMap<Asset, ArbitrageOpportunity>;

#[derive(Debug, Clone)]
pub struct SpreadEvaluator {
    threshold_pct: f64,
}

impl SpreadEvaluator {
    pub fn new(threshold_pct: f64) -> Self {
        Self { threshold_pct }
    }

    pub fn threshold_pct(&self) -> f64 {
        self.threshold_pct
    }

    /// Score one asset. `None` when a side is missing, the market price is
    /// unusable, or the signal does not clear the threshold.
    pub fn score(
        &self,
        asset: Asset,
        market_price: f64,
        quote: &OrderBookQuote,
    ) -> Option<ArbitrageOpportunity> {
        if !market_price.is_finite() || market_price == 0.0 {
            return None;
        }
        let (bid, ask) = quote.two_sided()?;
        let opportunity = ArbitrageOpportunity::new(asset, market_price, bid, ask);

        if opportunity.profit_potential > self.threshold_pct {
            Some(opportunity)
        } else {
            None
        }
    }

    /// Evaluate every asset in the fixed list against the venue books
    pub async fn evaluate<E>(&self, snapshot: Option<&MarketSnapshot>, exchange: &E) -> Opportunities
    where
        E: ExchangePort + ?Sized,
    {
        let mut opportunities = Opportunities::new();

        let snapshot = match snapshot {
            Some(s) if !s.is_empty() => s,
            _ => {
                tracing::info!("No market data available, skipping arbitrage evaluation");
                return opportunities;
            }
        };

        for asset in Asset::ALL {
            let Some(market_price) = snapshot.price(asset) else {
                tracing::warn!("No market price for {}, skipping", asset);
                continue;
            };

            let pair = exchange.pair(asset);
            let quote = match exchange.fetch_best_quote(&pair).await {
                Ok(quote) => quote,
                Err(e) => {
                    tracing::error!("Error calculating arbitrage for {}: {}", asset, e);
                    continue;
                }
            };

            match self.score(asset, market_price, &quote) {
                Some(opportunity) => {
                    tracing::info!("Arbitrage opportunity: {}", opportunity);
                    opportunities.insert(asset, opportunity);
                }
                None => {
                    tracing::debug!(
                        "{} market ${:.4} bid {:?} ask {:?} below threshold",
                        pair, market_price, quote.bid, quote.ask
                    );
                }
            }
        }

        opportunities
    }
}

impl Default for SpreadEvaluator {
    fn default() -> Self {
        Self::new(super::params::DEFAULT_THRESHOLD_PCT)
    }
}
