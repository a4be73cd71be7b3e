//! Trade Executor
//!
//! Turns a cycle's opportunities into fixed-size limit buys. Each asset is
//! handled on its own: one failed order never stops the others, and nothing
//! is rolled back.

use std::fmt;

use crate::domain::{Asset, Portfolio, PortfolioError, TradingMode};
use crate::ports::{ExchangePort, LimitBuy, OrderConfirmation};
use crate::strategy::Opportunities;

/// What happened to one opportunity
#[derive(Debug, Clone, PartialEq)]
pub enum TradeOutcome {
    /// Test mode: logged only
    Simulated {
        asset: Asset,
        quantity: f64,
        limit_price: f64,
    },
    Filled {
        asset: Asset,
        confirmation: OrderConfirmation,
    },
    Failed {
        asset: Asset,
        error: String,
    },
}

impl TradeOutcome {
    pub fn asset(&self) -> Asset {
        match self {
            TradeOutcome::Simulated { asset, .. }
            | TradeOutcome::Filled { asset, .. }
            | TradeOutcome::Failed { asset, .. } => *asset,
        }
    }

    pub fn is_filled(&self) -> bool {
        matches!(self, TradeOutcome::Filled { .. })
    }
}

impl fmt::Display for TradeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeOutcome::Simulated { asset, quantity, limit_price } => {
                write!(f, "SIMULATED {} {} @ ${:.4}", quantity, asset, limit_price)
            }
            TradeOutcome::Filled { asset, confirmation } => write!(
                f,
                "FILLED {} {} @ ${:.4} (order {})",
                confirmation.quantity, asset, confirmation.limit_price, confirmation.order_id
            ),
            TradeOutcome::Failed { asset, error } => write!(f, "FAILED {}: {}", asset, error),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TradeExecutor {
    mode: TradingMode,
    trade_quantity: f64,
}

impl TradeExecutor {
    pub fn new(mode: TradingMode, trade_quantity: f64) -> Self {
        Self {
            mode,
            trade_quantity,
        }
    }

    pub fn mode(&self) -> TradingMode {
        self.mode
    }

    pub fn trade_quantity(&self) -> f64 {
        self.trade_quantity
    }

    /// Place one buy per opportunity, at the market price as limit.
    ///
    /// Order failures are recorded as outcomes. Only a portfolio invariant
    /// violation is returned as an error.
    pub async fn execute<E>(
        &self,
        opportunities: &Opportunities,
        exchange: &E,
        portfolio: &mut Portfolio,
    ) -> Result<Vec<TradeOutcome>, PortfolioError>
    where
        E: ExchangePort + ?Sized,
    {
        let mut assets: Vec<Asset> = opportunities.keys().copied().collect();
        assets.sort();

        let mut outcomes = Vec::with_capacity(assets.len());

        for asset in assets {
            let opportunity = &opportunities[&asset];
            let limit_price = opportunity.market_price;

            if self.mode.is_test() {
                tracing::info!(
                    "Test mode: Would buy {} {} at {}",
                    self.trade_quantity, asset, limit_price
                );
                outcomes.push(TradeOutcome::Simulated {
                    asset,
                    quantity: self.trade_quantity,
                    limit_price,
                });
                continue;
            }

            let order = LimitBuy::new(exchange.pair(asset), self.trade_quantity, limit_price);
            let result = match order.validate() {
                Ok(()) => exchange.place_limit_buy(&order).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(confirmation) if confirmation.simulated => {
                    tracing::warn!(
                        "Venue returned a simulated confirmation for {}, portfolio unchanged",
                        asset
                    );
                    outcomes.push(TradeOutcome::Simulated {
                        asset,
                        quantity: order.quantity,
                        limit_price,
                    });
                }
                Ok(confirmation) => {
                    portfolio.credit(asset, order.quantity, limit_price)?;
                    tracing::info!(
                        "Executed buy order for {}: {} @ {} (order {})",
                        order.pair, order.quantity, limit_price, confirmation.order_id
                    );
                    outcomes.push(TradeOutcome::Filled { asset, confirmation });
                }
                Err(e) => {
                    tracing::error!("Trade execution error for {}: {}", asset, e);
                    outcomes.push(TradeOutcome::Failed {
                        asset,
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ArbitrageOpportunity;
    use crate::ports::exchange::MockExchangePort;
    use crate::ports::mocks::MockExchange;

    fn opportunities(assets: &[Asset]) -> Opportunities {
        assets
            .iter()
            .map(|a| (*a, ArbitrageOpportunity::new(*a, 100.0, 101.0, 101.5)))
            .collect()
    }

    #[tokio::test]
    async fn test_test_mode_never_calls_venue() {
        let mut venue = MockExchangePort::new();
        venue.expect_place_limit_buy().times(0);
        venue.expect_fetch_best_quote().times(0);
        venue.expect_pair().times(0);

        let executor = TradeExecutor::new(TradingMode::Test, 0.01);
        let mut portfolio = Portfolio::new();

        let outcomes = executor
            .execute(&opportunities(&Asset::ALL), &venue, &mut portfolio)
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes
            .iter()
            .all(|o| matches!(o, TradeOutcome::Simulated { .. })));
        for asset in Asset::ALL {
            assert_eq!(portfolio.quantity(asset), 0.0);
        }
    }

    #[tokio::test]
    async fn test_live_fill_credits_exact_quantity() {
        let venue = MockExchange::new(TradingMode::Live);
        let executor = TradeExecutor::new(TradingMode::Live, 0.01);
        let mut portfolio = Portfolio::new();

        let outcomes = executor
            .execute(&opportunities(&[Asset::Btc]), &venue, &mut portfolio)
            .await
            .unwrap();

        assert!(outcomes[0].is_filled());
        assert_eq!(portfolio.quantity(Asset::Btc), 0.01);
        assert_eq!(venue.orders().len(), 1);
        assert_eq!(venue.orders()[0].limit_price, 100.0);
        assert_eq!(venue.orders()[0].pair.to_string(), "BTC/USD");
    }

    #[tokio::test]
    async fn test_failed_order_isolated() {
        let venue = MockExchange::new(TradingMode::Live).rejecting(Asset::Eth);
        let executor = TradeExecutor::new(TradingMode::Live, 0.01);
        let mut portfolio = Portfolio::new();

        let outcomes = executor
            .execute(&opportunities(&Asset::ALL), &venue, &mut portfolio)
            .await
            .unwrap();

        assert_eq!(venue.orders().len(), 3);
        assert_eq!(outcomes.iter().filter(|o| o.is_filled()).count(), 2);
        assert!(matches!(
            outcomes.iter().find(|o| o.asset() == Asset::Eth),
            Some(TradeOutcome::Failed { .. })
        ));
        assert_eq!(portfolio.quantity(Asset::Eth), 0.0);
        assert_eq!(portfolio.quantity(Asset::Btc), 0.01);
        assert_eq!(portfolio.quantity(Asset::Xrp), 0.01);
    }

    #[tokio::test]
    async fn test_simulated_confirmation_not_credited() {
        let mut venue = MockExchangePort::new();
        venue.expect_pair().returning(|asset| asset.against("USD"));
        venue
            .expect_place_limit_buy()
            .times(1)
            .returning(|order| Ok(OrderConfirmation::simulated(order)));

        let executor = TradeExecutor::new(TradingMode::Live, 0.01);
        let mut portfolio = Portfolio::new();

        let outcomes = executor
            .execute(&opportunities(&[Asset::Xrp]), &venue, &mut portfolio)
            .await
            .unwrap();

        assert!(matches!(outcomes[0], TradeOutcome::Simulated { .. }));
        assert_eq!(portfolio.quantity(Asset::Xrp), 0.0);
    }
}
