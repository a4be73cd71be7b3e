//! Trader Loop
//!
//! Single scheduling authority: fetch market data, evaluate spreads, execute
//! trades, once per cadence. Between ticks it sleeps on the poll interval and
//! watches for a shutdown request.
//!
//! States: Initializing -> Running -> Stopping -> Stopped.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use futures_util::FutureExt;
use thiserror::Error;
use tokio::time::Instant;

use crate::domain::{Asset, MarketSnapshot, Portfolio, PortfolioError, TradingMode};
use crate::ports::{ExchangePort, HistoryWindow, MarketDataPort};
use crate::strategy::{ArbitrageParams, Opportunities, ParamsError, SpreadEvaluator};

use super::executor::{TradeExecutor, TradeOutcome};
use super::schedule::{CadenceSchedule, LoopTiming};
use super::shutdown::ShutdownHandle;

#[derive(Debug, Error)]
pub enum TraderError {
    #[error("Initialization failed: {0}")]
    Init(String),
    #[error("Invalid strategy parameters: {0}")]
    Params(#[from] ParamsError),
    #[error("Portfolio update failed: {0}")]
    Portfolio(#[from] PortfolioError),
    #[error("Cycle panicked: {0}")]
    Panicked(String),
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown panic".to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraderState {
    Initializing,
    Running,
    Stopping,
    Stopped,
}

impl fmt::Display for TraderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TraderState::Initializing => "initializing",
            TraderState::Running => "running",
            TraderState::Stopping => "stopping",
            TraderState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Result of one fetch -> evaluate -> execute cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub market_data_available: bool,
    pub opportunities: Opportunities,
    pub outcomes: Vec<TradeOutcome>,
}

/// Totals returned when the loop stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopSummary {
    pub cycles: u64,
    pub failures: u64,
}

/// Delay before the next poll given how the last unit of work went
pub fn next_delay(result: &Result<CycleReport, TraderError>, timing: &LoopTiming) -> Duration {
    match result {
        Ok(_) => timing.poll_interval,
        Err(_) => timing.error_backoff,
    }
}

pub struct TraderLoop<M, E> {
    market_data: M,
    exchange: E,
    window: HistoryWindow,
    evaluator: SpreadEvaluator,
    executor: TradeExecutor,
    portfolio: Portfolio,
    snapshot: Option<MarketSnapshot>,
    timing: LoopTiming,
    shutdown: ShutdownHandle,
    state: TraderState,
}

impl<M, E> TraderLoop<M, E>
where
    M: MarketDataPort,
    E: ExchangePort,
{
    /// Bind one venue. The executor takes the venue's mode so the two can
    /// never disagree.
    pub fn new(
        market_data: M,
        exchange: E,
        params: ArbitrageParams,
        window: HistoryWindow,
        timing: LoopTiming,
    ) -> Result<Self, TraderError> {
        params.validate()?;
        if timing.cadence.is_zero()
            || timing.poll_interval.is_zero()
            || timing.error_backoff.is_zero()
        {
            return Err(TraderError::Init(
                "cadence, poll interval and error backoff must be non-zero".to_string(),
            ));
        }

        let mode = exchange.mode();
        Ok(Self {
            market_data,
            exchange,
            window,
            evaluator: SpreadEvaluator::new(params.threshold_pct),
            executor: TradeExecutor::new(mode, params.trade_quantity),
            portfolio: Portfolio::new(),
            snapshot: None,
            timing,
            shutdown: ShutdownHandle::new(),
            state: TraderState::Initializing,
        })
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    pub fn state(&self) -> TraderState {
        self.state
    }

    pub fn mode(&self) -> TradingMode {
        self.executor.mode()
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn snapshot(&self) -> Option<&MarketSnapshot> {
        self.snapshot.as_ref()
    }

    /// Refresh the market snapshot. A failed fetch clears it.
    async fn refresh_market_data(&mut self) {
        match self.market_data.fetch(&Asset::ALL, &self.window).await {
            Ok(snapshot) => {
                tracing::info!(
                    "Successfully fetched finance data ({} assets)",
                    snapshot.len()
                );
                self.snapshot = Some(snapshot);
            }
            Err(e) => {
                tracing::error!("Error fetching finance data: {}", e);
                self.snapshot = None;
            }
        }
    }

    /// Fetch market data and score every asset. Places no orders.
    pub async fn evaluate(&mut self) -> Opportunities {
        self.refresh_market_data().await;
        self.evaluator
            .evaluate(self.snapshot.as_ref(), &self.exchange)
            .await
    }

    /// One scheduled unit of work
    pub async fn run_cycle(&mut self) -> Result<CycleReport, TraderError> {
        let opportunities = self.evaluate().await;
        let market_data_available = self.snapshot.as_ref().is_some_and(|s| !s.is_empty());

        if opportunities.is_empty() {
            tracing::info!("No arbitrage opportunities found");
            return Ok(CycleReport {
                market_data_available,
                opportunities,
                outcomes: Vec::new(),
            });
        }

        let outcomes = self
            .executor
            .execute(&opportunities, &self.exchange, &mut self.portfolio)
            .await?;

        Ok(CycleReport {
            market_data_available,
            opportunities,
            outcomes,
        })
    }

    /// `run_cycle`, with a panic reported as `TraderError::Panicked`
    async fn run_guarded_cycle(&mut self) -> Result<CycleReport, TraderError> {
        match AssertUnwindSafe(self.run_cycle()).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => Err(TraderError::Panicked(panic_message(payload))),
        }
    }

    /// Main loop. Returns once a shutdown request has been observed.
    pub async fn run(&mut self) -> LoopSummary {
        let mut summary = LoopSummary::default();
        let mut schedule = CadenceSchedule::new(
            self.timing.cadence,
            Instant::now(),
            self.timing.run_on_start,
        );

        self.state = TraderState::Running;
        tracing::info!(
            "Starting trader - mode: {}, cadence: {:?}, poll interval: {:?}",
            self.mode(),
            self.timing.cadence,
            self.timing.poll_interval
        );

        loop {
            if self.shutdown.is_requested() {
                self.state = TraderState::Stopping;
                break;
            }

            let now = Instant::now();
            let delay = if schedule.is_due(now) {
                schedule.mark_run(now);
                summary.cycles += 1;

                let result = self.run_guarded_cycle().await;
                if let Err(e) = &result {
                    summary.failures += 1;
                    tracing::error!(
                        "Error in main loop: {} - retrying in {:?}",
                        e,
                        self.timing.error_backoff
                    );
                }
                next_delay(&result, &self.timing)
            } else {
                self.timing.poll_interval
            };

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.shutdown.requested() => {}
            }
        }

        tracing::info!("Shutting down trader - portfolio: {}", self.portfolio);
        self.state = TraderState::Stopped;
        summary
    }
}
