//! Arb Trader - cross-venue spot arbitrage daemon library
//!
//! Compares each venue's best bid for BTC, ETH and XRP against an external
//! market close once per cadence and places a fixed-size limit buy when the
//! spread clears a threshold.
//!
//! # Modules
//!
//! - `domain`: Core types (Asset, MarketSnapshot, ArbitrageOpportunity, Portfolio)
//! - `ports`: Trait abstractions (MarketDataPort, ExchangePort)
//! - `strategy`: Spread scoring (SpreadEvaluator, ArbitrageParams)
//! - `adapters`: External implementations (Yahoo Finance, venue clients, CLI, process)
//! - `config`: Configuration loading and validation
//! - `application`: Trader loop, trade executor, schedule and shutdown

pub mod domain;
pub mod ports;
pub mod strategy;
pub mod adapters;
pub mod config;
pub mod application;
