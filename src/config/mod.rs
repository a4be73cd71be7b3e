//! Configuration Module
//!
//! Loads and validates configuration from TOML files.

pub mod loader;

pub use loader::{
    Config, ConfigError, DaemonSection, LoggingSection, MarketDataSection, VenueSection,
    load_config,
};
