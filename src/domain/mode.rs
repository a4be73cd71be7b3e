use serde::{Deserialize, Serialize};
use std::fmt;

/// Operating mode, fixed for the lifetime of a trader process.
///
/// `Test` is a real operating mode: sandbox credentials are selected and no
/// order ever reaches a venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradingMode {
    Live,
    Test,
}

impl TradingMode {
    pub fn from_test_flag(test: bool) -> Self {
        if test {
            TradingMode::Test
        } else {
            TradingMode::Live
        }
    }

    pub fn is_test(&self) -> bool {
        matches!(self, TradingMode::Test)
    }
}

impl fmt::Display for TradingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradingMode::Live => write!(f, "live"),
            TradingMode::Test => write!(f, "test"),
        }
    }
}
