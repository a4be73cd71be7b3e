use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Assets the trader watches. The set is fixed; every cycle walks all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Asset {
    Btc,
    Eth,
    Xrp,
}

impl Asset {
    /// All traded assets, in evaluation order
    pub const ALL: [Asset; 3] = [Asset::Btc, Asset::Eth, Asset::Xrp];

    pub fn symbol(&self) -> &'static str {
        match self {
            Asset::Btc => "BTC",
            Asset::Eth => "ETH",
            Asset::Xrp => "XRP",
        }
    }

    /// Pair this asset against a quote currency
    pub fn against(self, quote: &str) -> TradingPair {
        TradingPair::new(self, quote)
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Asset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BTC" => Ok(Asset::Btc),
            "ETH" => Ok(Asset::Eth),
            "XRP" => Ok(Asset::Xrp),
            other => Err(format!("Unsupported asset: {}", other)),
        }
    }
}

/// A base asset quoted in some currency, e.g. BTC/USD
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradingPair {
    pub base: Asset,
    pub quote: String,
}

impl TradingPair {
    pub fn new(base: Asset, quote: &str) -> Self {
        Self {
            base,
            quote: quote.to_ascii_uppercase(),
        }
    }

    /// Symbol joined by a separator, e.g. `pair.joined("-")` -> "BTC-USD"
    pub fn joined(&self, separator: &str) -> String {
        format!("{}{}{}", self.base.symbol(), separator, self.quote)
    }
}

impl fmt::Display for TradingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}
