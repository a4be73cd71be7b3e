//! Exchange Adapters
//!
//! REST clients for the three supported venues behind one `ExchangeClient`.
//! Quotes always come from the venue's public production endpoint. Orders go
//! to the sandbox in test mode and to production in live mode, and in test
//! mode they never leave the process at all.

mod binance;
mod coinbase;
mod gemini;
mod rest;

use std::fmt;
use std::time::Duration;
use async_trait::async_trait;
use serde::Deserialize;

use crate::config::VenueSection;
use crate::domain::{Asset, OrderBookQuote, TradingMode, TradingPair};
use crate::ports::{ExchangeError, ExchangePort, LimitBuy, OrderConfirmation};

pub use binance::BinanceClient;
pub use coinbase::CoinbaseClient;
pub use gemini::GeminiClient;

/// Supported venues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeKind {
    Coinbase,
    Gemini,
    Binance,
}

impl ExchangeKind {
    pub const ALL: [ExchangeKind; 3] = [
        ExchangeKind::Coinbase,
        ExchangeKind::Gemini,
        ExchangeKind::Binance,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ExchangeKind::Coinbase => "coinbase",
            ExchangeKind::Gemini => "gemini",
            ExchangeKind::Binance => "binance",
        }
    }

    /// Prefix of the `<VENUE>_API_KEY` style environment variables
    pub fn env_prefix(&self) -> &'static str {
        match self {
            ExchangeKind::Coinbase => "COINBASE",
            ExchangeKind::Gemini => "GEMINI",
            ExchangeKind::Binance => "BINANCE",
        }
    }

    pub fn default_quote_currency(&self) -> &'static str {
        match self {
            ExchangeKind::Binance => "USDT",
            _ => "USD",
        }
    }

    fn production_url(&self) -> &'static str {
        match self {
            ExchangeKind::Coinbase => coinbase::API_URL,
            ExchangeKind::Gemini => gemini::API_URL,
            ExchangeKind::Binance => binance::API_URL,
        }
    }

    fn sandbox_url(&self) -> &'static str {
        match self {
            ExchangeKind::Coinbase => coinbase::SANDBOX_URL,
            ExchangeKind::Gemini => gemini::SANDBOX_URL,
            ExchangeKind::Binance => binance::SANDBOX_URL,
        }
    }

    fn requires_passphrase(&self) -> bool {
        matches!(self, ExchangeKind::Coinbase)
    }
}

impl fmt::Display for ExchangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// API credentials for one venue and mode
#[derive(Clone, Default)]
pub struct Credentials {
    pub key: String,
    pub secret: String,
    pub passphrase: Option<String>,
}

impl Credentials {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
            passphrase: None,
        }
    }

    pub fn with_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = Some(passphrase.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.key.is_empty() || self.secret.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &redact(&self.key))
            .field("secret", &redact(&self.secret))
            .field("passphrase", &self.passphrase.as_deref().map(redact))
            .finish()
    }
}

fn redact(value: &str) -> &'static str {
    if value.is_empty() {
        "<empty>"
    } else {
        "<redacted>"
    }
}

#[derive(Debug, Clone)]
enum Venue {
    Coinbase(CoinbaseClient),
    Gemini(GeminiClient),
    Binance(BinanceClient),
}

/// One venue client with its mode fixed at construction
#[derive(Debug, Clone)]
pub struct ExchangeClient {
    kind: ExchangeKind,
    mode: TradingMode,
    quote_currency: String,
    venue: Venue,
}

impl ExchangeClient {
    /// Build a client from its config section, resolving credentials for the mode
    pub fn connect(
        kind: ExchangeKind,
        section: &VenueSection,
        mode: TradingMode,
        timeout: Duration,
    ) -> Result<Self, ExchangeError> {
        let credentials = section.credentials(kind, mode);
        Self::with_credentials(kind, section, mode, credentials, timeout)
    }

    pub fn with_credentials(
        kind: ExchangeKind,
        section: &VenueSection,
        mode: TradingMode,
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self, ExchangeError> {
        check_credentials(kind, mode, &credentials)?;

        let quote_url = section
            .api_url
            .clone()
            .unwrap_or_else(|| kind.production_url().to_string());
        let order_url = match mode {
            TradingMode::Live => quote_url.clone(),
            TradingMode::Test => section
                .sandbox_url
                .clone()
                .unwrap_or_else(|| kind.sandbox_url().to_string()),
        };
        let quote_url = quote_url.trim_end_matches('/').to_string();
        let order_url = order_url.trim_end_matches('/').to_string();

        let http = rest::http_client(timeout)?;
        let venue = match kind {
            ExchangeKind::Coinbase => {
                Venue::Coinbase(CoinbaseClient::new(http, quote_url, order_url, credentials))
            }
            ExchangeKind::Gemini => {
                Venue::Gemini(GeminiClient::new(http, quote_url, order_url, credentials))
            }
            ExchangeKind::Binance => {
                Venue::Binance(BinanceClient::new(http, quote_url, order_url, credentials))
            }
        };

        tracing::info!("Connected to {} in {} mode", kind, mode);

        Ok(Self {
            kind,
            mode,
            quote_currency: section.quote_currency(kind),
            venue,
        })
    }

    pub fn kind(&self) -> ExchangeKind {
        self.kind
    }

    pub fn quote_currency(&self) -> &str {
        &self.quote_currency
    }
}

/// Live trading needs a full credential set. Test mode only warns, since
/// it never signs anything.
fn check_credentials(
    kind: ExchangeKind,
    mode: TradingMode,
    credentials: &Credentials,
) -> Result<(), ExchangeError> {
    let missing_passphrase = kind.requires_passphrase()
        && credentials.passphrase.as_deref().map_or(true, str::is_empty);

    match mode {
        TradingMode::Live if credentials.is_empty() => Err(ExchangeError::Credentials(format!(
            "{} live trading requires api_key and api_secret (or {}_API_KEY / {}_API_SECRET)",
            kind,
            kind.env_prefix(),
            kind.env_prefix()
        ))),
        TradingMode::Live if missing_passphrase => Err(ExchangeError::Credentials(format!(
            "{} live trading requires a passphrase",
            kind
        ))),
        TradingMode::Test if credentials.is_empty() || missing_passphrase => {
            tracing::warn!("No sandbox credentials for {}; orders are simulated only", kind);
            Ok(())
        }
        _ => Ok(()),
    }
}

#[async_trait]
impl ExchangePort for ExchangeClient {
    fn mode(&self) -> TradingMode {
        self.mode
    }

    fn pair(&self, asset: Asset) -> TradingPair {
        asset.against(&self.quote_currency)
    }

    async fn fetch_best_quote(&self, pair: &TradingPair) -> Result<OrderBookQuote, ExchangeError> {
        let quote = match &self.venue {
            Venue::Coinbase(client) => client.best_quote(pair).await,
            Venue::Gemini(client) => client.best_quote(pair).await,
            Venue::Binance(client) => client.best_quote(pair).await,
        }?;
        tracing::debug!("{} {} bid={:?} ask={:?}", self.kind, pair, quote.bid, quote.ask);
        Ok(quote)
    }

    async fn place_limit_buy(&self, order: &LimitBuy) -> Result<OrderConfirmation, ExchangeError> {
        order.validate()?;

        if self.mode.is_test() {
            tracing::info!(
                "Test mode: not submitting {} {} @ {} to {}",
                order.quantity,
                order.pair,
                order.limit_price,
                self.kind
            );
            return Ok(OrderConfirmation::simulated(order));
        }

        let confirmation = match &self.venue {
            Venue::Coinbase(client) => client.submit_limit_buy(order).await,
            Venue::Gemini(client) => client.submit_limit_buy(order).await,
            Venue::Binance(client) => client.submit_limit_buy(order).await,
        }?;
        tracing::info!(
            "{} accepted order {} for {} {}",
            self.kind,
            confirmation.order_id,
            confirmation.quantity,
            confirmation.pair
        );
        Ok(confirmation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(kind: ExchangeKind, mode: TradingMode, credentials: Credentials) -> Result<ExchangeClient, ExchangeError> {
        ExchangeClient::with_credentials(
            kind,
            &VenueSection::default(),
            mode,
            credentials,
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_live_mode_requires_credentials() {
        let result = client(ExchangeKind::Gemini, TradingMode::Live, Credentials::default());
        assert!(matches!(result, Err(ExchangeError::Credentials(_))));
    }

    #[test]
    fn test_live_coinbase_requires_passphrase() {
        let result = client(
            ExchangeKind::Coinbase,
            TradingMode::Live,
            Credentials::new("key", "c2VjcmV0"),
        );
        assert!(matches!(result, Err(ExchangeError::Credentials(_))));

        let result = client(
            ExchangeKind::Coinbase,
            TradingMode::Live,
            Credentials::new("key", "c2VjcmV0").with_passphrase("pass"),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_test_mode_tolerates_missing_credentials() {
        let client = client(ExchangeKind::Binance, TradingMode::Test, Credentials::default()).unwrap();
        assert_eq!(client.mode(), TradingMode::Test);
        assert_eq!(client.kind(), ExchangeKind::Binance);
    }

    #[test]
    fn test_pair_uses_venue_quote_currency() {
        let binance = client(ExchangeKind::Binance, TradingMode::Test, Credentials::default()).unwrap();
        assert_eq!(binance.pair(Asset::Btc).to_string(), "BTC/USDT");

        let gemini = client(ExchangeKind::Gemini, TradingMode::Test, Credentials::default()).unwrap();
        assert_eq!(gemini.pair(Asset::Eth).to_string(), "ETH/USD");
    }

    #[test]
    fn test_sandbox_url_only_in_test_mode() {
        let test = client(ExchangeKind::Gemini, TradingMode::Test, Credentials::default()).unwrap();
        let Venue::Gemini(inner) = &test.venue else {
            panic!("expected gemini venue");
        };
        let debug = format!("{:?}", inner);
        assert!(debug.contains(gemini::SANDBOX_URL));
        assert!(debug.contains(gemini::API_URL));

        let live = client(
            ExchangeKind::Gemini,
            TradingMode::Live,
            Credentials::new("key", "secret"),
        )
        .unwrap();
        let debug = format!("{:?}", live.venue);
        assert!(!debug.contains("sandbox"));
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let credentials = Credentials::new("my-key", "my-secret").with_passphrase("my-pass");
        let debug = format!("{:?}", credentials);
        assert!(!debug.contains("my-key"));
        assert!(!debug.contains("my-secret"));
        assert!(!debug.contains("my-pass"));
        assert!(debug.contains("<redacted>"));
    }

    #[tokio::test]
    async fn test_test_mode_never_submits() {
        // The order URL points nowhere; a network call would fail the test.
        let section = VenueSection {
            sandbox_url: Some("http://127.0.0.1:9".to_string()),
            ..VenueSection::default()
        };
        let client = ExchangeClient::with_credentials(
            ExchangeKind::Coinbase,
            &section,
            TradingMode::Test,
            Credentials::default(),
            Duration::from_secs(1),
        )
        .unwrap();

        let order = LimitBuy::new(client.pair(Asset::Btc), 0.01, 65000.0);
        let confirmation = client.place_limit_buy(&order).await.unwrap();

        assert!(confirmation.simulated);
        assert_eq!(confirmation.pair, order.pair);
    }

    #[tokio::test]
    async fn test_invalid_order_rejected_before_guard() {
        let client = client(ExchangeKind::Gemini, TradingMode::Test, Credentials::default()).unwrap();
        let order = LimitBuy::new(client.pair(Asset::Xrp), 0.0, 0.5);
        assert!(matches!(
            client.place_limit_buy(&order).await,
            Err(ExchangeError::InvalidOrder(_))
        ));
    }

    #[test]
    fn test_kind_parses_from_config() {
        #[derive(Deserialize)]
        struct Wrapper {
            exchange: ExchangeKind,
        }
        let parsed: Wrapper = toml::from_str("exchange = \"binance\"").unwrap();
        assert_eq!(parsed.exchange, ExchangeKind::Binance);
        assert_eq!(ExchangeKind::Coinbase.to_string(), "coinbase");
    }
}
