//! Gemini REST client

use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::domain::{Asset, OrderBookQuote, TradingPair};
use crate::ports::{ExchangeError, LimitBuy, OrderConfirmation};
use super::rest::{hmac_sha384, parse_price, read_body, unix_millis, Precision};
use super::Credentials;

pub const API_URL: &str = "https://api.gemini.com";
pub const SANDBOX_URL: &str = "https://api.sandbox.gemini.com";
const VENUE: &str = "gemini";
const NEW_ORDER_PATH: &str = "/v1/order/new";

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    quote_url: String,
    order_url: String,
    credentials: Credentials,
}

#[derive(Debug, Deserialize)]
struct BookLevel {
    price: String,
}

#[derive(Debug, Deserialize)]
struct Book {
    #[serde(default)]
    bids: Vec<BookLevel>,
    #[serde(default)]
    asks: Vec<BookLevel>,
}

#[derive(Debug, Deserialize)]
struct OrderAck {
    order_id: String,
    #[serde(default)]
    is_cancelled: bool,
}

/// `{"bids":[{"price":"..","amount":"..","timestamp":".."}],"asks":[..]}`
pub(crate) fn parse_book(body: &str) -> Result<OrderBookQuote, ExchangeError> {
    let book: Book = serde_json::from_str(body).map_err(|e| ExchangeError::Parse(e.to_string()))?;

    let bid = match book.bids.first() {
        Some(level) => parse_price(&level.price)?,
        None => None,
    };
    let ask = match book.asks.first() {
        Some(level) => parse_price(&level.price)?,
        None => None,
    };
    Ok(OrderBookQuote::new(bid, ask))
}

/// Price tick and minimum order increment of the USD symbols
pub(crate) fn precision(asset: Asset) -> Precision {
    match asset {
        Asset::Btc => Precision::new(2, 8),
        Asset::Eth => Precision::new(2, 6),
        Asset::Xrp => Precision::new(5, 6),
    }
}

impl GeminiClient {
    pub fn new(http: Client, quote_url: String, order_url: String, credentials: Credentials) -> Self {
        Self {
            http,
            quote_url,
            order_url,
            credentials,
        }
    }

    /// BTC/USD -> btcusd
    pub fn symbol(pair: &TradingPair) -> String {
        pair.joined("").to_ascii_lowercase()
    }

    pub async fn best_quote(&self, pair: &TradingPair) -> Result<OrderBookQuote, ExchangeError> {
        let url = format!("{}/v1/book/{}", self.quote_url, Self::symbol(pair));
        let response = self
            .http
            .get(&url)
            .query(&[("limit_bids", "1"), ("limit_asks", "1")])
            .send()
            .await?;

        parse_book(&read_body(VENUE, response).await?)
    }

    /// Base64 payload and its hex HMAC-SHA384 signature
    pub(crate) fn signed_payload(
        &self,
        order: &LimitBuy,
        nonce: i64,
    ) -> Result<(String, String), ExchangeError> {
        let precision = precision(order.pair.base);
        let payload = json!({
            "request": NEW_ORDER_PATH,
            "nonce": nonce.to_string(),
            "symbol": Self::symbol(&order.pair),
            "amount": precision.quantity(order.quantity)?,
            "price": precision.price(order.limit_price)?,
            "side": "buy",
            "type": "exchange limit",
        });
        let encoded = general_purpose::STANDARD.encode(payload.to_string());
        let signature = hex::encode(hmac_sha384(
            self.credentials.secret.as_bytes(),
            encoded.as_bytes(),
        )?);
        Ok((encoded, signature))
    }

    pub async fn submit_limit_buy(&self, order: &LimitBuy) -> Result<OrderConfirmation, ExchangeError> {
        let (payload, signature) = self.signed_payload(order, unix_millis())?;
        let url = format!("{}{}", self.order_url, NEW_ORDER_PATH);

        let response = self
            .http
            .post(&url)
            .header("Content-Type", "text/plain")
            .header("Content-Length", "0")
            .header("Cache-Control", "no-cache")
            .header("X-GEMINI-APIKEY", &self.credentials.key)
            .header("X-GEMINI-PAYLOAD", payload)
            .header("X-GEMINI-SIGNATURE", signature)
            .send()
            .await?;

        let ack: OrderAck = serde_json::from_str(&read_body(VENUE, response).await?)
            .map_err(|e| ExchangeError::Parse(e.to_string()))?;
        if ack.is_cancelled {
            return Err(ExchangeError::Rejected(format!(
                "order {} cancelled on entry",
                ack.order_id
            )));
        }
        Ok(OrderConfirmation::accepted(ack.order_id, order))
    }
}
