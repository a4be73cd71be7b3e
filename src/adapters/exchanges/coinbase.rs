//! Coinbase Exchange REST client

use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::domain::{Asset, OrderBookQuote, TradingPair};
use crate::ports::{ExchangeError, LimitBuy, OrderConfirmation};
use super::rest::{hmac_sha256, parse_price, read_body, Precision};
use super::Credentials;

pub const API_URL: &str = "https://api.exchange.coinbase.com";
pub const SANDBOX_URL: &str = "https://api-public.sandbox.exchange.coinbase.com";
const VENUE: &str = "coinbase";
const ORDERS_PATH: &str = "/orders";

#[derive(Debug, Clone)]
pub struct CoinbaseClient {
    http: Client,
    quote_url: String,
    order_url: String,
    credentials: Credentials,
}

/// Level-1 book: each side holds at most `[price, size, num_orders]`
#[derive(Debug, Deserialize)]
struct Book {
    #[serde(default)]
    bids: Vec<(String, String, serde_json::Value)>,
    #[serde(default)]
    asks: Vec<(String, String, serde_json::Value)>,
}

#[derive(Debug, Deserialize)]
struct OrderAck {
    id: String,
    #[serde(default)]
    status: String,
}

pub(crate) fn parse_book(body: &str) -> Result<OrderBookQuote, ExchangeError> {
    let book: Book = serde_json::from_str(body).map_err(|e| ExchangeError::Parse(e.to_string()))?;

    let bid = match book.bids.first() {
        Some((price, _, _)) => parse_price(price)?,
        None => None,
    };
    let ask = match book.asks.first() {
        Some((price, _, _)) => parse_price(price)?,
        None => None,
    };
    Ok(OrderBookQuote::new(bid, ask))
}

/// quote_increment and base_increment of the USD products
pub(crate) fn precision(asset: Asset) -> Precision {
    match asset {
        Asset::Btc => Precision::new(2, 8),
        Asset::Eth => Precision::new(2, 8),
        Asset::Xrp => Precision::new(4, 6),
    }
}

impl CoinbaseClient {
    pub fn new(http: Client, quote_url: String, order_url: String, credentials: Credentials) -> Self {
        Self {
            http,
            quote_url,
            order_url,
            credentials,
        }
    }

    /// BTC/USD -> BTC-USD
    pub fn product_id(pair: &TradingPair) -> String {
        pair.joined("-")
    }

    pub async fn best_quote(&self, pair: &TradingPair) -> Result<OrderBookQuote, ExchangeError> {
        let url = format!("{}/products/{}/book", self.quote_url, Self::product_id(pair));
        let response = self
            .http
            .get(&url)
            .query(&[("level", "1")])
            .send()
            .await?;

        parse_book(&read_body(VENUE, response).await?)
    }

    /// base64(HMAC-SHA256(base64decode(secret), timestamp + method + path + body))
    pub(crate) fn sign(&self, timestamp: &str, method: &str, path: &str, body: &str) -> Result<String, ExchangeError> {
        let key = general_purpose::STANDARD
            .decode(&self.credentials.secret)
            .map_err(|e| ExchangeError::Credentials(format!("coinbase secret is not base64: {}", e)))?;
        let prehash = format!("{}{}{}{}", timestamp, method, path, body);
        Ok(general_purpose::STANDARD.encode(hmac_sha256(&key, prehash.as_bytes())?))
    }

    pub async fn submit_limit_buy(&self, order: &LimitBuy) -> Result<OrderConfirmation, ExchangeError> {
        let precision = precision(order.pair.base);
        let body = json!({
            "product_id": Self::product_id(&order.pair),
            "side": "buy",
            "type": "limit",
            "price": precision.price(order.limit_price)?,
            "size": precision.quantity(order.quantity)?,
            "time_in_force": "GTC",
        })
        .to_string();

        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = self.sign(&timestamp, "POST", ORDERS_PATH, &body)?;
        let passphrase = self.credentials.passphrase.clone().unwrap_or_default();

        let response = self
            .http
            .post(format!("{}{}", self.order_url, ORDERS_PATH))
            .header("Content-Type", "application/json")
            .header("CB-ACCESS-KEY", &self.credentials.key)
            .header("CB-ACCESS-SIGN", signature)
            .header("CB-ACCESS-TIMESTAMP", timestamp)
            .header("CB-ACCESS-PASSPHRASE", passphrase)
            .body(body)
            .send()
            .await?;

        let ack: OrderAck = serde_json::from_str(&read_body(VENUE, response).await?)
            .map_err(|e| ExchangeError::Parse(e.to_string()))?;
        if ack.status == "rejected" {
            return Err(ExchangeError::Rejected(format!("order {} rejected", ack.id)));
        }
        Ok(OrderConfirmation::accepted(ack.id, order))
    }
}
