//! Binance spot REST client

use reqwest::Client;
use serde::Deserialize;

use crate::domain::{Asset, OrderBookQuote, TradingPair};
use crate::ports::{ExchangeError, LimitBuy, OrderConfirmation};
use super::rest::{hmac_sha256, parse_price, read_body, unix_millis, Precision};
use super::Credentials;

pub const API_URL: &str = "https://api.binance.com";
pub const SANDBOX_URL: &str = "https://testnet.binance.vision";
const VENUE: &str = "binance";
const RECV_WINDOW_MS: u32 = 5000;

#[derive(Debug, Clone)]
pub struct BinanceClient {
    http: Client,
    quote_url: String,
    order_url: String,
    credentials: Credentials,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookTicker {
    bid_price: String,
    ask_price: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderAck {
    order_id: i64,
}

/// `{"symbol":"BTCUSDT","bidPrice":"..","askPrice":"..",..}`; a zero price is an empty side
pub(crate) fn parse_book_ticker(body: &str) -> Result<OrderBookQuote, ExchangeError> {
    let ticker: BookTicker =
        serde_json::from_str(body).map_err(|e| ExchangeError::Parse(e.to_string()))?;
    Ok(OrderBookQuote::new(
        parse_price(&ticker.bid_price)?,
        parse_price(&ticker.ask_price)?,
    ))
}

/// PRICE_FILTER tick and LOT_SIZE step for the USDT pairs
pub(crate) fn precision(asset: Asset) -> Precision {
    match asset {
        Asset::Btc => Precision::new(2, 5),
        Asset::Eth => Precision::new(2, 4),
        Asset::Xrp => Precision::new(4, 1),
    }
}

impl BinanceClient {
    pub fn new(http: Client, quote_url: String, order_url: String, credentials: Credentials) -> Self {
        Self {
            http,
            quote_url,
            order_url,
            credentials,
        }
    }

    /// BTC/USDT -> BTCUSDT
    pub fn symbol(pair: &TradingPair) -> String {
        pair.joined("")
    }

    pub async fn best_quote(&self, pair: &TradingPair) -> Result<OrderBookQuote, ExchangeError> {
        let url = format!("{}/api/v3/ticker/bookTicker", self.quote_url);
        let response = self
            .http
            .get(&url)
            .query(&[("symbol", Self::symbol(pair))])
            .send()
            .await?;

        parse_book_ticker(&read_body(VENUE, response).await?)
    }

    /// Signed query string for a GTC limit buy
    pub(crate) fn signed_order_query(
        &self,
        order: &LimitBuy,
        timestamp: i64,
    ) -> Result<String, ExchangeError> {
        let precision = precision(order.pair.base);
        let query = format!(
            "symbol={}&side=BUY&type=LIMIT&timeInForce=GTC&quantity={}&price={}&recvWindow={}&timestamp={}",
            Self::symbol(&order.pair),
            precision.quantity(order.quantity)?,
            precision.price(order.limit_price)?,
            RECV_WINDOW_MS,
            timestamp
        );
        let signature = hex::encode(hmac_sha256(
            self.credentials.secret.as_bytes(),
            query.as_bytes(),
        )?);
        Ok(format!("{}&signature={}", query, signature))
    }

    pub async fn submit_limit_buy(&self, order: &LimitBuy) -> Result<OrderConfirmation, ExchangeError> {
        let body = self.signed_order_query(order, unix_millis())?;
        let url = format!("{}/api/v3/order", self.order_url);

        let response = self
            .http
            .post(&url)
            .header("X-MBX-APIKEY", &self.credentials.key)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        let ack: OrderAck = serde_json::from_str(&read_body(VENUE, response).await?)
            .map_err(|e| ExchangeError::Parse(e.to_string()))?;
        Ok(OrderConfirmation::accepted(ack.order_id.to_string(), order))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn client(secret: &str) -> BinanceClient {
        BinanceClient::new(
            super::super::rest::http_client(Duration::from_secs(5)).unwrap(),
            API_URL.to_string(),
            SANDBOX_URL.to_string(),
            Credentials::new("key", secret),
        )
    }

    #[test]
    fn test_parse_book_ticker() {
        let body = r#"{"symbol":"BTCUSDT","bidPrice":"65000.01000000","bidQty":"1.2","askPrice":"65000.02000000","askQty":"0.3"}"#;
        let quote = parse_book_ticker(body).unwrap();
        assert_eq!(quote.bid, Some(65000.01));
        assert_eq!(quote.ask, Some(65000.02));
    }

    #[test]
    fn test_parse_empty_side() {
        let body = r#"{"symbol":"XRPUSDT","bidPrice":"0.00000000","bidQty":"0.0","askPrice":"0.52000000","askQty":"10"}"#;
        let quote = parse_book_ticker(body).unwrap();
        assert_eq!(quote.bid, None);
        assert_eq!(quote.ask, Some(0.52));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_book_ticker(r#"{"code":-1121,"msg":"Invalid symbol."}"#).is_err());
    }

    #[test]
    fn test_symbol() {
        assert_eq!(BinanceClient::symbol(&Asset::Eth.against("USDT")), "ETHUSDT");
    }

    #[test]
    fn test_order_signature() {
        let client = client("NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j");
        let order = LimitBuy::new(Asset::Btc.against("USDT"), 0.01, 65000.5);

        let query = client.signed_order_query(&order, 1499827319559).unwrap();
        let (unsigned, signature) = query.split_once("&signature=").unwrap();

        assert_eq!(
            unsigned,
            "symbol=BTCUSDT&side=BUY&type=LIMIT&timeInForce=GTC&quantity=0.01&price=65000.5&recvWindow=5000&timestamp=1499827319559"
        );
        let expected = hex::encode(
            hmac_sha256(client.credentials.secret.as_bytes(), unsigned.as_bytes()).unwrap(),
        );
        assert_eq!(signature, expected);
        assert_eq!(signature.len(), 64);
    }

    #[test]
    fn test_noisy_close_signed_at_tick() {
        let client = client("secret");
        let order = LimitBuy::new(Asset::Btc.against("USDT"), 0.012345678, 64950.25390625);

        let query = client.signed_order_query(&order, 1).unwrap();

        assert!(query.contains("&quantity=0.01234&price=64950.25&"));
    }

    #[test]
    fn test_quantity_below_lot_step_rejected() {
        let client = client("secret");
        let order = LimitBuy::new(Asset::Xrp.against("USDT"), 0.01, 0.52);

        assert!(matches!(
            client.signed_order_query(&order, 1),
            Err(ExchangeError::InvalidOrder(_))
        ));
    }
}
