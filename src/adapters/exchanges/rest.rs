//! Shared REST plumbing for the venue clients: response handling, number
//! formatting, and HMAC signing.

use std::time::Duration;
use hmac::{Hmac, Mac};
use reqwest::Client;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use sha2::{Sha256, Sha384};

use crate::ports::ExchangeError;

const USER_AGENT: &str = concat!("crypto-arb-trader/", env!("CARGO_PKG_VERSION"));
const MAX_ERROR_BODY: usize = 512;

pub(crate) fn http_client(timeout: Duration) -> Result<Client, ExchangeError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(ExchangeError::Http)
}

/// Read the body, turning a non-2xx status into an API error
pub(crate) async fn read_body(
    venue: &str,
    response: reqwest::Response,
) -> Result<String, ExchangeError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let mut message = body;
        message.truncate(MAX_ERROR_BODY);
        return Err(ExchangeError::Api {
            venue: venue.to_string(),
            status: status.as_u16(),
            message,
        });
    }

    Ok(body)
}

/// Parse a price string. An empty string or zero means no resting order.
pub(crate) fn parse_price(raw: &str) -> Result<Option<f64>, ExchangeError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let price: f64 = raw
        .parse()
        .map_err(|_| ExchangeError::Parse(format!("invalid price '{}'", raw)))?;
    if price > 0.0 {
        Ok(Some(price))
    } else {
        Ok(None)
    }
}

/// Decimal places a venue accepts for one pair's price and quantity.
/// Every supported tick and lot step is a power of ten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Precision {
    pub price_dp: u32,
    pub quantity_dp: u32,
}

impl Precision {
    pub const fn new(price_dp: u32, quantity_dp: u32) -> Self {
        Self {
            price_dp,
            quantity_dp,
        }
    }

    /// Limit price truncated down to the tick
    pub fn price(&self, value: f64) -> Result<String, ExchangeError> {
        decimal_string(value, self.price_dp)
    }

    /// Quantity truncated to the lot step
    pub fn quantity(&self, value: f64) -> Result<String, ExchangeError> {
        decimal_string(value, self.quantity_dp)
    }
}

/// Render a value truncated to `dp` places as a plain decimal string (no
/// exponent). A value that truncates to zero is rejected.
pub(crate) fn decimal_string(value: f64, dp: u32) -> Result<String, ExchangeError> {
    let decimal = Decimal::from_f64(value)
        .ok_or_else(|| ExchangeError::InvalidOrder(format!("{} is not representable", value)))?
        .round_dp_with_strategy(dp, RoundingStrategy::ToZero)
        .normalize();

    if decimal <= Decimal::ZERO {
        return Err(ExchangeError::InvalidOrder(format!(
            "{} rounds to zero at {} decimal places",
            value, dp
        )));
    }
    Ok(decimal.to_string())
}

pub(crate) fn hmac_sha256(key: &[u8], message: &[u8]) -> Result<Vec<u8>, ExchangeError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .map_err(|e| ExchangeError::Credentials(format!("invalid signing key: {}", e)))?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

pub(crate) fn hmac_sha384(key: &[u8], message: &[u8]) -> Result<Vec<u8>, ExchangeError> {
    let mut mac = Hmac::<Sha384>::new_from_slice(key)
        .map_err(|e| ExchangeError::Credentials(format!("invalid signing key: {}", e)))?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

pub(crate) fn unix_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
