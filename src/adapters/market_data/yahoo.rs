use std::collections::HashMap;
use std::time::Duration;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::config::MarketDataSection;
use crate::domain::{Asset, MarketSnapshot};
use crate::ports::{HistoryWindow, MarketDataError, MarketDataPort};

// The chart API turns away requests without a browser-like agent
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) crypto-arb-trader";

#[derive(Debug, Clone)]
pub struct YahooFinanceSource {
    http: Client,
    base_url: String,
    quote_currency: String,
    max_staleness: Duration,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Latest close in a chart response
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LatestClose {
    pub price: f64,
    pub at: DateTime<Utc>,
}

/// Extract the last non-null close and its candle time
pub(crate) fn parse_chart(symbol: &str, body: &str) -> Result<LatestClose, MarketDataError> {
    let envelope: ChartEnvelope =
        serde_json::from_str(body).map_err(|e| MarketDataError::Parse(format!("{}: {}", symbol, e)))?;

    if let Some(error) = envelope.chart.error {
        return Err(MarketDataError::Provider(format!(
            "{}: {} {}",
            symbol, error.code, error.description
        )));
    }

    let result = envelope
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| MarketDataError::MissingSymbol(symbol.to_string()))?;

    let closes = result
        .indicators
        .quote
        .first()
        .map(|series| series.close.as_slice())
        .unwrap_or_default();

    let (index, price) = closes
        .iter()
        .enumerate()
        .rev()
        .find_map(|(i, close)| close.filter(|c| c.is_finite() && *c > 0.0).map(|c| (i, c)))
        .ok_or_else(|| MarketDataError::MissingSymbol(symbol.to_string()))?;

    let at = result
        .timestamp
        .get(index)
        .and_then(|ts| Utc.timestamp_opt(*ts, 0).single())
        .ok_or_else(|| MarketDataError::Parse(format!("{}: close without timestamp", symbol)))?;

    Ok(LatestClose { price, at })
}

pub(crate) fn check_fresh(
    symbol: &str,
    close: &LatestClose,
    now: DateTime<Utc>,
    max_staleness: Duration,
) -> Result<(), MarketDataError> {
    let age_secs = (now - close.at).num_seconds();
    if age_secs > max_staleness.as_secs() as i64 {
        return Err(MarketDataError::Stale {
            symbol: symbol.to_string(),
            age_secs,
        });
    }
    Ok(())
}

impl YahooFinanceSource {
    pub fn new(section: &MarketDataSection, timeout: Duration) -> Result<Self, MarketDataError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            base_url: section.base_url.trim_end_matches('/').to_string(),
            quote_currency: section.quote_currency.to_ascii_uppercase(),
            max_staleness: Duration::from_secs(section.max_staleness_secs),
        })
    }

    /// Provider ticker, e.g. BTC-USD
    pub fn ticker(&self, asset: Asset) -> String {
        asset.against(&self.quote_currency).joined("-")
    }

    async fn latest_close(
        &self,
        ticker: &str,
        window: &HistoryWindow,
    ) -> Result<LatestClose, MarketDataError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);
        let response = self
            .http
            .get(&url)
            .query(&[("range", &window.period), ("interval", &window.interval)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        // Unknown symbols come back as 404 with a chart error body
        match parse_chart(ticker, &body) {
            Err(MarketDataError::Parse(_)) if !status.is_success() => Err(
                MarketDataError::Provider(format!("{}: HTTP {}", ticker, status.as_u16())),
            ),
            other => other,
        }
    }
}

#[async_trait]
impl MarketDataPort for YahooFinanceSource {
    async fn fetch(
        &self,
        assets: &[Asset],
        window: &HistoryWindow,
    ) -> Result<MarketSnapshot, MarketDataError> {
        let mut prices = HashMap::with_capacity(assets.len());

        for asset in assets {
            let ticker = self.ticker(*asset);
            let close = self.latest_close(&ticker, window).await?;
            check_fresh(&ticker, &close, Utc::now(), self.max_staleness)?;

            tracing::debug!("{} close {} at {}", ticker, close.price, close.at);
            prices.insert(*asset, close.price);
        }

        Ok(MarketSnapshot::new(prices, Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHART: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"currency": "USD", "symbol": "BTC-USD"},
                "timestamp": [1700000000, 1700003600, 1700007200],
                "indicators": {"quote": [{
                    "open": [64000.0, 64500.0, null],
                    "close": [64400.5, 64950.25, null]
                }]}
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_parse_chart_skips_trailing_null() {
        let close = parse_chart("BTC-USD", CHART).unwrap();
        assert_eq!(close.price, 64950.25);
        assert_eq!(close.at.timestamp(), 1700003600);
    }

    #[test]
    fn test_parse_chart_provider_error() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        assert!(matches!(
            parse_chart("FOO-USD", body),
            Err(MarketDataError::Provider(_))
        ));
    }

    #[test]
    fn test_parse_chart_all_null_closes() {
        let body = r#"{"chart":{"result":[{"timestamp":[1700000000],"indicators":{"quote":[{"close":[null]}]}}],"error":null}}"#;
        assert!(matches!(
            parse_chart("XRP-USD", body),
            Err(MarketDataError::MissingSymbol(_))
        ));
    }

    #[test]
    fn test_parse_chart_garbage() {
        assert!(matches!(
            parse_chart("ETH-USD", "<html>rate limited</html>"),
            Err(MarketDataError::Parse(_))
        ));
    }

    #[test]
    fn test_staleness() {
        let close = LatestClose {
            price: 1.0,
            at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        };
        let max = Duration::from_secs(7200);

        let fresh = Utc.timestamp_opt(1_700_003_600, 0).unwrap();
        assert!(check_fresh("BTC-USD", &close, fresh, max).is_ok());

        let stale = Utc.timestamp_opt(1_700_010_000, 0).unwrap();
        assert!(matches!(
            check_fresh("BTC-USD", &close, stale, max),
            Err(MarketDataError::Stale { age_secs: 10_000, .. })
        ));
    }

    #[test]
    fn test_ticker() {
        let source = YahooFinanceSource::new(&MarketDataSection::default(), Duration::from_secs(5)).unwrap();
        assert_eq!(source.ticker(Asset::Eth), "ETH-USD");
    }

    #[tokio::test]
    async fn test_unreachable_provider_fails_whole_fetch() {
        let section = MarketDataSection {
            base_url: "http://127.0.0.1:9".to_string(),
            ..MarketDataSection::default()
        };
        let source = YahooFinanceSource::new(&section, Duration::from_secs(2)).unwrap();
        let result = source.fetch(&Asset::ALL, &HistoryWindow::default()).await;
        assert!(matches!(result, Err(MarketDataError::Http(_))));
    }

    #[tokio::test]
    async fn test_no_assets_is_empty_snapshot() {
        let source = YahooFinanceSource::new(&MarketDataSection::default(), Duration::from_secs(2)).unwrap();
        let snapshot = source.fetch(&[], &HistoryWindow::default()).await.unwrap();
        assert!(snapshot.is_empty());
    }
}
