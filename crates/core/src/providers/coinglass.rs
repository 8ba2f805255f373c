use crate::config::Settings;
use crate::providers::FuturesMetrics;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://open-api.coinglass.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const EXCHANGE: &str = "Binance";

/// Perpetual-futures market data client. Authenticated via a secret header.
#[derive(Debug, Clone)]
pub struct CoinglassClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl CoinglassClient {
    /// Returns `None` when no API key is configured; the caller treats the
    /// provider as disabled.
    pub fn from_settings(settings: &Settings) -> Result<Option<Self>> {
        let Some(api_key) = settings.coinglass_api_key.clone() else {
            return Ok(None);
        };

        let base_url = std::env::var("COINGLASS_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(provider_timeout_secs()))
            .build()
            .context("failed to build coinglass http client")?;

        Ok(Some(Self {
            http,
            base_url,
            api_key,
        }))
    }

    pub async fn fetch_futures_metrics(&self, symbol: &str) -> Result<FuturesMetrics> {
        let mut headers = HeaderMap::new();
        headers.insert("accept", HeaderValue::from_static("application/json"));
        headers.insert("coinglassSecret", HeaderValue::from_str(&self.api_key)?);

        let url = format!(
            "{}/public/v2/perpetual_market",
            self.base_url.trim_end_matches('/')
        );

        let res = self
            .http
            .get(url)
            .headers(headers)
            .query(&[("ex", EXCHANGE), ("symbol", symbol)])
            .send()
            .await
            .context("coinglass request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read coinglass response")?;
        if !status.is_success() {
            anyhow::bail!("coinglass HTTP {status}: {text}");
        }

        let parsed: PerpetualMarketResponse = serde_json::from_str(&text)
            .with_context(|| format!("coinglass response is not valid JSON: {text}"))?;

        extract_metrics(&parsed, symbol)
    }
}

pub(crate) fn provider_timeout_secs() -> u64 {
    std::env::var("PROVIDER_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_TIMEOUT_SECS)
}

fn extract_metrics(res: &PerpetualMarketResponse, symbol: &str) -> Result<FuturesMetrics> {
    anyhow::ensure!(res.success, "coinglass response indicates failure");

    let markets = res
        .data
        .get(symbol)
        .with_context(|| format!("coinglass response has no data for {symbol}"))?;

    let market = markets
        .iter()
        .find(|m| m.exchange_name.as_deref() == Some(EXCHANGE))
        .with_context(|| format!("no {EXCHANGE} entry in coinglass data for {symbol}"))?;

    let long_rate = market.long_rate.unwrap_or(0.0);
    let short_rate = market.short_rate.unwrap_or(1.0);
    let long_short_ratio = if short_rate > 0.0 {
        long_rate / short_rate
    } else {
        0.0
    };

    Ok(FuturesMetrics {
        funding_rate_pct: market.rate.unwrap_or(0.0) * 100.0,
        open_interest_usd: market.open_interest.unwrap_or(0.0),
        long_short_ratio,
        volume_24h_usd: market.total_vol_usd.unwrap_or(0.0),
    })
}

#[derive(Debug, Deserialize)]
struct PerpetualMarketResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: BTreeMap<String, Vec<PerpetualMarket>>,
}

#[derive(Debug, Deserialize)]
struct PerpetualMarket {
    #[serde(rename = "exchangeName")]
    exchange_name: Option<String>,
    rate: Option<f64>,
    #[serde(rename = "openInterest")]
    open_interest: Option<f64>,
    #[serde(rename = "totalVolUsd")]
    total_vol_usd: Option<f64>,
    #[serde(rename = "longRate")]
    long_rate: Option<f64>,
    #[serde(rename = "shortRate")]
    short_rate: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(symbol: &str, body: serde_json::Value) -> PerpetualMarketResponse {
        serde_json::from_value(json!({
            "success": true,
            "data": { symbol: [body] }
        }))
        .unwrap()
    }

    #[test]
    fn extracts_binance_metrics() {
        let res = response(
            "BTC",
            json!({
                "exchangeName": "Binance",
                "rate": 0.0001,
                "openInterest": 5.0e9,
                "totalVolUsd": 2.0e10,
                "longRate": 1.5,
                "shortRate": 0.5
            }),
        );

        let m = extract_metrics(&res, "BTC").unwrap();
        assert!((m.funding_rate_pct - 0.01).abs() < 1e-12);
        assert_eq!(m.open_interest_usd, 5.0e9);
        assert_eq!(m.volume_24h_usd, 2.0e10);
        assert!((m.long_short_ratio - 3.0).abs() < 1e-12);
    }

    #[test]
    fn zero_short_rate_yields_zero_ratio() {
        let res = response(
            "ETH",
            json!({
                "exchangeName": "Binance",
                "rate": 0.0,
                "longRate": 1.0,
                "shortRate": 0.0
            }),
        );
        let m = extract_metrics(&res, "ETH").unwrap();
        assert_eq!(m.long_short_ratio, 0.0);
    }

    #[test]
    fn missing_exchange_is_an_error() {
        let res = response("BTC", json!({ "exchangeName": "OKX" }));
        assert!(extract_metrics(&res, "BTC").is_err());
    }
}
