use crate::config::Settings;
use crate::providers::coinglass::provider_timeout_secs;
use crate::providers::FundamentalMetrics;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.coingecko.com";

/// Fundamentals/market-data client. The key travels as a query parameter.
#[derive(Debug, Clone)]
pub struct CoingeckoClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl CoingeckoClient {
    pub fn from_settings(settings: &Settings) -> Result<Option<Self>> {
        let Some(api_key) = settings.coingecko_api_key.clone() else {
            return Ok(None);
        };

        let base_url = std::env::var("COINGECKO_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(provider_timeout_secs()))
            .build()
            .context("failed to build coingecko http client")?;

        Ok(Some(Self {
            http,
            base_url,
            api_key,
        }))
    }

    pub async fn fetch_fundamentals(&self, coin_id: &str) -> Result<FundamentalMetrics> {
        let url = format!(
            "{}/api/v3/coins/{coin_id}",
            self.base_url.trim_end_matches('/')
        );

        let res = self
            .http
            .get(url)
            .query(&[("x_cg_demo_api_key", self.api_key.as_str())])
            .send()
            .await
            .context("coingecko request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read coingecko response")?;
        if !status.is_success() {
            anyhow::bail!("coingecko HTTP {status}: {text}");
        }

        let parsed: CoinDetail = serde_json::from_str(&text)
            .with_context(|| format!("coingecko response is not valid JSON: {text}"))?;

        Ok(extract_metrics(&parsed))
    }
}

/// Individual fields are frequently null on the free tier; each one falls
/// back to zero independently.
fn extract_metrics(coin: &CoinDetail) -> FundamentalMetrics {
    let market = coin.market_data.as_ref();
    FundamentalMetrics {
        market_cap_rank: coin.market_cap_rank.unwrap_or(0.0),
        community_score: coin.community_score.unwrap_or(0.0),
        developer_score: coin.developer_score.unwrap_or(0.0),
        sentiment_up_pct: coin.sentiment_votes_up_percentage.unwrap_or(0.0),
        circulating_supply: market.and_then(|m| m.circulating_supply).unwrap_or(0.0),
        all_time_high: market.and_then(|m| m.ath.usd).unwrap_or(0.0),
        transaction_volume_24h: market.and_then(|m| m.total_volume.usd).unwrap_or(0.0),
    }
}

#[derive(Debug, Deserialize)]
struct CoinDetail {
    market_cap_rank: Option<f64>,
    community_score: Option<f64>,
    developer_score: Option<f64>,
    sentiment_votes_up_percentage: Option<f64>,
    market_data: Option<MarketData>,
}

#[derive(Debug, Deserialize)]
struct MarketData {
    circulating_supply: Option<f64>,
    #[serde(default)]
    ath: UsdQuote,
    #[serde(default)]
    total_volume: UsdQuote,
}

#[derive(Debug, Deserialize, Default)]
struct UsdQuote {
    usd: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_every_field() {
        let coin: CoinDetail = serde_json::from_value(serde_json::json!({
            "market_cap_rank": 1,
            "community_score": 83.0,
            "developer_score": 99.2,
            "sentiment_votes_up_percentage": 74.5,
            "market_data": {
                "circulating_supply": 19700000.0,
                "ath": { "usd": 111000.0 },
                "total_volume": { "usd": 4.2e10 }
            }
        }))
        .unwrap();

        let m = extract_metrics(&coin);
        assert_eq!(m.market_cap_rank, 1.0);
        assert_eq!(m.all_time_high, 111_000.0);
        assert_eq!(m.transaction_volume_24h, 4.2e10);
    }

    #[test]
    fn null_fields_default_independently() {
        let coin: CoinDetail = serde_json::from_value(serde_json::json!({
            "market_cap_rank": 7,
            "market_data": { "ath": { "usd": 3.84 } }
        }))
        .unwrap();

        let m = extract_metrics(&coin);
        assert_eq!(m.market_cap_rank, 7.0);
        assert_eq!(m.all_time_high, 3.84);
        assert_eq!(m.community_score, 0.0);
        assert_eq!(m.circulating_supply, 0.0);
    }
}
