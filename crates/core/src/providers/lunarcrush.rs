use crate::config::Settings;
use crate::providers::coinglass::provider_timeout_secs;
use crate::providers::SocialMetrics;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://lunarcrush.com";

/// Social-engagement ranking client, authenticated with a bearer token.
#[derive(Debug, Clone)]
pub struct LunarcrushClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl LunarcrushClient {
    pub fn from_settings(settings: &Settings) -> Result<Option<Self>> {
        let Some(api_key) = settings.lunarcrush_api_key.clone() else {
            return Ok(None);
        };

        let base_url = std::env::var("LUNARCRUSH_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(provider_timeout_secs()))
            .build()
            .context("failed to build lunarcrush http client")?;

        Ok(Some(Self {
            http,
            base_url,
            api_key,
        }))
    }

    pub async fn fetch_social_metrics(&self, symbol: &str) -> Result<SocialMetrics> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))?,
        );

        let url = format!(
            "{}/api4/public/coins/{symbol}/v1",
            self.base_url.trim_end_matches('/')
        );

        let res = self
            .http
            .get(url)
            .headers(headers)
            .send()
            .await
            .context("lunarcrush request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read lunarcrush response")?;
        if !status.is_success() {
            anyhow::bail!("lunarcrush HTTP {status}: {text}");
        }

        let parsed: CoinResponse = serde_json::from_str(&text)
            .with_context(|| format!("lunarcrush response is not valid JSON: {text}"))?;

        let data = parsed
            .data
            .with_context(|| format!("lunarcrush response has no data for {symbol}"))?;

        Ok(SocialMetrics {
            galaxy_score: data
                .galaxy_score
                .with_context(|| format!("lunarcrush galaxy score missing for {symbol}"))?,
            alt_rank: data
                .alt_rank
                .with_context(|| format!("lunarcrush alt rank missing for {symbol}"))?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CoinResponse {
    data: Option<CoinData>,
}

#[derive(Debug, Deserialize)]
struct CoinData {
    galaxy_score: Option<f64>,
    alt_rank: Option<f64>,
}
