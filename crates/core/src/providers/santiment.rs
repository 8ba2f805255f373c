use crate::config::Settings;
use crate::providers::coinglass::provider_timeout_secs;
use crate::providers::OnChainMetrics;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.santiment.net";

/// On-chain/social metrics client speaking the provider's GraphQL API.
#[derive(Debug, Clone)]
pub struct SantimentClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SantimentClient {
    pub fn from_settings(settings: &Settings) -> Result<Option<Self>> {
        let Some(api_key) = settings.santiment_api_key.clone() else {
            return Ok(None);
        };

        let base_url = std::env::var("SANTIMENT_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(provider_timeout_secs()))
            .build()
            .context("failed to build santiment http client")?;

        Ok(Some(Self {
            http,
            base_url,
            api_key,
        }))
    }

    pub async fn fetch_onchain_metrics(&self, slug: &str) -> Result<OnChainMetrics> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&format!("Apikey {}", self.api_key))?,
        );

        let url = format!("{}/graphql", self.base_url.trim_end_matches('/'));
        let res = self
            .http
            .post(url)
            .headers(headers)
            .json(&json!({ "query": metrics_query(slug) }))
            .send()
            .await
            .context("santiment request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read santiment response")?;
        if !status.is_success() {
            anyhow::bail!("santiment HTTP {status}: {text}");
        }

        let parsed: GraphqlResponse = serde_json::from_str(&text)
            .with_context(|| format!("santiment response is not valid JSON: {text}"))?;

        extract_metrics(&parsed, slug)
    }
}

/// One aliased getMetric block per metric, each asking for the last two
/// daily points so a not-yet-finalized current day still leaves a value.
fn metrics_query(slug: &str) -> String {
    let series = |alias: &str, metric: &str| {
        format!(
            "{alias}: getMetric(metric: \"{metric}\") {{ \
               timeseriesData(slug: \"{slug}\", from: \"utc_now-2d\", to: \"utc_now\", interval: \"1d\") {{ value }} \
             }}"
        )
    };

    format!(
        "query {{ {} {} {} }}",
        series("mvrv", "mvrv_usd"),
        series("socialDominance", "social_dominance_total"),
        series("activeAddresses", "daily_active_addresses"),
    )
}

fn extract_metrics(res: &GraphqlResponse, slug: &str) -> Result<OnChainMetrics> {
    let data = res
        .data
        .as_ref()
        .with_context(|| format!("santiment response has no data for {slug}"))?;

    Ok(OnChainMetrics {
        mvrv_ratio: last_value(&data.mvrv)
            .with_context(|| format!("santiment mvrv series empty for {slug}"))?,
        social_dominance_pct: last_value(&data.social_dominance)
            .with_context(|| format!("santiment social dominance series empty for {slug}"))?,
        daily_active_addresses: last_value(&data.active_addresses)
            .with_context(|| format!("santiment active addresses series empty for {slug}"))?,
    })
}

fn last_value(metric: &Option<MetricBlock>) -> Option<f64> {
    metric
        .as_ref()?
        .timeseries_data
        .iter()
        .rev()
        .find_map(|p| p.value)
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<MetricsData>,
}

#[derive(Debug, Deserialize)]
struct MetricsData {
    mvrv: Option<MetricBlock>,
    #[serde(rename = "socialDominance")]
    social_dominance: Option<MetricBlock>,
    #[serde(rename = "activeAddresses")]
    active_addresses: Option<MetricBlock>,
}

#[derive(Debug, Deserialize)]
struct MetricBlock {
    #[serde(rename = "timeseriesData", default)]
    timeseries_data: Vec<MetricPoint>,
}

#[derive(Debug, Deserialize)]
struct MetricPoint {
    value: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_names_every_metric() {
        let q = metrics_query("bitcoin");
        assert!(q.contains("mvrv_usd"));
        assert!(q.contains("social_dominance_total"));
        assert!(q.contains("daily_active_addresses"));
        assert!(q.contains("slug: \"bitcoin\""));
    }

    #[test]
    fn takes_the_most_recent_non_null_value() {
        let res: GraphqlResponse = serde_json::from_value(serde_json::json!({
            "data": {
                "mvrv": { "timeseriesData": [ { "value": 1.5 }, { "value": null } ] },
                "socialDominance": { "timeseriesData": [ { "value": 20.0 }, { "value": 21.0 } ] },
                "activeAddresses": { "timeseriesData": [ { "value": 800000.0 } ] }
            }
        }))
        .unwrap();

        let m = extract_metrics(&res, "bitcoin").unwrap();
        assert_eq!(m.mvrv_ratio, 1.5);
        assert_eq!(m.social_dominance_pct, 21.0);
        assert_eq!(m.daily_active_addresses, 800_000.0);
    }

    #[test]
    fn empty_series_is_an_error() {
        let res: GraphqlResponse = serde_json::from_value(serde_json::json!({
            "data": {
                "mvrv": { "timeseriesData": [] },
                "socialDominance": { "timeseriesData": [ { "value": 20.0 } ] },
                "activeAddresses": { "timeseriesData": [ { "value": 1.0 } ] }
            }
        }))
        .unwrap();
        assert!(extract_metrics(&res, "bitcoin").is_err());
    }
}
