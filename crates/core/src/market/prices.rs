use crate::config::Settings;
use crate::market::bars::DailyBar;
use anyhow::{Context, Result};
use chrono::DateTime;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Daily OHLCV history client. The chart endpoint needs no authentication.
#[derive(Debug, Clone)]
pub struct PriceHistoryClient {
    http: reqwest::Client,
    base_url: String,
}

impl PriceHistoryClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings
            .price_api_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_secs = std::env::var("PROVIDER_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build price history http client")?;

        Ok(Self { http, base_url })
    }

    /// Fetches `days` daily bars for `ticker`, oldest first. Bars with any
    /// missing OHLCV component are skipped.
    pub async fn fetch_daily_bars(&self, ticker: &str, days: u32) -> Result<Vec<DailyBar>> {
        let url = format!(
            "{}/v8/finance/chart/{ticker}",
            self.base_url.trim_end_matches('/')
        );

        let res = self
            .http
            .get(url)
            .query(&[("range", format!("{days}d")), ("interval", "1d".to_string())])
            .send()
            .await
            .context("price history request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read price history response")?;
        if !status.is_success() {
            anyhow::bail!("price history HTTP {status}: {text}");
        }

        let parsed: ChartEnvelope = serde_json::from_str(&text)
            .with_context(|| format!("price history response is not valid JSON: {text}"))?;

        let result = parsed
            .chart
            .result
            .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
            .with_context(|| format!("price history response has no result for {ticker}"))?;

        let quote = result
            .indicators
            .quote
            .into_iter()
            .next()
            .with_context(|| format!("price history response has no quote block for {ticker}"))?;

        Ok(assemble_bars(&result.timestamp, &quote))
    }
}

fn assemble_bars(timestamps: &[i64], quote: &QuoteBlock) -> Vec<DailyBar> {
    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        let Some(date) = DateTime::from_timestamp(*ts, 0).map(|dt| dt.date_naive()) else {
            continue;
        };
        let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = (
            value_at(&quote.open, i),
            value_at(&quote.high, i),
            value_at(&quote.low, i),
            value_at(&quote.close, i),
            value_at(&quote.volume, i),
        ) else {
            continue;
        };
        bars.push(DailyBar {
            date,
            open,
            high,
            low,
            close,
            volume,
        });
    }
    bars
}

fn value_at(values: &[Option<f64>], i: usize) -> Option<f64> {
    values.get(i).copied().flatten().filter(|v| v.is_finite())
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteBlock>,
}

#[derive(Debug, Deserialize, Default)]
struct QuoteBlock {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_chart_payload_and_skips_null_rows() {
        let payload = json!({
            "chart": {
                "result": [{
                    "timestamp": [1754438400i64, 1754524800i64, 1754611200i64],
                    "indicators": {
                        "quote": [{
                            "open":   [100.0, null, 102.0],
                            "high":   [101.0, 102.5, 103.0],
                            "low":    [99.0, 100.5, 101.0],
                            "close":  [100.5, 101.5, 102.5],
                            "volume": [1000.0, 1100.0, 1200.0]
                        }]
                    }
                }],
                "error": null
            }
        });

        let parsed: ChartEnvelope = serde_json::from_value(payload).unwrap();
        let result = parsed.chart.result.unwrap().remove(0);
        let quote = result.indicators.quote.into_iter().next().unwrap();
        let bars = assemble_bars(&result.timestamp, &quote);

        // The middle row has a null open and is dropped whole.
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 100.5);
        assert_eq!(bars[1].close, 102.5);
        assert!(bars[0].date < bars[1].date);
    }

    #[test]
    fn empty_result_yields_no_bars() {
        let quote = QuoteBlock::default();
        assert!(assemble_bars(&[], &quote).is_empty());
    }
}
