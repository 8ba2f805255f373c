use crate::config::Settings;
use crate::providers::coinglass::provider_timeout_secs;
use anyhow::{Context, Result};
use chrono::{Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://newsapi.org";
const LOOKBACK_DAYS: i64 = 3;
const MAX_ARTICLES: usize = 10;

/// One news headline for the current run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Recent-news search client.
#[derive(Debug, Clone)]
pub struct NewsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl NewsClient {
    pub fn from_settings(settings: &Settings) -> Result<Option<Self>> {
        let Some(api_key) = settings.news_api_key.clone() else {
            return Ok(None);
        };

        let base_url =
            std::env::var("NEWS_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(provider_timeout_secs()))
            .build()
            .context("failed to build news http client")?;

        Ok(Some(Self {
            http,
            base_url,
            api_key,
        }))
    }

    /// Searches the last three days of English-language coverage for the
    /// asset's display name, newest first, capped at ten articles.
    pub async fn fetch_headlines(&self, query: &str) -> Result<Vec<Headline>> {
        let from_date = (Utc::now() - ChronoDuration::days(LOOKBACK_DAYS))
            .date_naive()
            .to_string();

        let url = format!("{}/v2/everything", self.base_url.trim_end_matches('/'));
        let res = self
            .http
            .get(url)
            .query(&[
                ("q", query),
                ("from", from_date.as_str()),
                ("sortBy", "publishedAt"),
                ("language", "en"),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await
            .context("news request failed")?;

        let status = res.status();
        let text = res.text().await.context("failed to read news response")?;
        if !status.is_success() {
            anyhow::bail!("news HTTP {status}: {text}");
        }

        let parsed: EverythingResponse = serde_json::from_str(&text)
            .with_context(|| format!("news response is not valid JSON: {text}"))?;

        Ok(collect_headlines(parsed.articles))
    }
}

fn collect_headlines(articles: Vec<Article>) -> Vec<Headline> {
    articles
        .into_iter()
        .filter_map(|a| {
            let title = a.title?.trim().to_string();
            let url = a.url?.trim().to_string();
            if title.is_empty() || url.is_empty() {
                return None;
            }
            Some(Headline {
                title,
                url,
                description: a.description.filter(|d| !d.trim().is_empty()),
            })
        })
        .take(MAX_ARTICLES)
        .collect()
}

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: Option<String>, url: Option<String>) -> Article {
        Article {
            title,
            description: Some("desc".to_string()),
            url,
        }
    }

    #[test]
    fn drops_articles_without_title_or_url() {
        let headlines = collect_headlines(vec![
            article(Some("A".to_string()), Some("https://a".to_string())),
            article(None, Some("https://b".to_string())),
            article(Some("C".to_string()), None),
            article(Some("  ".to_string()), Some("https://d".to_string())),
        ]);
        assert_eq!(headlines.len(), 1);
        assert_eq!(headlines[0].title, "A");
    }

    #[test]
    fn caps_at_ten_articles() {
        let many: Vec<Article> = (0..25)
            .map(|i| article(Some(format!("t{i}")), Some(format!("https://u/{i}"))))
            .collect();
        assert_eq!(collect_headlines(many).len(), MAX_ARTICLES);
    }
}
