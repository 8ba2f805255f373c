use crate::analysis::briefing::MarketBriefing;
use crate::llm::{json, ChatClient, ChatRequest};
use crate::providers::news::Headline;
use serde::{Deserialize, Serialize};

const REPORT_TEMPERATURE: f32 = 0.4;
const MAX_INFLUENTIAL_HEADLINES: usize = 3;

/// The multi-section daily market report. Always well-formed: a failed
/// model call produces the placeholder variant, never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketReport {
    pub title: String,
    pub price_action_recap: String,
    pub bullish_case: String,
    pub bearish_case: String,
    pub hypothesis: String,
    /// Bullish and bearish cases combined into one markdown block.
    pub summary: String,
    /// The model-selected headlines, re-matched to their source URLs.
    pub influential_headlines: Vec<Headline>,
}

impl MarketReport {
    /// The placeholder report used whenever the model call or its reply
    /// fails; the failure detail lands in the hypothesis field.
    pub fn failed(detail: impl std::fmt::Display) -> Self {
        Self {
            title: "Analysis Failed".to_string(),
            price_action_recap: String::new(),
            bullish_case: String::new(),
            bearish_case: String::new(),
            hypothesis: detail.to_string(),
            summary: "AI analysis could not be generated due to an API error.".to_string(),
            influential_headlines: Vec::new(),
        }
    }
}

/// Asks the model for the five report sections plus its pick of the most
/// influential headlines, then validates and post-filters the reply.
pub async fn generate_market_report(llm: &dyn ChatClient, briefing: &MarketBriefing) -> MarketReport {
    let request = ChatRequest::json(system_prompt(), user_prompt(briefing), REPORT_TEMPERATURE);

    let reply = match llm.chat(request).await {
        Ok(reply) => reply,
        Err(err) => {
            tracing::warn!(coin = %briefing.coin, error = %err, "market report generation failed");
            return MarketReport::failed(err);
        }
    };

    match json::parse_object::<LlmMarketReport>(&reply) {
        Ok(parsed) => parsed.into_report(&briefing.top_headlines),
        Err(err) => {
            tracing::warn!(coin = %briefing.coin, error = %err, raw = %reply, "market report reply was malformed");
            MarketReport::failed(err)
        }
    }
}

/// Re-associates model-selected titles with their source URLs by exact
/// string match; titles the model invented or rewrote are dropped.
pub fn match_influential_headlines(selected: &[String], headlines: &[Headline]) -> Vec<Headline> {
    selected
        .iter()
        .take(MAX_INFLUENTIAL_HEADLINES)
        .filter_map(|title| headlines.iter().find(|h| h.title == *title))
        .map(|h| Headline {
            title: h.title.clone(),
            url: h.url.clone(),
            description: None,
        })
        .collect()
}

fn system_prompt() -> String {
    [
        "You are an expert crypto market analyst writing a daily briefing.",
        "Your tone is objective, data-driven, and insightful.",
        "Synthesize the provided market data into a multi-part report.",
        "Respond with a single valid JSON object holding exactly these keys:",
        "1. \"title\": a compelling, news-style headline for today's analysis.",
        "2. \"price_action_recap\": 1-2 sentences on recent price action and the levels being tested.",
        "3. \"bullish_case\": a markdown string; each point starts with a bolded title and cites a specific metric.",
        "4. \"bearish_case\": a markdown string in the same format.",
        "5. \"analyst_hypothesis\": 2-3 sentences synthesizing both cases into a short-term directional view.",
        "6. \"influential_headlines\": an array of at most 3 title strings, copied verbatim from the provided headlines.",
    ]
    .join("\n")
}

fn user_prompt(briefing: &MarketBriefing) -> String {
    format!(
        "Generate a comprehensive market analysis report for {} based on the following data. \
         Directly cite the data points in your analysis.\n\n```json\n{}\n```",
        briefing.coin_name,
        briefing.to_prompt_json()
    )
}

#[derive(Debug, Clone, Deserialize)]
struct LlmMarketReport {
    title: String,
    #[serde(default)]
    price_action_recap: String,
    #[serde(default)]
    bullish_case: String,
    #[serde(default)]
    bearish_case: String,
    #[serde(default)]
    analyst_hypothesis: String,
    #[serde(default)]
    influential_headlines: Vec<String>,
}

impl LlmMarketReport {
    fn into_report(self, headlines: &[Headline]) -> MarketReport {
        let summary = format!(
            "### Bullish Case\n{}\n\n### Bearish Case\n{}",
            self.bullish_case, self.bearish_case
        );
        MarketReport {
            title: self.title,
            price_action_recap: self.price_action_recap,
            bullish_case: self.bullish_case,
            bearish_case: self.bearish_case,
            hypothesis: self.analyst_hypothesis,
            summary,
            influential_headlines: match_influential_headlines(
                &self.influential_headlines,
                headlines,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::asset::ASSETS;
    use crate::forecast::ForecastSet;
    use crate::providers::ExternalMetrics;
    use chrono::NaiveDate;

    struct StubChat {
        reply: anyhow::Result<String>,
    }

    #[async_trait::async_trait]
    impl ChatClient for StubChat {
        async fn chat(&self, _request: ChatRequest) -> anyhow::Result<String> {
            match &self.reply {
                Ok(s) => Ok(s.clone()),
                Err(e) => Err(anyhow::anyhow!("{e}")),
            }
        }
    }

    fn headline(title: &str, url: &str) -> Headline {
        Headline {
            title: title.to_string(),
            url: url.to_string(),
            description: None,
        }
    }

    fn briefing_with_headlines(headlines: Vec<Headline>) -> MarketBriefing {
        MarketBriefing::assemble(
            NaiveDate::from_ymd_opt(2026, 8, 7).unwrap(),
            &ASSETS[0],
            65_000.0,
            &ForecastSet::default(),
            None,
            &ExternalMetrics::default(),
            0.0,
            headlines,
        )
    }

    #[test]
    fn back_matching_keeps_only_verbatim_titles() {
        let headlines = vec![headline("A", "u1"), headline("B", "u2")];
        let selected = vec!["B".to_string(), "C".to_string()];
        let matched = match_influential_headlines(&selected, &headlines);
        assert_eq!(matched, vec![headline("B", "u2")]);
    }

    #[test]
    fn back_matching_is_exact_not_fuzzy() {
        let headlines = vec![headline("Bitcoin rallies", "u1")];
        let selected = vec!["bitcoin rallies".to_string(), "Bitcoin rallies!".to_string()];
        assert!(match_influential_headlines(&selected, &headlines).is_empty());
    }

    #[test]
    fn back_matching_caps_at_three() {
        let headlines: Vec<Headline> = (0..5)
            .map(|i| headline(&format!("t{i}"), &format!("u{i}")))
            .collect();
        let selected: Vec<String> = (0..5).map(|i| format!("t{i}")).collect();
        assert_eq!(match_influential_headlines(&selected, &headlines).len(), 3);
    }

    #[tokio::test]
    async fn valid_reply_becomes_a_report() {
        let reply = serde_json::json!({
            "title": "BTC Holds the Line",
            "price_action_recap": "Price is consolidating.",
            "bullish_case": "**On-Chain Accumulation**: MVRV below 1.",
            "bearish_case": "**Overheated Derivatives**: funding elevated.",
            "analyst_hypothesis": "Range-bound near-term.",
            "influential_headlines": ["B"]
        })
        .to_string();
        let llm = StubChat { reply: Ok(reply) };

        let briefing = briefing_with_headlines(vec![headline("A", "u1"), headline("B", "u2")]);
        let report = generate_market_report(&llm, &briefing).await;

        assert_eq!(report.title, "BTC Holds the Line");
        assert!(report.summary.contains("### Bullish Case"));
        assert!(report.summary.contains("### Bearish Case"));
        assert_eq!(report.influential_headlines, vec![headline("B", "u2")]);
    }

    #[tokio::test]
    async fn malformed_reply_yields_the_placeholder() {
        let llm = StubChat { reply: Ok("not json at all".to_string()) };
        let report = generate_market_report(&llm, &briefing_with_headlines(Vec::new())).await;
        assert_eq!(report.title, "Analysis Failed");
        assert!(report.influential_headlines.is_empty());
    }

    #[tokio::test]
    async fn transport_error_yields_the_placeholder() {
        let llm = StubChat { reply: Err(anyhow::anyhow!("timeout")) };
        let report = generate_market_report(&llm, &briefing_with_headlines(Vec::new())).await;
        assert_eq!(report.title, "Analysis Failed");
    }
}
