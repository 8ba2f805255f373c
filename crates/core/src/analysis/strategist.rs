use crate::analysis::briefing::MarketBriefing;
use crate::domain::snapshot::{TradeAction, TradeRecommendation};
use crate::llm::{json, ChatClient, ChatRequest};
use serde::Deserialize;

const STRATEGY_TEMPERATURE: f32 = 0.3;

/// Asks the model for a structured trade setup over the next 24-72 hours.
/// Any transport, parse, or validation failure collapses to the HOLD
/// default so record assembly never branches on strategy failure.
pub async fn recommend_trade(llm: &dyn ChatClient, briefing: &MarketBriefing) -> TradeRecommendation {
    let request = ChatRequest::json(system_prompt(), user_prompt(briefing), STRATEGY_TEMPERATURE);

    let reply = match llm.chat(request).await {
        Ok(reply) => reply,
        Err(err) => {
            tracing::warn!(coin = %briefing.coin, error = %err, "trade recommendation failed");
            return TradeRecommendation::hold_default(format!(
                "Strategy generation failed due to API or processing error: {err}"
            ));
        }
    };

    let parsed = match json::parse_object::<LlmTradeSetup>(&reply) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::warn!(coin = %briefing.coin, error = %err, raw = %reply, "trade recommendation reply was malformed");
            return TradeRecommendation::hold_default(
                "Strategy generation failed: Invalid JSON structure.",
            );
        }
    };

    match parsed.validate() {
        Ok(recommendation) => recommendation,
        Err(err) => {
            tracing::warn!(coin = %briefing.coin, error = %err, "trade recommendation failed validation");
            TradeRecommendation::hold_default(format!("Strategy generation failed: {err}"))
        }
    }
}

fn system_prompt() -> &'static str {
    "You are a quantitative trading strategist that provides structured trade setups exclusively in JSON format."
}

fn user_prompt(briefing: &MarketBriefing) -> String {
    format!(
        "You are an expert cryptocurrency quantitative analyst and trading strategist. \
         Analyze the provided multi-source data for {name} and generate a high-probability \
         trade setup for the next 24-72 hour horizon.\n\
         \n\
         CRITICAL INSTRUCTION: Base your analysis *only* on the data provided.\n\
         \n\
         --- MARKET DATA SNAPSHOT ---\n\
         \n\
         [PRICE & FORECASTS]\n\
         - Current Price: ${price:.2}\n\
         - Trend-Model Forecast (24h): ${trend:.2}\n\
         - Window-Model Forecast (24h): ${window:.2}\n\
         \n\
         [TECHNICAL INDICATORS]\n\
         - RSI (14-day): {rsi:.2} (Interpretation: <30 Oversold, >70 Overbought)\n\
         - MACD (12, 26) Line: {macd:.4}\n\
         \n\
         [DERIVATIVES DATA]\n\
         - Funding Rate: {funding:.4}% (High positive suggests crowded longs; negative suggests crowded shorts)\n\
         - Open Interest: ${oi:.0}\n\
         - Long/Short Ratio: {ls:.2}\n\
         \n\
         [ON-CHAIN & SOCIAL DATA]\n\
         - MVRV Ratio: {mvrv:.2} (Interpretation: <1 Undervalued, >3.5 Overvalued)\n\
         - News Sentiment Score: {sentiment:.2} (-1.0 Bearish to 1.0 Bullish)\n\
         - Galaxy Score: {galaxy:.1}/100\n\
         \n\
         --- ANALYSIS TASK ---\n\
         Analyze the confluence between technical momentum, derivatives positioning, \
         on-chain value, and social sentiment. Identify potential setups \
         (trend continuation, mean reversion, squeeze potential).\n\
         \n\
         --- OUTPUT FORMAT ---\n\
         Provide the recommendation as a structured JSON object with these keys:\n\
         1. \"action\": (String) \"BUY\", \"SELL\", or \"HOLD\".\n\
         2. \"entry_range\": (String) the recommended entry price range; \"N/A\" for HOLD.\n\
         3. \"tp1\": (Float) realistic short-term take-profit target.\n\
         4. \"tp2\": (Float) optimistic take-profit target.\n\
         5. \"sl\": (Float) stop loss; must be defined for BUY/SELL.\n\
         6. \"confidence\": (Float) 0.0 (low confluence) to 1.0 (high confluence).\n\
         7. \"rationale\": (String) 2-3 sentences citing the specific data points.",
        name = briefing.coin_name,
        price = briefing.actual_price,
        trend = briefing.trend_forecast,
        window = briefing.window_forecast,
        rsi = briefing.rsi,
        macd = briefing.macd,
        funding = briefing.funding_rate_pct,
        oi = briefing.open_interest_usd,
        ls = briefing.long_short_ratio,
        mvrv = briefing.mvrv_ratio,
        sentiment = briefing.sentiment_score,
        galaxy = briefing.galaxy_score,
    )
}

#[derive(Debug, Clone, Deserialize)]
struct LlmTradeSetup {
    action: String,
    entry_range: String,
    tp1: f64,
    tp2: f64,
    sl: f64,
    confidence: f64,
    rationale: String,
}

impl LlmTradeSetup {
    fn validate(self) -> anyhow::Result<TradeRecommendation> {
        let action = TradeAction::parse(&self.action)
            .ok_or_else(|| anyhow::anyhow!("unknown action {:?}", self.action))?;

        anyhow::ensure!(
            (0.0..=1.0).contains(&self.confidence),
            "confidence out of range: {}",
            self.confidence
        );

        let rationale = self.rationale.trim().to_string();
        anyhow::ensure!(!rationale.is_empty(), "rationale must be non-empty");

        Ok(TradeRecommendation {
            action,
            entry_range: self.entry_range.trim().to_string(),
            take_profit_1: self.tp1,
            take_profit_2: self.tp2,
            stop_loss: self.sl,
            confidence: self.confidence,
            rationale,
        })
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

    fn briefing() -> MarketBriefing {
        MarketBriefing::assemble(
            NaiveDate::from_ymd_opt(2026, 8, 7).unwrap(),
            &ASSETS[0],
            65_000.0,
            &ForecastSet::default(),
            None,
            &ExternalMetrics::default(),
            0.0,
            Vec::new(),
        )
    }

    #[tokio::test]
    async fn valid_reply_becomes_a_recommendation() {
        let reply = serde_json::json!({
            "action": "BUY",
            "entry_range": "64500.00 - 65000.00",
            "tp1": 66000.0,
            "tp2": 68000.0,
            "sl": 63000.0,
            "confidence": 0.7,
            "rationale": "RSI recovering from oversold with positive funding reset."
        })
        .to_string();
        let llm = StubChat { reply: Ok(reply) };

        let rec = recommend_trade(&llm, &briefing()).await;
        assert_eq!(rec.action, TradeAction::Buy);
        assert_eq!(rec.take_profit_1, 66_000.0);
        assert_eq!(rec.confidence, 0.7);
    }

    #[tokio::test]
    async fn unknown_action_falls_back_to_hold() {
        let reply = serde_json::json!({
            "action": "LONG",
            "entry_range": "N/A",
            "tp1": 0.0, "tp2": 0.0, "sl": 0.0,
            "confidence": 0.5,
            "rationale": "r"
        })
        .to_string();
        let llm = StubChat { reply: Ok(reply) };

        let rec = recommend_trade(&llm, &briefing()).await;
        assert_eq!(rec.action, TradeAction::Hold);
        assert_eq!(rec.confidence, 0.0);
    }

    #[tokio::test]
    async fn missing_keys_fall_back_to_hold() {
        let llm = StubChat { reply: Ok("{\"action\": \"BUY\"}".to_string()) };
        let rec = recommend_trade(&llm, &briefing()).await;
        assert_eq!(rec.action, TradeAction::Hold);
        assert!(rec.rationale.contains("Invalid JSON structure"));
    }

    #[tokio::test]
    async fn out_of_range_confidence_falls_back_to_hold() {
        let reply = serde_json::json!({
            "action": "SELL",
            "entry_range": "65000 - 65500",
            "tp1": 64000.0, "tp2": 63000.0, "sl": 66000.0,
            "confidence": 1.5,
            "rationale": "r"
        })
        .to_string();
        let llm = StubChat { reply: Ok(reply) };
        let rec = recommend_trade(&llm, &briefing()).await;
        assert_eq!(rec.action, TradeAction::Hold);
    }

    #[tokio::test]
    async fn transport_error_falls_back_to_hold() {
        let llm = StubChat { reply: Err(anyhow::anyhow!("http 500")) };
        let rec = recommend_trade(&llm, &briefing()).await;
        assert_eq!(rec.action, TradeAction::Hold);
        assert!(rec.rationale.contains("Strategy generation failed"));
    }
}
