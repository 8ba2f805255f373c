use crate::domain::asset::Asset;
use crate::llm::{ChatClient, ChatRequest};
use crate::providers::news::Headline;

const MAX_SCORE_TOKENS: u32 = 10;

/// Scores the day's headlines between -1.0 (very negative) and 1.0 (very
/// positive). Every failure path (no headlines, transport error,
/// unparseable reply) collapses to 0.0 so the caller never branches.
pub async fn score_news_sentiment(
    llm: &dyn ChatClient,
    asset: &Asset,
    headlines: &[Headline],
) -> f64 {
    if headlines.is_empty() {
        tracing::warn!(coin = asset.ticker, "no recent headlines; sentiment defaults to 0");
        return 0.0;
    }

    let news_text = headlines
        .iter()
        .map(|h| {
            format!(
                "Title: {}. Desc: {}",
                h.title,
                h.description.as_deref().unwrap_or("")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let system = "You are a financial sentiment analyst. Based on the following news headlines, \
                  provide a single sentiment score from -1.0 (very negative) to 1.0 (very positive) \
                  for the cryptocurrency mentioned. Respond with only the numerical score and nothing else.";
    let user = format!(
        "Analyze the sentiment for {} from these articles:\n\n{news_text}",
        asset.name
    );

    let reply = match llm
        .chat(ChatRequest::text(system, user, 0.0, MAX_SCORE_TOKENS))
        .await
    {
        Ok(reply) => reply,
        Err(err) => {
            tracing::warn!(coin = asset.ticker, error = %err, "sentiment scoring failed; defaulting to 0");
            return 0.0;
        }
    };

    match extract_first_number(&reply) {
        Some(score) => score.clamp(-1.0, 1.0),
        None => {
            tracing::warn!(coin = asset.ticker, reply = %reply, "could not parse sentiment score; defaulting to 0");
            0.0
        }
    }
}

/// First parseable number in the reply, scanning maximal runs of numeric
/// characters.
fn extract_first_number(text: &str) -> Option<f64> {
    text.split(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
        .filter(|s| !s.is_empty())
        .find_map(|s| s.parse::<f64>().ok())
}
