use crate::domain::asset::Asset;
use crate::forecast::ForecastSet;
use crate::market::indicators::IndicatorSnapshot;
use crate::providers::news::Headline;
use crate::providers::ExternalMetrics;
use chrono::NaiveDate;
use serde::Serialize;

/// The flattened snapshot of the day's numbers handed to both model
/// prompts. Assembly collapses absent provider groups to their zero
/// defaults so the prompt text never needs to special-case a failure.
#[derive(Debug, Clone, Serialize)]
pub struct MarketBriefing {
    pub coin: String,
    pub coin_name: String,
    pub run_date: NaiveDate,
    pub actual_price: f64,
    pub trend_forecast: f64,
    pub window_forecast: f64,
    pub rsi: f64,
    pub macd: f64,
    pub sentiment_score: f64,
    pub funding_rate_pct: f64,
    pub open_interest_usd: f64,
    pub long_short_ratio: f64,
    pub futures_volume_24h_usd: f64,
    pub mvrv_ratio: f64,
    pub social_dominance_pct: f64,
    pub daily_active_addresses: f64,
    pub galaxy_score: f64,
    pub alt_rank: f64,
    pub market_cap_rank: f64,
    pub community_score: f64,
    pub developer_score: f64,
    pub sentiment_up_pct: f64,
    pub circulating_supply: f64,
    pub all_time_high: f64,
    pub transaction_volume_24h_usd: f64,
    pub top_headlines: Vec<Headline>,
}

impl MarketBriefing {
    #[allow(clippy::too_many_arguments)]
    pub fn assemble(
        run_date: NaiveDate,
        asset: &Asset,
        actual_price: f64,
        forecasts: &ForecastSet,
        indicators: Option<&IndicatorSnapshot>,
        metrics: &ExternalMetrics,
        sentiment_score: f64,
        headlines: Vec<Headline>,
    ) -> Self {
        let futures = metrics.futures.clone().unwrap_or_default();
        let onchain = metrics.onchain.clone().unwrap_or_default();
        let social = metrics.social.clone().unwrap_or_default();
        let fundamentals = metrics.fundamentals.clone().unwrap_or_default();
        let ind = indicators.cloned().unwrap_or_default();

        Self {
            coin: asset.ticker.to_string(),
            coin_name: asset.name.to_string(),
            run_date,
            actual_price,
            trend_forecast: forecasts.trend_close.unwrap_or(0.0),
            window_forecast: forecasts.window_close.unwrap_or(0.0),
            rsi: ind.rsi,
            macd: ind.macd,
            sentiment_score,
            funding_rate_pct: futures.funding_rate_pct,
            open_interest_usd: futures.open_interest_usd,
            long_short_ratio: futures.long_short_ratio,
            futures_volume_24h_usd: futures.volume_24h_usd,
            mvrv_ratio: onchain.mvrv_ratio,
            social_dominance_pct: onchain.social_dominance_pct,
            daily_active_addresses: onchain.daily_active_addresses,
            galaxy_score: social.galaxy_score,
            alt_rank: social.alt_rank,
            market_cap_rank: fundamentals.market_cap_rank,
            community_score: fundamentals.community_score,
            developer_score: fundamentals.developer_score,
            sentiment_up_pct: fundamentals.sentiment_up_pct,
            circulating_supply: fundamentals.circulating_supply,
            all_time_high: fundamentals.all_time_high,
            transaction_volume_24h_usd: fundamentals.transaction_volume_24h,
            top_headlines: headlines,
        }
    }

    /// The briefing as pretty JSON for prompt embedding.
    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::asset::ASSETS;

    #[test]
    fn absent_groups_flatten_to_zeros() {
        let briefing = MarketBriefing::assemble(
            NaiveDate::from_ymd_opt(2026, 8, 7).unwrap(),
            &ASSETS[0],
            65_000.0,
            &ForecastSet::default(),
            None,
            &ExternalMetrics::default(),
            0.1,
            Vec::new(),
        );

        assert_eq!(briefing.coin_name, "Bitcoin");
        assert_eq!(briefing.funding_rate_pct, 0.0);
        assert_eq!(briefing.mvrv_ratio, 0.0);
        assert_eq!(briefing.sentiment_score, 0.1);

        let json = briefing.to_prompt_json();
        assert!(json.contains("\"actual_price\""));
    }
}
