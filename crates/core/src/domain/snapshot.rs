use crate::analysis::analyst::MarketReport;
use crate::domain::asset::Asset;
use crate::forecast::ForecastSet;
use crate::market::indicators::IndicatorSnapshot;
use crate::providers::ExternalMetrics;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One point of the multi-day high forecast. Persisted as a JSON array of
/// these objects; this is the canonical schema for the forecast sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighForecastPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

impl TradeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeAction::Buy => "BUY",
            TradeAction::Sell => "SELL",
            TradeAction::Hold => "HOLD",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Some(TradeAction::Buy),
            "SELL" => Some(TradeAction::Sell),
            "HOLD" => Some(TradeAction::Hold),
            _ => None,
        }
    }
}

/// Structured trade recommendation for the next 24-72h horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecommendation {
    pub action: TradeAction,
    pub entry_range: String,
    pub take_profit_1: f64,
    pub take_profit_2: f64,
    pub stop_loss: f64,
    pub confidence: f64,
    pub rationale: String,
}

impl TradeRecommendation {
    /// The well-formed fallback used whenever strategy generation fails.
    pub fn hold_default(rationale: impl Into<String>) -> Self {
        Self {
            action: TradeAction::Hold,
            entry_range: "N/A".to_string(),
            take_profit_1: 0.0,
            take_profit_2: 0.0,
            stop_loss: 0.0,
            confidence: 0.0,
            rationale: rationale.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackDecision {
    Confirmed,
    Denied,
}

impl FeedbackDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackDecision::Confirmed => "Confirmed",
            FeedbackDecision::Denied => "Denied",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "Confirmed" => Some(FeedbackDecision::Confirmed),
            "Denied" => Some(FeedbackDecision::Denied),
            _ => None,
        }
    }
}

/// One fully assembled row for the `forecasts` table: everything the daily
/// run produced for one asset. Numeric fields from failed providers hold
/// 0.0; the substitution happens in [`SnapshotRecord::assemble`] and nowhere
/// else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub run_date: NaiveDate,
    pub coin: String,
    pub actual_price: f64,
    pub trend_forecast: f64,
    pub window_forecast: f64,
    pub sentiment_score: f64,
    pub rsi: f64,
    pub macd: f64,
    pub all_time_high: f64,
    pub high_forecast: Vec<HighForecastPoint>,
    pub funding_rate: f64,
    pub open_interest: f64,
    pub long_short_ratio: f64,
    pub futures_volume_24h: f64,
    pub mvrv_ratio: f64,
    pub social_dominance: f64,
    pub daily_active_addresses: f64,
    pub galaxy_score: f64,
    pub alt_rank: f64,
    pub market_cap_rank: f64,
    pub community_score: f64,
    pub developer_score: f64,
    pub sentiment_up_pct: f64,
    pub circulating_supply: f64,
    pub transaction_volume_24h: f64,
    pub analysis_summary: String,
    pub analysis_hypothesis: String,
    /// Serialized JSON array of the influential headlines.
    pub analysis_news_links: String,
    pub report_title: String,
    pub report_recap: String,
    pub report_bullish: String,
    pub report_bearish: String,
    pub report_hypothesis: String,
    pub action: TradeAction,
    pub entry_range: String,
    pub take_profit_1: f64,
    pub take_profit_2: f64,
    pub stop_loss: f64,
    pub confidence: f64,
    pub rationale: String,
}

impl SnapshotRecord {
    /// Builds the persisted row from the day's outputs. This is the single
    /// place where an absent provider group or forecast collapses to its
    /// zero/empty default; upstream everything stays `Option`.
    #[allow(clippy::too_many_arguments)]
    pub fn assemble(
        run_date: NaiveDate,
        asset: &Asset,
        actual_price: f64,
        forecasts: &ForecastSet,
        indicators: Option<&IndicatorSnapshot>,
        metrics: &ExternalMetrics,
        sentiment_score: f64,
        report: &MarketReport,
        recommendation: &TradeRecommendation,
    ) -> Self {
        let futures = metrics.futures.clone().unwrap_or_default();
        let onchain = metrics.onchain.clone().unwrap_or_default();
        let social = metrics.social.clone().unwrap_or_default();
        let fundamentals = metrics.fundamentals.clone().unwrap_or_default();
        let ind = indicators.cloned().unwrap_or_default();

        let news_links = serde_json::to_string(&report.influential_headlines)
            .unwrap_or_else(|_| "[]".to_string());

        Self {
            run_date,
            coin: asset.ticker.to_string(),
            actual_price,
            trend_forecast: forecasts.trend_close.unwrap_or(0.0),
            window_forecast: forecasts.window_close.unwrap_or(0.0),
            sentiment_score,
            rsi: ind.rsi,
            macd: ind.macd,
            all_time_high: fundamentals.all_time_high,
            high_forecast: forecasts.highs.clone(),
            funding_rate: futures.funding_rate_pct,
            open_interest: futures.open_interest_usd,
            long_short_ratio: futures.long_short_ratio,
            futures_volume_24h: futures.volume_24h_usd,
            mvrv_ratio: onchain.mvrv_ratio,
            social_dominance: onchain.social_dominance_pct,
            daily_active_addresses: onchain.daily_active_addresses,
            galaxy_score: social.galaxy_score,
            alt_rank: social.alt_rank,
            market_cap_rank: fundamentals.market_cap_rank,
            community_score: fundamentals.community_score,
            developer_score: fundamentals.developer_score,
            sentiment_up_pct: fundamentals.sentiment_up_pct,
            circulating_supply: fundamentals.circulating_supply,
            transaction_volume_24h: fundamentals.transaction_volume_24h,
            analysis_summary: report.summary.clone(),
            analysis_hypothesis: report.hypothesis.clone(),
            analysis_news_links: news_links,
            report_title: report.title.clone(),
            report_recap: report.price_action_recap.clone(),
            report_bullish: report.bullish_case.clone(),
            report_bearish: report.bearish_case.clone(),
            report_hypothesis: report.hypothesis.clone(),
            action: recommendation.action,
            entry_range: recommendation.entry_range.clone(),
            take_profit_1: recommendation.take_profit_1,
            take_profit_2: recommendation.take_profit_2,
            stop_loss: recommendation.stop_loss,
            confidence: recommendation.confidence,
            rationale: recommendation.rationale.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::asset::ASSETS;
    use crate::providers::{FundamentalMetrics, FuturesMetrics, OnChainMetrics, SocialMetrics};

    fn report_stub() -> MarketReport {
        MarketReport {
            title: "t".to_string(),
            price_action_recap: "r".to_string(),
            bullish_case: "bull".to_string(),
            bearish_case: "bear".to_string(),
            hypothesis: "h".to_string(),
            summary: "s".to_string(),
            influential_headlines: Vec::new(),
        }
    }

    fn full_metrics() -> ExternalMetrics {
        ExternalMetrics {
            futures: Some(FuturesMetrics {
                funding_rate_pct: 0.01,
                open_interest_usd: 1.0e9,
                long_short_ratio: 1.2,
                volume_24h_usd: 2.0e9,
            }),
            onchain: Some(OnChainMetrics {
                mvrv_ratio: 1.8,
                social_dominance_pct: 22.5,
                daily_active_addresses: 900_000.0,
            }),
            social: Some(SocialMetrics {
                galaxy_score: 70.0,
                alt_rank: 3.0,
            }),
            fundamentals: Some(FundamentalMetrics {
                market_cap_rank: 1.0,
                community_score: 80.0,
                developer_score: 90.0,
                sentiment_up_pct: 75.0,
                circulating_supply: 19_000_000.0,
                all_time_high: 120_000.0,
                transaction_volume_24h: 3.0e10,
            }),
        }
    }

    #[test]
    fn trade_action_parsing() {
        assert_eq!(TradeAction::parse("buy"), Some(TradeAction::Buy));
        assert_eq!(TradeAction::parse(" SELL "), Some(TradeAction::Sell));
        assert_eq!(TradeAction::parse("long"), None);
    }

    #[test]
    fn failed_futures_provider_zeroes_only_its_fields() {
        let run_date = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let mut metrics = full_metrics();
        metrics.futures = None;

        let record = SnapshotRecord::assemble(
            run_date,
            &ASSETS[0],
            50_000.0,
            &ForecastSet {
                trend_close: Some(50_100.0),
                window_close: Some(50_200.0),
                highs: Vec::new(),
            },
            None,
            &metrics,
            0.3,
            &report_stub(),
            &TradeRecommendation::hold_default("n/a"),
        );

        assert_eq!(record.funding_rate, 0.0);
        assert_eq!(record.open_interest, 0.0);
        assert_eq!(record.long_short_ratio, 0.0);
        assert_eq!(record.futures_volume_24h, 0.0);

        // Other provider groups survive untouched.
        assert_eq!(record.mvrv_ratio, 1.8);
        assert_eq!(record.galaxy_score, 70.0);
        assert_eq!(record.all_time_high, 120_000.0);
        assert_eq!(record.actual_price, 50_000.0);
        assert_eq!(record.trend_forecast, 50_100.0);
    }

    #[test]
    fn missing_forecasts_default_to_zero() {
        let run_date = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let record = SnapshotRecord::assemble(
            run_date,
            &ASSETS[1],
            3_000.0,
            &ForecastSet {
                trend_close: None,
                window_close: None,
                highs: Vec::new(),
            },
            None,
            &full_metrics(),
            0.0,
            &report_stub(),
            &TradeRecommendation::hold_default("n/a"),
        );

        assert_eq!(record.trend_forecast, 0.0);
        assert_eq!(record.window_forecast, 0.0);
        assert!(record.high_forecast.is_empty());
        assert_eq!(record.coin, "ETH-USD");
    }

    #[test]
    fn news_links_serialize_as_json_array() {
        let run_date = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let mut report = report_stub();
        report.influential_headlines = vec![crate::providers::news::Headline {
            title: "A".to_string(),
            url: "https://example.com/a".to_string(),
            description: None,
        }];

        let record = SnapshotRecord::assemble(
            run_date,
            &ASSETS[0],
            1.0,
            &ForecastSet::default(),
            None,
            &ExternalMetrics::default(),
            0.0,
            &report,
            &TradeRecommendation::hold_default("n/a"),
        );

        let parsed: serde_json::Value = serde_json::from_str(&record.analysis_news_links).unwrap();
        assert_eq!(parsed[0]["title"], "A");
    }
}
