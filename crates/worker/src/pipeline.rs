use anyhow::Result;
use chrono::NaiveDate;
use std::path::Path;

use daybrief_core::analysis::analyst::{generate_market_report, MarketReport};
use daybrief_core::analysis::briefing::MarketBriefing;
use daybrief_core::analysis::sentiment::score_news_sentiment;
use daybrief_core::analysis::strategist::recommend_trade;
use daybrief_core::config::Settings;
use daybrief_core::domain::asset::{Asset, ASSETS};
use daybrief_core::domain::snapshot::{SnapshotRecord, TradeRecommendation};
use daybrief_core::forecast::ForecastSet;
use daybrief_core::llm::openai::OpenAiClient;
use daybrief_core::llm::ChatClient;
use daybrief_core::market::bars::last_close;
use daybrief_core::market::collector::MarketDataCollector;
use daybrief_core::market::MIN_HISTORY_BARS;
use daybrief_core::providers::news::{Headline, NewsClient};
use daybrief_core::storage::chartfiles::{save_chart_detail, ChartDetail};

/// What one daily cycle produced: the assembled batch plus how many assets
/// were skipped on the way.
#[derive(Debug)]
pub struct RunOutcome {
    pub records: Vec<SnapshotRecord>,
    pub skipped: usize,
}

/// Runs one full daily cycle over the fixed asset universe. Assets are
/// processed sequentially and in isolation: any per-asset failure logs,
/// reports, and moves on to the next asset.
pub async fn run_daily_analysis(
    settings: &Settings,
    run_date: NaiveDate,
    data_dir: &Path,
    dry_run: bool,
) -> Result<RunOutcome> {
    tracing::info!(%run_date, assets = ASSETS.len(), "starting daily analysis run");

    let collector = MarketDataCollector::from_settings(settings)?;
    let news = NewsClient::from_settings(settings)?;
    if news.is_none() {
        tracing::warn!("no news API key configured; headlines and sentiment disabled");
    }

    let llm = match OpenAiClient::from_settings(settings) {
        Ok(client) => Some(client),
        Err(err) => {
            tracing::warn!(error = %err, "chat model unavailable; narrative and strategy degrade to defaults");
            None
        }
    };

    let mut records = Vec::with_capacity(ASSETS.len());
    let mut skipped = 0usize;

    for asset in ASSETS {
        match process_asset(&collector, news.as_ref(), llm.as_ref(), asset, run_date, data_dir, dry_run)
            .await
        {
            Ok(Some(record)) => records.push(record),
            Ok(None) => skipped += 1,
            Err(err) => {
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(coin = asset.ticker, error = %err, "asset processing failed; skipping");
                skipped += 1;
            }
        }
    }

    tracing::info!(
        %run_date,
        assets_processed = records.len(),
        assets_skipped = skipped,
        "daily analysis run complete"
    );

    Ok(RunOutcome { records, skipped })
}

/// `Ok(None)` means the asset was skipped (no or insufficient history).
async fn process_asset(
    collector: &MarketDataCollector,
    news: Option<&NewsClient>,
    llm: Option<&OpenAiClient>,
    asset: &Asset,
    run_date: NaiveDate,
    data_dir: &Path,
    dry_run: bool,
) -> Result<Option<SnapshotRecord>> {
    tracing::info!(coin = asset.ticker, "fetching market data");

    let (data, headlines) = tokio::join!(collector.collect(asset), fetch_headlines(news, asset));

    let Some(data) = data? else {
        return Ok(None);
    };

    if data.bars.len() < MIN_HISTORY_BARS {
        tracing::warn!(
            coin = asset.ticker,
            bars = data.bars.len(),
            min = MIN_HISTORY_BARS,
            "insufficient history; skipping asset"
        );
        return Ok(None);
    }

    let Some(actual_price) = last_close(&data.bars) else {
        return Ok(None);
    };

    tracing::info!(coin = asset.ticker, "computing forecasts");
    let forecasts = ForecastSet::compute(&data.bars);
    let indicators = data.indicators.latest();

    let sentiment_score = match llm {
        Some(llm) => score_news_sentiment(llm, asset, &headlines).await,
        None => 0.0,
    };

    let briefing = MarketBriefing::assemble(
        run_date,
        asset,
        actual_price,
        &forecasts,
        indicators.as_ref(),
        &data.metrics,
        sentiment_score,
        headlines,
    );

    let (report, recommendation) = match llm {
        Some(llm) => enrich_narrative(llm, &briefing).await,
        None => (
            MarketReport::failed("chat model not configured"),
            TradeRecommendation::hold_default(
                "Strategy generation skipped: chat model not configured.",
            ),
        ),
    };

    let record = SnapshotRecord::assemble(
        run_date,
        asset,
        actual_price,
        &forecasts,
        indicators.as_ref(),
        &data.metrics,
        sentiment_score,
        &report,
        &recommendation,
    );

    if !dry_run {
        let detail = ChartDetail {
            coin: asset.ticker.to_string(),
            bars: data.bars,
            indicators: data.indicators,
        };
        if let Err(err) = save_chart_detail(data_dir, &detail) {
            // Chart files are presentation sugar; losing one must not cost
            // the snapshot.
            tracing::warn!(coin = asset.ticker, error = %err, "failed to write chart detail file");
        }
    }

    tracing::info!(
        coin = asset.ticker,
        actual_price,
        trend_forecast = record.trend_forecast,
        window_forecast = record.window_forecast,
        sentiment = record.sentiment_score,
        action = record.action.as_str(),
        "assembled daily snapshot"
    );

    Ok(Some(record))
}

async fn fetch_headlines(news: Option<&NewsClient>, asset: &Asset) -> Vec<Headline> {
    match news {
        Some(client) => match client.fetch_headlines(asset.name).await {
            Ok(headlines) => headlines,
            Err(err) => {
                tracing::warn!(coin = asset.ticker, error = %err, "news fetch failed; continuing without headlines");
                Vec::new()
            }
        },
        None => Vec::new(),
    }
}

/// The two narrative calls run in order: the report first, then the trade
/// setup over the same briefing.
async fn enrich_narrative(
    llm: &dyn ChatClient,
    briefing: &MarketBriefing,
) -> (MarketReport, TradeRecommendation) {
    let report = generate_market_report(llm, briefing).await;
    let recommendation = recommend_trade(llm, briefing).await;
    (report, recommendation)
}
