use crate::domain::snapshot::{FeedbackDecision, HighForecastPoint, SnapshotRecord};
use anyhow::Context;
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::types::Json;

const SNAPSHOT_COLUMNS: &str = "id, run_date, coin, actual_price, trend_forecast, window_forecast, \
     sentiment_score, rsi, macd, all_time_high, high_forecast, funding_rate, open_interest, \
     long_short_ratio, futures_volume_24h, mvrv_ratio, social_dominance, daily_active_addresses, \
     galaxy_score, alt_rank, market_cap_rank, community_score, developer_score, sentiment_up_pct, \
     circulating_supply, transaction_volume_24h, analysis_summary, analysis_hypothesis, \
     analysis_news_links, report_title, report_recap, report_bullish, report_bearish, \
     report_hypothesis, action, entry_range, take_profit_1, take_profit_2, stop_loss, confidence, \
     rationale, user_feedback, user_correction";

/// One persisted snapshot row as read back for presentation.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StoredSnapshot {
    pub id: i64,
    pub run_date: NaiveDate,
    pub coin: String,
    pub actual_price: f64,
    pub trend_forecast: f64,
    pub window_forecast: f64,
    pub sentiment_score: f64,
    pub rsi: f64,
    pub macd: f64,
    pub all_time_high: f64,
    pub high_forecast: Json<Vec<HighForecastPoint>>,
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
    pub analysis_news_links: String,
    pub report_title: String,
    pub report_recap: String,
    pub report_bullish: String,
    pub report_bearish: String,
    pub report_hypothesis: String,
    pub action: String,
    pub entry_range: String,
    pub take_profit_1: f64,
    pub take_profit_2: f64,
    pub stop_loss: f64,
    pub confidence: f64,
    pub rationale: String,
    pub user_feedback: Option<String>,
    pub user_correction: Option<String>,
}

/// Inserts the whole batch in one transaction: either every row of the
/// day's run lands or none does.
pub async fn append_snapshots(
    pool: &sqlx::PgPool,
    records: &[SnapshotRecord],
) -> anyhow::Result<u64> {
    if records.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await.context("begin transaction failed")?;

    let mut inserted: u64 = 0;
    for record in records {
        let res = sqlx::query(
            "INSERT INTO forecasts (run_date, coin, actual_price, trend_forecast, window_forecast, \
             sentiment_score, rsi, macd, all_time_high, high_forecast, funding_rate, open_interest, \
             long_short_ratio, futures_volume_24h, mvrv_ratio, social_dominance, daily_active_addresses, \
             galaxy_score, alt_rank, market_cap_rank, community_score, developer_score, sentiment_up_pct, \
             circulating_supply, transaction_volume_24h, analysis_summary, analysis_hypothesis, \
             analysis_news_links, report_title, report_recap, report_bullish, report_bearish, \
             report_hypothesis, action, entry_range, take_profit_1, take_profit_2, stop_loss, confidence, \
             rationale) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, \
             $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30, $31, $32, $33, $34, $35, $36, \
             $37, $38, $39, $40)",
        )
        .bind(record.run_date)
        .bind(&record.coin)
        .bind(record.actual_price)
        .bind(record.trend_forecast)
        .bind(record.window_forecast)
        .bind(record.sentiment_score)
        .bind(record.rsi)
        .bind(record.macd)
        .bind(record.all_time_high)
        .bind(Json(&record.high_forecast))
        .bind(record.funding_rate)
        .bind(record.open_interest)
        .bind(record.long_short_ratio)
        .bind(record.futures_volume_24h)
        .bind(record.mvrv_ratio)
        .bind(record.social_dominance)
        .bind(record.daily_active_addresses)
        .bind(record.galaxy_score)
        .bind(record.alt_rank)
        .bind(record.market_cap_rank)
        .bind(record.community_score)
        .bind(record.developer_score)
        .bind(record.sentiment_up_pct)
        .bind(record.circulating_supply)
        .bind(record.transaction_volume_24h)
        .bind(&record.analysis_summary)
        .bind(&record.analysis_hypothesis)
        .bind(&record.analysis_news_links)
        .bind(&record.report_title)
        .bind(&record.report_recap)
        .bind(&record.report_bullish)
        .bind(&record.report_bearish)
        .bind(&record.report_hypothesis)
        .bind(record.action.as_str())
        .bind(&record.entry_range)
        .bind(record.take_profit_1)
        .bind(record.take_profit_2)
        .bind(record.stop_loss)
        .bind(record.confidence)
        .bind(&record.rationale)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("insert forecasts row failed for {}", record.coin))?;

        inserted += res.rows_affected();
    }

    tx.commit().await.context("commit transaction failed")?;
    Ok(inserted)
}

/// Every persisted row, most recent first.
pub async fn load_all(pool: &sqlx::PgPool) -> anyhow::Result<Vec<StoredSnapshot>> {
    let query = format!("SELECT {SNAPSHOT_COLUMNS} FROM forecasts ORDER BY run_date DESC, id DESC");
    sqlx::query_as::<_, StoredSnapshot>(&query)
        .fetch_all(pool)
        .await
        .context("load forecasts failed")
}

/// The most recent run's batch (every coin from the newest run date).
pub async fn load_latest_batch(pool: &sqlx::PgPool) -> anyhow::Result<Vec<StoredSnapshot>> {
    let query = format!(
        "SELECT {SNAPSHOT_COLUMNS} FROM forecasts \
         WHERE run_date = (SELECT MAX(run_date) FROM forecasts) \
         ORDER BY coin ASC, id DESC"
    );
    sqlx::query_as::<_, StoredSnapshot>(&query)
        .fetch_all(pool)
        .await
        .context("load latest forecasts batch failed")
}

/// The newest row for one coin, if any.
pub async fn latest_for_coin(
    pool: &sqlx::PgPool,
    coin: &str,
) -> anyhow::Result<Option<StoredSnapshot>> {
    let query = format!(
        "SELECT {SNAPSHOT_COLUMNS} FROM forecasts \
         WHERE coin = $1 ORDER BY run_date DESC, id DESC LIMIT 1"
    );
    sqlx::query_as::<_, StoredSnapshot>(&query)
        .bind(coin)
        .fetch_optional(pool)
        .await
        .context("load latest forecast for coin failed")
}

/// Point update of one row's feedback columns. Returns whether a row
/// matched; repeated calls overwrite in place and never create rows.
pub async fn update_feedback(
    pool: &sqlx::PgPool,
    id: i64,
    decision: FeedbackDecision,
    correction: Option<&str>,
) -> anyhow::Result<bool> {
    let res = sqlx::query(
        "UPDATE forecasts SET user_feedback = $2, user_correction = $3 WHERE id = $1",
    )
    .bind(id)
    .bind(decision.as_str())
    .bind(correction.unwrap_or(""))
    .execute(pool)
    .await
    .context("update forecast feedback failed")?;

    Ok(res.rows_affected() > 0)
}
