use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// Outcome bookkeeping for one daily run; append-only.
pub async fn record_pipeline_run(
    pool: &sqlx::PgPool,
    run_date: NaiveDate,
    status: &str,
    assets_processed: i32,
    assets_skipped: i32,
    error: Option<&str>,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    let finished_at: DateTime<Utc> = Utc::now();

    sqlx::query(
        "INSERT INTO pipeline_runs (id, run_date, finished_at, status, assets_processed, assets_skipped, error) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(id)
    .bind(run_date)
    .bind(finished_at)
    .bind(status)
    .bind(assets_processed)
    .bind(assets_skipped)
    .bind(error)
    .execute(pool)
    .await
    .context("insert pipeline_runs failed")?;

    Ok(id)
}
