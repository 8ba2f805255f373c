use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod pipeline;

#[derive(Debug, Parser)]
#[command(name = "daybrief_worker")]
struct Args {
    /// Run as-of date (YYYY-MM-DD). Defaults to today's UTC date.
    #[arg(long)]
    run_date: Option<String>,

    /// Do everything except writing to the database and the chart files.
    #[arg(long)]
    dry_run: bool,

    /// Directory for the per-asset chart detail files.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = daybrief_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let run_date =
        daybrief_core::time::run_date::resolve_run_date(args.run_date.as_deref(), chrono::Utc::now())?;

    if args.dry_run {
        let outcome = pipeline::run_daily_analysis(&settings, run_date, &args.data_dir, true).await?;
        tracing::info!(
            %run_date,
            dry_run = true,
            assets_processed = outcome.records.len(),
            assets_skipped = outcome.skipped,
            "daily analysis dry run complete"
        );
        return Ok(());
    }

    let db_url = settings.effective_database_url()?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await
        .context("database connect failed")?;

    daybrief_core::storage::migrate(&pool).await?;

    let acquired = daybrief_core::storage::lock::try_acquire_run_date_lock(&pool, run_date).await?;
    if !acquired {
        tracing::warn!(%run_date, "run date lock not acquired; another run in progress");
        return Ok(());
    }

    let result = run_and_persist(&settings, run_date, &args.data_dir, &pool).await;

    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(%run_date, error = %err, "daily analysis run failed");
        // Best effort: the database itself may be what failed.
        let _ = daybrief_core::storage::runs::record_pipeline_run(
            &pool,
            run_date,
            "error",
            0,
            0,
            Some(&format!("{err:#}")),
        )
        .await;
    }

    let _ = daybrief_core::storage::lock::release_run_date_lock(&pool, run_date).await;
    result
}

async fn run_and_persist(
    settings: &daybrief_core::config::Settings,
    run_date: chrono::NaiveDate,
    data_dir: &std::path::Path,
    pool: &sqlx::PgPool,
) -> anyhow::Result<()> {
    let outcome = pipeline::run_daily_analysis(settings, run_date, data_dir, false).await?;

    let processed = outcome.records.len() as i32;
    if outcome.records.is_empty() {
        tracing::warn!(%run_date, "no records were generated; nothing to persist");
    } else {
        let inserted =
            daybrief_core::storage::snapshots::append_snapshots(pool, &outcome.records).await?;
        tracing::info!(%run_date, inserted, "persisted daily snapshot batch");
    }

    daybrief_core::storage::runs::record_pipeline_run(
        pool,
        run_date,
        "success",
        processed,
        outcome.skipped as i32,
        None,
    )
    .await?;

    Ok(())
}

fn init_sentry(settings: &daybrief_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
