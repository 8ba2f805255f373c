pub mod chartfiles;
pub mod lock;
pub mod runs;
pub mod snapshots;

use anyhow::Context;

/// Idempotent schema setup; safe to call on every process start.
pub async fn migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("sqlx migrations failed")?;
    Ok(())
}
