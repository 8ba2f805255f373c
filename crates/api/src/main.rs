use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use sqlx::PgPool;
use std::path::PathBuf;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use daybrief_core::domain::snapshot::FeedbackDecision;
use daybrief_core::storage::chartfiles::{load_chart_detail, ChartDetail};
use daybrief_core::storage::snapshots::{self, StoredSnapshot};

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

    let pool: Option<PgPool> = match settings.effective_database_url() {
        Ok(db_url) => match sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await
        {
            Ok(pool) => match daybrief_core::storage::migrate(&pool).await {
                Ok(()) => Some(pool),
                Err(e) => {
                    sentry_anyhow::capture_anyhow(&e);
                    tracing::error!(error = %e, "db migrations failed; starting API in degraded mode");
                    None
                }
            },
            Err(e) => {
                let err = anyhow::Error::new(e);
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %err, "db connect failed; starting API in degraded mode");
                None
            }
        },
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "database configuration missing; starting API in degraded mode");
            None
        }
    };

    let data_dir = std::env::var("DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"));

    let state = AppState { pool, data_dir };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/snapshots", get(get_all_snapshots))
        .route("/snapshots/latest", get(get_latest_batch))
        .route("/snapshots/:coin/latest", get(get_latest_for_coin))
        .route("/charts/:coin", get(get_chart_detail))
        .route("/feedback/:id", post(post_feedback))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    pool: Option<PgPool>,
    data_dir: PathBuf,
}

impl AppState {
    fn pool(&self) -> Result<&PgPool, StatusCode> {
        self.pool.as_ref().ok_or(StatusCode::SERVICE_UNAVAILABLE)
    }
}

fn internal_error(e: anyhow::Error) -> StatusCode {
    sentry_anyhow::capture_anyhow(&e);
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn get_all_snapshots(
    State(state): State<AppState>,
) -> Result<Json<Vec<StoredSnapshot>>, StatusCode> {
    let pool = state.pool()?;
    let rows = snapshots::load_all(pool).await.map_err(internal_error)?;
    Ok(Json(rows))
}

async fn get_latest_batch(
    State(state): State<AppState>,
) -> Result<Json<Vec<StoredSnapshot>>, StatusCode> {
    let pool = state.pool()?;
    let rows = snapshots::load_latest_batch(pool)
        .await
        .map_err(internal_error)?;
    if rows.is_empty() {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(rows))
}

async fn get_latest_for_coin(
    State(state): State<AppState>,
    Path(coin): Path<String>,
) -> Result<Json<StoredSnapshot>, StatusCode> {
    let pool = state.pool()?;
    let row = snapshots::latest_for_coin(pool, &coin)
        .await
        .map_err(internal_error)?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(row))
}

async fn get_chart_detail(
    State(state): State<AppState>,
    Path(coin): Path<String>,
) -> Result<Json<ChartDetail>, StatusCode> {
    let detail = load_chart_detail(&state.data_dir, &coin)
        .map_err(internal_error)?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(detail))
}

#[derive(Debug, Deserialize)]
struct FeedbackBody {
    decision: String,
    #[serde(default)]
    correction: Option<String>,
}

async fn post_feedback(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<FeedbackBody>,
) -> Result<StatusCode, StatusCode> {
    let pool = state.pool()?;

    let decision = FeedbackDecision::parse(&body.decision).ok_or(StatusCode::BAD_REQUEST)?;

    let updated = snapshots::update_feedback(pool, id, decision, body.correction.as_deref())
        .await
        .map_err(internal_error)?;

    if updated {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
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
