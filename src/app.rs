/*
 * Responsibility
 * - Config読み込み → 依存生成 (PgPool, TokenVerifier, IdentityLookup) → Router 組み立て
 * - Middleware の適用 (認証ゲート/security headers/CORS/http)
 * - ingest consumer の起動 (REDIS_URL がある場合のみ)
 * - axum::serve() で起動、Ctrl-C で graceful shutdown
 */
use std::{panic, process, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    api,
    config::Config,
    middleware,
    repos::{
        favorite_category_repo::PgFavoriteCategorySink,
        recommend_quiz_repo::PgRecommendationSink, user_repo::PgIdentityLookup,
    },
    services::{
        auth::build_auth_service,
        ingest::{RecommendService, ValkeyQueue, run_consumer},
    },
    state::AppState,
};

fn init_tracing() {
    // RUST_LOG があればそちらを優先
    // 例: RUST_LOG=info,valanse_api=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // stderr が見えない起動方法でも panic を落とさないよう tracing に出す
        tracing::error!(?info, "panic");

        // 開発中は即落として気付けるようにする
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(?config, "starting API in {:?} mode on {}", config.app_env, config.addr);

    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .context("failed to run migrations")?;

    let state = build_state(&config, db.clone())?;
    let app = build_router(state, &config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let consumer = spawn_consumer(&config, db, shutdown_rx).await?;

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // HTTP が止まったら consumer も止める
    let _ = shutdown_tx.send(true);
    if let Some(handle) = consumer {
        if let Err(err) = handle.await {
            tracing::error!(error = %err, "ingest consumer task failed");
        }
    }

    tracing::info!("shutdown complete");
    Ok(())
}

fn build_state(config: &Config, db: sqlx::PgPool) -> Result<AppState> {
    let auth = build_auth_service(config)?;
    let identities = Arc::new(PgIdentityLookup::new(db.clone()));

    Ok(AppState::new(db, auth, identities))
}

fn build_router(state: AppState, config: &Config) -> Router {
    let v1 = middleware::auth::access::apply(api::v1::routes(), state.clone());

    let router = Router::new().nest("/api/v1", v1).with_state(state);

    // 外側ほど先に実行される: http(request-id/trace/timeout) → cors → security headers
    let router = middleware::security_headers::apply(router);
    let router = middleware::cors::apply(router, config);
    middleware::http::apply(router, config)
}

async fn spawn_consumer(
    config: &Config,
    db: sqlx::PgPool,
    mut shutdown: watch::Receiver<bool>,
) -> Result<Option<tokio::task::JoinHandle<()>>> {
    let Some(url) = config.redis_url.as_deref() else {
        tracing::info!("REDIS_URL is not set, ingest consumer disabled");
        return Ok(None);
    };

    let queue = ValkeyQueue::new(url, config.ingest_key_prefix.clone())
        .await
        .context("failed to connect to ingest queue")?;

    let service = RecommendService::new(
        Arc::new(PgFavoriteCategorySink::new(db.clone())),
        Arc::new(PgRecommendationSink::new(db)),
    );
    let poll_interval = Duration::from_millis(config.ingest_poll_interval_ms);

    let handle = tokio::spawn(async move {
        let stop = async move {
            let _ = shutdown.wait_for(|stopped| *stopped).await;
        };
        run_consumer(Arc::new(queue), service, poll_interval, stop).await;
    });

    Ok(Some(handle))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        // シグナルを待てないなら止まらずに動き続ける
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
