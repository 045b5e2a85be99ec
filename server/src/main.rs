use std::future::pending;
use std::io;
use std::sync::Arc;

use anyhow::bail;
use axum::{Extension, Router};
use axum_otel_metrics::HttpMetricsLayerBuilder;
use clap::Parser;
use secrecy::ExposeSecret;
use server::auth::Keys;
use server::db::PgPool;
use server::{AppContext, Config, daemon, db, endpoints};
use tokio::signal::unix::SignalKind;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    info!("Starting Threat Hub Server");

    // An unsigned token service is worse than no service: refuse to boot
    // without a usable secret.
    if config.jwt_secret.expose_secret().trim().is_empty() {
        bail!("JWT_SECRET must not be empty");
    }
    let keys = Arc::new(Keys::new(config.jwt_secret.expose_secret().as_bytes()));

    let ollama_enabled =
        config.ollama.ollama_url.is_some() && config.ollama.ollama_text_model.is_some();
    info!(ollama_enabled = %ollama_enabled, "Ollama AI features configuration");

    info!("Initializing database connection pool");
    let pool = db::get_pool(config.pg.clone()).await?;
    info!("Running database migrations");
    db::run_migrations(&pool).await?;
    info!("Database initialization complete");

    let (sync_feeds_tx, sync_feeds_rx) = tokio::sync::watch::channel(());

    info!("Spawning feed sync daemon");
    let feed_sync_daemon = tokio::spawn(setup_feed_sync_daemon(
        config.clone(),
        pool.clone(),
        sync_feeds_rx,
    ));

    info!("Setting up HTTP server");
    let app_server = setup_app(&config, pool.clone(), keys, sync_feeds_tx);

    info!("All services started successfully");
    tokio::select! {
        result = app_server => {
            if let Err(error) = result {
                error!(?error, "App server error");
                std::process::exit(1);
            }
            info!("App server stopped");
        },
        result = feed_sync_daemon => {
            match result {
                Ok(Err(error)) => {
                    error!(?error, "Feed sync daemon error");
                    std::process::exit(1);
                },
                Err(error) => {
                    error!(?error, "Join error in feed sync daemon");
                    std::process::exit(1);
                },
                Ok(Ok(_)) => {
                    info!("Feed sync daemon stopped");
                }
            }
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    async fn terminate() -> io::Result<()> {
        tokio::signal::unix::signal(SignalKind::terminate())?
            .recv()
            .await;
        Ok(())
    }
    tokio::select! {
        _ = terminate() => {},
        _ = tokio::signal::ctrl_c() => {},
    }
    info!("Shutdown signal received, starting graceful shutdown")
}

async fn setup_app(
    config: &Config,
    pool: PgPool,
    keys: Arc<Keys>,
    tx: tokio::sync::watch::Sender<()>,
) -> anyhow::Result<()> {
    let app_state = AppContext {
        config: Arc::new(config.clone()),
        pool,
        keys,
        tx_sync_feeds: tx,
    };

    let metrics = HttpMetricsLayerBuilder::new().build();
    let app = Router::new()
        .nest("/api", endpoints::routers())
        .merge(endpoints::health_check())
        .fallback_service(ServeDir::new(&config.spa_dist))
        .layer(metrics)
        .layer(Extension(app_state))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());
    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    info!(bind_address = %config.bind, "HTTP server listening");
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server shutdown complete");
    Ok(())
}

async fn setup_feed_sync_daemon(
    config: Config,
    pool: PgPool,
    sync_feeds_rx: tokio::sync::watch::Receiver<()>,
) -> anyhow::Result<()> {
    match config.feed.threat_feed_url {
        Some(url) => {
            info!(feed_url = %url, source = %config.feed.threat_feed_source, "Starting feed sync daemon");
            daemon::feed_sync::run(&pool, &url, &config.feed.threat_feed_source, sync_feeds_rx)
                .await
        }
        None => {
            warn!("No threat feed configured, disabling feed sync");
            pending::<anyhow::Result<()>>().await
        }
    }
}
