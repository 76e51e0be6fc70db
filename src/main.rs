use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use bullwatch::config::Config;
use bullwatch::explorer::QueueExplorer;
use bullwatch::storage::{create_redis_pool, RedisStore};
use bullwatch::web;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cfg.log_level.clone())),
        )
        .init();

    tracing::info!(
        port = cfg.server_port,
        prefix = %cfg.queue_prefix,
        poll_seconds = cfg.metrics_poll_seconds,
        "starting bullwatch"
    );

    let pool = create_redis_pool(&cfg.redis_url).await?;
    tracing::info!("connected to Redis/Valkey");

    let explorer = QueueExplorer::new(Arc::new(RedisStore::new(pool)), cfg.queue_prefix.clone());

    // Background poller keeping the exported gauges fresh even when nobody
    // is looking at the dashboard. Failures are logged and skipped.
    let poller = explorer.clone();
    let poll_interval = Duration::from_secs(cfg.metrics_poll_seconds);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match poller.discover_queues().await {
                Ok(queues) => {
                    let _ = poller.stats_for(&queues).await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "metrics poller: discovery failed, skipping tick");
                }
            }
        }
    });

    let app = web::router(explorer);
    let addr = format!("0.0.0.0:{}", cfg.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "bullwatch console listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server exited");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
