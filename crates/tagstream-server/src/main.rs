mod api;

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

use tagstream_crawler::{CallCounter, Crawler, RunStore};
use tagstream_publisher::{BusConfig, BusPublisher};

use crate::api::{build_app, AppState, ServerStatus};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(tagstream_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let counter = Arc::new(CallCounter::new());
    let crawler = Arc::new(Crawler::new(Arc::clone(&config), counter)?);
    let publisher = Arc::new(BusPublisher::new(BusConfig::from_env()));
    let store = Arc::new(RunStore::new(config.output_dir.clone()));

    tracing::info!(
        addr = %config.bind_addr,
        tags = ?config.tags,
        platforms = ?config.enabled_platforms,
        "crawl server starting"
    );

    let state = AppState {
        config: Arc::clone(&config),
        crawler,
        publisher: Arc::clone(&publisher),
        store,
        status: Arc::new(Mutex::new(ServerStatus::default())),
    };
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    publisher.disconnect().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
