//! API server entry point.

use api::config::Config;
use api::runtime::{self, Backends};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), runtime::StartupError> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    let backends = Backends::connect(&config).await?;
    let bus = backends.bus.clone();
    let running = runtime::start(&config, backends).await?;

    let app = api::create_app(running.services.clone(), config.role, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, role = ?config.role, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    let stats = running.stop().await;
    let processed: u64 = stats.iter().map(|s| s.processed).sum();
    let dropped: u64 = stats.iter().map(|s| s.dropped).sum();
    if let Err(e) = bus.close().await {
        tracing::warn!(error = %e, "failed to close event bus");
    }
    tracing::info!(processed, dropped, "server shut down gracefully");

    Ok(())
}
