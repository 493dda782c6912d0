use std::net::SocketAddr;
use std::process::ExitCode;

use relay_core::app::AppBuilder;
use relay_core::config::RelayConfig;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relay_core=info,relay=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = RelayConfig::from_env();
    if config.credentials.is_none() {
        warn!("RELAY_SUBDOMAIN / RELAY_API_KEY not set; polling cycles will fail until they are");
    }

    let app = match AppBuilder::new(config).build() {
        Ok(app) => app,
        Err(err) => {
            error!(error = %err, "failed to build relay");
            return ExitCode::FAILURE;
        }
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], app.config.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(%addr, error = %err, "failed to bind");
            return ExitCode::FAILURE;
        }
    };
    info!("listening on {}", addr);

    let scheduler = app.spawn_scheduler();
    let served = axum::serve(listener, app.router())
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // 実行中のサイクルは最後まで走らせる
    scheduler.shutdown_and_join().await;

    match served {
        Ok(()) => {
            info!("relay stopped");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "http server error");
            ExitCode::FAILURE
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
