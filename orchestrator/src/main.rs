use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use orchestrator::config::Config;
use orchestrator::telemetry::{self, TelemetryConfig};
use orchestrator::{server, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init(&TelemetryConfig::from_env(
        "orchestrator=debug,tower_http=info",
    ))?;

    let config = Config::load()?;
    info!(
        port = config.port,
        time_addition_ms = config.time_addition_ms,
        time_subtraction_ms = config.time_subtraction_ms,
        time_multiplications_ms = config.time_multiplications_ms,
        time_divisions_ms = config.time_divisions_ms,
        "orchestrator starting"
    );

    let state = Arc::new(AppState::from_config(&config));

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on {addr}");

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            server::shutdown_signal().await;
            shutdown.cancel();
        });
    }

    server::run(listener, state, shutdown, config.shutdown_grace()).await
}
