//! HTTP server lifecycle with bounded graceful shutdown

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::{api, AppState};

/// Serve the API on `listener` until `shutdown` fires.
///
/// After the signal no new connections are accepted; in-flight requests get
/// `grace` to finish before the server task is aborted. Scheduler state is
/// dropped with the process.
pub async fn run(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: CancellationToken,
    grace: Duration,
) -> anyhow::Result<()> {
    let app = api::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let token = shutdown.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { token.cancelled().await })
            .await
    });

    tokio::select! {
        joined = &mut server => {
            joined??;
            info!("server stopped");
            return Ok(());
        }
        _ = shutdown.cancelled() => {
            info!(grace_secs = grace.as_secs(), "shutdown requested, draining requests");
        }
    }

    match tokio::time::timeout(grace, &mut server).await {
        Ok(joined) => {
            joined??;
            info!("server shutdown complete");
        }
        Err(_) => {
            warn!("grace period elapsed, closing remaining connections");
            server.abort();
        }
    }
    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!(signal = "SIGINT", "received shutdown signal"),
        _ = terminate => info!(signal = "SIGTERM", "received shutdown signal"),
    }
}
