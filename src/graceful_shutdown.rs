//! Graceful shutdown
//!
//! Resolves once the process receives SIGINT or SIGTERM, letting the
//! server drain in-flight requests and open live sockets

use tokio::signal;

/// Wait for a shutdown signal
pub async fn handler() {
    let interrupt = async {
        signal::ctrl_c().await.expect("Valid CTRL+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Valid terminate handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
