//! HTTP boundary: routes, request decoding and error-to-status mapping.

mod error;
mod handlers;

pub use error::*;
pub use handlers::*;

use std::any::Any;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::application::WalletService;

#[derive(Clone)]
pub struct AppState {
    pub service: WalletService,
}

/// Server settings that are not part of the wallet service itself.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub listen: SocketAddr,
    pub request_timeout: Duration,
    pub shutdown_timeout: Duration,
}

/// Build the application router.
///
/// Only read routes run under `request_timeout`. Mutations are bounded by the
/// store instead, which rolls back anything it gives up on and always lets a
/// staged write commit.
pub fn router(service: WalletService, request_timeout: Duration) -> Router {
    let reads = Router::new()
        .route("/live", get(live))
        .route("/v1/wallets/:id", get(get_wallet))
        .layer(TimeoutLayer::new(request_timeout));

    let writes = Router::new()
        .route("/v1/wallets", post(create_wallet))
        .route("/v1/wallets/:id/deposit", post(deposit))
        .route("/v1/wallets/:id/withdraw", post(withdraw));

    reads
        .merge(writes)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { service })
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = detail, "handler panicked");
    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
}

/// Serve until Ctrl-C / SIGTERM, then drain in-flight requests for at most
/// `shutdown_timeout`.
pub async fn serve(service: WalletService, options: &ServerOptions) -> Result<()> {
    let app = router(service, options.request_timeout);

    let listener = TcpListener::bind(options.listen)
        .await
        .with_context(|| format!("Failed to bind {}", options.listen))?;
    info!("Server listening on http://{}", options.listen);

    let (stop_tx, mut stop_rx) = watch::channel(false);
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = stop_rx.changed().await;
            })
            .await
    });

    tokio::select! {
        result = &mut server => {
            return result.context("Server task failed")?.context("Server error");
        }
        _ = shutdown_signal() => {}
    }

    info!("Shutting down gracefully...");
    let _ = stop_tx.send(true);

    match tokio::time::timeout(options.shutdown_timeout, server).await {
        Ok(result) => result.context("Server task failed")?.context("Server error")?,
        Err(_) => warn!(
            timeout = ?options.shutdown_timeout,
            "in-flight requests did not drain before the shutdown timeout"
        ),
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
