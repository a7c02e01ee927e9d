//! HTTP server lifecycle — binds the configured address, mounts
//! `api_router()` and serves until a shutdown signal.
//!
//! `start_server` returns a handle with a shutdown channel (used by
//! tests and embedders); `serve` runs in the foreground and stops on
//! Ctrl+C or SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::api::router::api_router;
use crate::core_state::CoreState;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Handle to a running API server.
pub struct ApiServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ApiServer {
    /// Signal graceful shutdown. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("API server shutdown signal sent");
        }
    }

    /// Shut down and wait for in-flight requests to finish.
    pub async fn stop(mut self) {
        self.shutdown();
        if let Err(e) = (&mut self.task).await {
            tracing::error!("API server task failed: {e}");
        }
    }
}

async fn bind(addr: &str) -> Result<tokio::net::TcpListener, ServerError> {
    tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        })
}

/// Start the API server on `addr` in a background task.
pub async fn start_server(core: Arc<CoreState>, addr: &str) -> Result<ApiServer, ServerError> {
    let listener = bind(addr).await?;
    let local_addr = listener.local_addr()?;
    let app = api_router(core);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("API server received shutdown signal");
        };

        tracing::info!(addr = %local_addr, "API server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("API server error: {e}");
        }

        tracing::info!("API server stopped");
    });

    Ok(ApiServer {
        addr: local_addr,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}

/// Serve on the configured bind address until Ctrl+C or SIGTERM.
pub async fn serve(core: Arc<CoreState>) -> Result<(), ServerError> {
    let addr = core.config.bind_address();
    let listener = bind(&addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "Ekitsa API listening");

    axum::serve(listener, api_router(core))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Ekitsa API stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Cannot listen for Ctrl+C: {e}");
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
                tracing::error!("Cannot listen for SIGTERM: {e}");
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
    tracing::info!("Shutdown signal received");
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn test_core() -> (Arc<CoreState>, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let core = CoreState::with_llm(Config::with_db_path(tmp.path().join("ekitsa.db")), None);
        (Arc::new(core), tmp)
    }

    #[tokio::test]
    async fn start_serve_and_stop() {
        let (core, _tmp) = test_core();
        let server = start_server(core, "127.0.0.1:0")
            .await
            .expect("server should start");
        assert!(server.addr.port() > 0);

        let url = format!("http://{}/api/health", server.addr);
        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let json: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(json["status"], "ok");

        let resp = reqwest::get(format!("http://{}/nonexistent", server.addr))
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);

        server.stop().await;
    }

    #[tokio::test]
    async fn bind_failure_is_reported() {
        let (core, _tmp) = test_core();
        let server = start_server(core.clone(), "127.0.0.1:0").await.unwrap();
        let taken = server.addr.to_string();

        let err = start_server(core, &taken).await.err().expect("port is taken");
        assert!(matches!(err, ServerError::Bind { .. }));

        server.stop().await;
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let (core, _tmp) = test_core();
        let mut server = start_server(core, "127.0.0.1:0").await.unwrap();
        server.shutdown();
        server.shutdown();
        server.stop().await;
    }
}
