//! # HTTP status endpoint.
//!
//! Read-only JSON view of the [`StateStore`]:
//!
//! ```text
//! GET /         ─┐
//! GET /status   ─┴─► 200 {"db":{"lifecycle":"running","exit_code":""}, ...}
//! ```
//!
//! The server runs on its own task and stops when its token is cancelled.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::core::{ProcessInfo, StateStore};
use crate::error::RuntimeError;

/// Routes served by the status endpoint.
pub fn router(store: Arc<StateStore>) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/status", get(status))
        .with_state(store)
}

async fn status(State(store): State<Arc<StateStore>>) -> Json<BTreeMap<String, ProcessInfo>> {
    Json(store.snapshot())
}

/// Binds `addr`. Failing here aborts the run before any child starts.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener, RuntimeError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| RuntimeError::StatusServer { source })
}

/// Serves [`router`] on `listener` until `token` is cancelled.
pub fn spawn(
    listener: TcpListener,
    store: Arc<StateStore>,
    token: CancellationToken,
) -> JoinHandle<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "status endpoint listening");
    }
    tokio::spawn(async move {
        let shutdown = async move { token.cancelled().await };
        if let Err(e) = axum::serve(listener, router(store))
            .with_graceful_shutdown(shutdown)
            .await
        {
            error!("status server error: {e}");
        }
    })
}
