//! # OS termination signals.
//!
//! [`shutdown_signal`] resolves once the process is asked to stop:
//! - unix: `SIGINT`, `SIGTERM`, `SIGQUIT`
//! - elsewhere: Ctrl-C
//!
//! If a unix handler cannot be installed the future falls back to Ctrl-C
//! alone; if even that fails it never resolves, and the run ends only when
//! every program has exited.

use tracing::warn;

/// Completes on the first termination signal.
#[cfg(unix)]
pub async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let handlers = (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
        signal(SignalKind::quit()),
    );
    match handlers {
        (Ok(mut int), Ok(mut term), Ok(mut quit)) => {
            tokio::select! {
                _ = int.recv() => {},
                _ = term.recv() => {},
                _ = quit.recv() => {},
            }
        }
        (int, term, quit) => {
            let err = [int.err(), term.err(), quit.err()].into_iter().flatten().next();
            warn!(error = ?err, "cannot install unix signal handlers, using ctrl-c only");
            ctrl_c().await;
        }
    }
}

/// Completes on the first termination signal.
#[cfg(not(unix))]
pub async fn shutdown_signal() {
    ctrl_c().await;
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("cannot listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
}
