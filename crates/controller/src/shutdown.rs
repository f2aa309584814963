use std::io;

pub async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable, waiting for ctrl-c only");
                ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c().await;
    }
}

async fn ctrl_c() {
    settle(tokio::signal::ctrl_c().await, "ctrl-c").await
}

// A handler that could not be installed must not read as a shutdown request.
async fn settle(outcome: io::Result<()>, source: &'static str) {
    if let Err(e) = outcome {
        tracing::warn!(error = %e, source, "signal handler unavailable");
        std::future::pending::<()>().await;
    }
}
