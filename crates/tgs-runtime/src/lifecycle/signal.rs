use tokio_util::sync::CancellationToken;

/// Cancel `cancel` on the first Ctrl-C (SIGINT) or SIGTERM.
pub async fn wait_for_signal(cancel: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tgs_warn!(sys, signal = "SIGINT", "received signal, interrupting cutover");
                    }
                    _ = sigterm.recv() => {
                        tgs_warn!(sys, signal = "SIGTERM", "received signal, interrupting cutover");
                    }
                }
            }
            Err(e) => {
                tgs_warn!(sys, error = %e, "cannot listen for SIGTERM, only Ctrl-C interrupts");
                ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    ctrl_c().await;

    cancel.cancel();
}

async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tgs_warn!(sys, signal = "SIGINT", "received signal, interrupting cutover"),
        // Without a handler, never resolve: the run completes or fails on its own.
        Err(e) => {
            tgs_warn!(sys, error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    }
}
