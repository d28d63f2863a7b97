use {super::*, tokio::signal::ctrl_c};

/// Returns a token cancelled on Ctrl-C or SIGTERM.
pub(crate) fn setup_signal_handler() -> CancellationToken {
    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();

    tokio::spawn(async move {
        shutdown_signal().await;
        cancel_clone.cancel();
    });

    cancel
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(err) => {
            warn!("Failed to install SIGTERM handler: {err}");
            ctrl_c().await.ok();
            info!("Received shutdown signal (Ctrl-C / SIGINT)");
            return;
        }
    };

    tokio::select! {
        _ = ctrl_c() => {
            info!("Received shutdown signal (Ctrl-C / SIGINT)");
        }
        _ = sigterm.recv() => {
            info!("Received shutdown signal (SIGTERM)");
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    ctrl_c().await.ok();
    info!("Received shutdown signal (Ctrl-C)");
}
