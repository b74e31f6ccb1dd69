use pacer::shutdown::ShutdownSender;
use tracing::{info, warn};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Turns Ctrl+C (and SIGTERM on unix) into a shutdown broadcast.
///
/// The dispatcher reacts between ticks: the batch in flight is awaited, no
/// further ids are issued and the summary covers what was sent. The task
/// also ends when a shutdown is broadcast from elsewhere.
pub fn setup_signal_shutdown_handler(shutdown_tx: &ShutdownSender) -> tokio::task::JoinHandle<()> {
    let shutdown_tx = shutdown_tx.clone();
    // Subscribed before spawning so an early broadcast is not missed.
    let mut shutdown_rx = shutdown_tx.subscribe();
    tokio::spawn(async move {
        tokio::select! {
            _ = shutdown_rx.recv() => {}
            signal_name = wait_for_stop_signal() => {
                info!("{} received; finishing the in-flight batch", signal_name);
                drop(shutdown_tx.send(()));
            }
        }
    })
}

#[cfg(unix)]
async fn wait_for_stop_signal() -> &'static str {
    match signal(SignalKind::terminate()) {
        Ok(mut term_signal) => {
            tokio::select! {
                () = ctrl_c() => "Interrupt",
                _ = term_signal.recv() => "SIGTERM",
            }
        }
        Err(err) => {
            warn!("Failed to register SIGTERM handler: {}", err);
            ctrl_c().await;
            "Interrupt"
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_stop_signal() -> &'static str {
    ctrl_c().await;
    "Interrupt"
}

/// Resolves on Ctrl+C. Never resolves if the handler cannot be installed.
async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", err);
        std::future::pending::<()>().await;
    }
}
