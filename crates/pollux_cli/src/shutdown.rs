use console::Term;
use tokio::sync::watch;

/// Listen for Ctrl+C and flip the returned flag to `true` on the first one.
///
/// A second Ctrl+C exits the process immediately.
pub(crate) fn shutdown_signal() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            return;
        }

        let is_tty = Term::stdout().is_term();
        if is_tty {
            eprintln!("\n\nShutdown requested, finishing current commits...");
            eprintln!("Press Ctrl+C again to force quit.");
        } else {
            tracing::warn!("Shutdown requested, finishing current commits");
        }

        // Nobody listening any more means we are already on the way out.
        let _ = tx.send(true);

        // Wait for second Ctrl+C for force quit
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install second Ctrl+C handler: {}", e);
            return;
        }

        if is_tty {
            eprintln!("Force quit!");
        }
        std::process::exit(130);
    });

    rx
}
