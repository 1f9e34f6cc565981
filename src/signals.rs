//! OS termination signals, for binaries that run a controller until told to stop.
//!
//! ```rust,ignore
//! controller.start().await?;
//! appvisor::wait_for_shutdown_signal().await?;
//! controller.shutdown().await;
//! ```

/// Completes on the first termination signal.
///
/// Unix: `SIGINT`, `SIGTERM`, `SIGQUIT`. Elsewhere: Ctrl-C.
/// Fails only when a listener cannot be registered.
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut interrupt = signal(SignalKind::interrupt())?;
        let mut terminate = signal(SignalKind::terminate())?;
        let mut quit = signal(SignalKind::quit())?;

        let name = tokio::select! {
            _ = interrupt.recv() => "SIGINT",
            _ = terminate.recv() => "SIGTERM",
            _ = quit.recv() => "SIGQUIT",
        };
        tracing::info!(signal = name, "termination signal received");
        Ok(())
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        tracing::info!(signal = "ctrl_c", "termination signal received");
        Ok(())
    }
}
