//! Client lifecycle - register, start, wait for a signal, stop once

use std::future::Future;
use tracing::{info, warn};

use crate::application::errors::StartupError;
use crate::domain::traits::Client;
use crate::plugins::Plugin;

/// Process termination signals, installed up front so a signal that
/// arrives while the client is still starting is not lost
pub struct ShutdownSignal {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl ShutdownSignal {
    #[cfg(unix)]
    pub fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    #[cfg(not(unix))]
    pub fn install() -> std::io::Result<Self> {
        Ok(Self {})
    }

    /// Wait for the first signal and return its name. Consumes the handle,
    /// so at most one shutdown is ever triggered through it.
    #[cfg(unix)]
    pub async fn recv(mut self) -> &'static str {
        tokio::select! {
            _ = self.interrupt.recv() => "SIGINT",
            _ = self.terminate.recv() => "SIGTERM",
        }
    }

    #[cfg(not(unix))]
    pub async fn recv(self) -> &'static str {
        let _ = tokio::signal::ctrl_c().await;
        "Ctrl-C"
    }
}

/// Register `plugins` in order, start the client, then block until
/// `shutdown` resolves and stop the client exactly once.
///
/// A signal that arrives while `start` is still pending abandons the start
/// and stops the client. Registration and start failures are fatal and the
/// client is not stopped. Errors while stopping are logged only.
pub async fn serve<C, S>(
    client: &mut C,
    plugins: Vec<Box<dyn Plugin>>,
    shutdown: S,
) -> Result<(), StartupError>
where
    C: Client + ?Sized,
    S: Future<Output = &'static str>,
{
    tokio::pin!(shutdown);

    for plugin in plugins {
        client.register_plugin(plugin).await?;
    }

    let started = tokio::select! {
        biased;
        result = client.start() => Some(result),
        signal = &mut shutdown => {
            info!("Received {} during startup, shutting down...", signal);
            None
        }
    };

    if let Some(result) = started {
        result?;
        info!("Bot started successfully");

        let signal = shutdown.await;
        info!("Received {}, shutting down...", signal);
    }

    if let Err(e) = client.stop().await {
        warn!("Error while stopping client: {}", e);
    }

    info!("Shutdown complete");
    Ok(())
}
