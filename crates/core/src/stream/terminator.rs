//! Graceful-then-forced shutdown of registered transcoders.

use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::Child;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use super::error::StreamError;
use super::registry::JobRegistry;
use super::signal::GroupSignal;

/// Removes jobs from the registry and shuts their processes down.
pub struct Terminator {
    registry: Arc<JobRegistry>,
    signal: Arc<dyn GroupSignal>,
    grace_period: Duration,
}

impl Terminator {
    pub fn new(
        registry: Arc<JobRegistry>,
        signal: Arc<dyn GroupSignal>,
        grace_period: Duration,
    ) -> Self {
        Self {
            registry,
            signal,
            grace_period,
        }
    }

    /// Stops job `id`.
    ///
    /// Returns `Ok(None)` when nothing is registered under `id`, otherwise the
    /// exit status of the transcoder. The registry entry is removed before any
    /// signalling, so it is gone even when shutdown fails. A failed graceful
    /// signal is an error even though the process is then killed.
    pub async fn terminate(&self, id: &str) -> Result<Option<ExitStatus>, StreamError> {
        let Some(mut entry) = self.registry.remove(id) else {
            debug!(stream_id = %id, "No registered transcoder to stop");
            return Ok(None);
        };

        self.shutdown(id, &mut entry.child).await.map(Some)
    }

    async fn shutdown(&self, id: &str, child: &mut Child) -> Result<ExitStatus, StreamError> {
        match child.try_wait() {
            Ok(Some(status)) => {
                info!(stream_id = %id, %status, "Transcoder had already exited");
                return Ok(status);
            }
            Ok(None) => {}
            Err(e) => warn!(stream_id = %id, error = %e, "Failed to poll transcoder status"),
        }

        if let Err(e) = self.signal.terminate(child) {
            error!(
                stream_id = %id,
                signal = self.signal.name(),
                error = %e,
                "Graceful termination failed, killing transcoder"
            );
            // Nothing may keep running, yet the stop still counts as failed
            let name = self.signal.name();
            let reason = match force_kill(id, child).await {
                Ok(status) => format!("{} signal failed: {} (killed, {})", name, e, status),
                Err(kill) => format!("{} signal failed: {}; {}", name, e, kill),
            };
            return Err(StreamError::termination_failure(id, reason));
        }

        match timeout(self.grace_period, child.wait()).await {
            Ok(Ok(status)) => {
                info!(stream_id = %id, %status, "Transcoder stopped");
                Ok(status)
            }
            Ok(Err(e)) => {
                error!(stream_id = %id, error = %e, "Failed waiting for transcoder");
                Err(StreamError::termination_failure(id, e))
            }
            Err(_) => {
                warn!(
                    stream_id = %id,
                    grace_ms = self.grace_period.as_millis() as u64,
                    "Transcoder ignored termination, killing"
                );
                force_kill(id, child).await
            }
        }
    }
}

async fn force_kill(id: &str, child: &mut Child) -> Result<ExitStatus, StreamError> {
    if let Err(e) = child.start_kill() {
        error!(stream_id = %id, error = %e, "Failed to kill transcoder");
        return Err(StreamError::termination_failure(id, e));
    }
    match child.wait().await {
        Ok(status) => {
            info!(stream_id = %id, %status, "Transcoder killed");
            Ok(status)
        }
        Err(e) => {
            error!(stream_id = %id, error = %e, "Failed to reap killed transcoder");
            Err(StreamError::termination_failure(id, e))
        }
    }
}
