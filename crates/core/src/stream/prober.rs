//! Readiness polling for freshly launched transcoders.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use super::config::StreamsConfig;
use super::error::StreamError;
use super::registry::JobRegistry;
use super::types::StreamJob;

/// Extension of the media segments the transcoder writes.
pub const SEGMENT_EXTENSION: &str = "ts";

/// Diagnostic used when the transcoder log cannot be read.
pub const UNREADABLE_LOG: &str = "Could not read transcoder log.";

/// Waits for a job's playlist and first segment to appear.
#[derive(Debug, Clone)]
pub struct ReadinessProber {
    poll_interval: Duration,
    timeout: Duration,
    log_tail_lines: usize,
    public_base_url: String,
    playlist_name: String,
    registry: Option<Arc<JobRegistry>>,
}

impl ReadinessProber {
    pub fn new(config: &StreamsConfig) -> Self {
        Self {
            poll_interval: config.readiness.poll_interval(),
            timeout: config.readiness.timeout(),
            log_tail_lines: config.readiness.log_tail_lines,
            public_base_url: config.public_base_url.clone(),
            playlist_name: config.playlist_name.clone(),
            registry: None,
        }
    }

    /// Also requires the job to stay registered and its process alive.
    pub fn with_registry(mut self, registry: Arc<JobRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Public URL of the playlist for job `id`.
    pub fn playlist_url(&self, id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.public_base_url.trim_end_matches('/'),
            id,
            self.playlist_name
        )
    }

    /// Polls until both the playlist and a segment exist, or the budget runs out.
    ///
    /// Returns the playlist URL on success. On timeout the error carries the
    /// tail of the job's log. With a registry attached, a job that is stopped
    /// or whose transcoder exits fails the wait at the next poll, and a job is
    /// only reported ready while it is still registered and running.
    pub async fn wait_ready(&self, job: &StreamJob) -> Result<String, StreamError> {
        let playlist = job.output_dir.join(&self.playlist_name);
        let deadline = Instant::now() + self.timeout;
        let mut polls = 0u32;

        loop {
            polls += 1;
            let ready = is_ready(&job.output_dir, &playlist).await;
            self.ensure_alive(job).await?;
            if ready {
                debug!(stream_id = %job.id, polls, "Stream output ready");
                return Ok(self.playlist_url(&job.id));
            }
            if Instant::now() + self.poll_interval > deadline {
                break;
            }
            sleep(self.poll_interval).await;
        }

        warn!(
            stream_id = %job.id,
            timeout_ms = self.timeout.as_millis() as u64,
            "Stream output not ready in time"
        );

        Err(StreamError::ReadinessTimeout {
            id: job.id.clone(),
            timeout: self.timeout,
            log_path: job.log_path.clone(),
            log_tail: read_log_tail(&job.log_path, self.log_tail_lines).await,
        })
    }

    async fn ensure_alive(&self, job: &StreamJob) -> Result<(), StreamError> {
        let Some(registry) = &self.registry else {
            return Ok(());
        };

        match registry.try_wait(&job.id) {
            None => {
                warn!(stream_id = %job.id, "Stream stopped while waiting for output");
                Err(StreamError::StartCancelled { id: job.id.clone() })
            }
            Some(Ok(Some(status))) => {
                warn!(stream_id = %job.id, %status, "Transcoder exited before output was ready");
                Err(StreamError::TranscoderExited {
                    id: job.id.clone(),
                    status: status.to_string(),
                    log_path: job.log_path.clone(),
                    log_tail: read_log_tail(&job.log_path, self.log_tail_lines).await,
                })
            }
            Some(Ok(None)) => Ok(()),
            Some(Err(e)) => {
                // Unknown state; let the file check and the deadline decide
                debug!(stream_id = %job.id, error = %e, "Failed to poll transcoder status");
                Ok(())
            }
        }
    }
}

async fn is_ready(output_dir: &Path, playlist: &Path) -> bool {
    tokio::fs::try_exists(playlist).await.unwrap_or(false) && has_segment(output_dir).await
}

/// Whether `dir` holds at least one media segment. Listing errors count as "no".
async fn has_segment(dir: &Path) -> bool {
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return false;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == SEGMENT_EXTENSION) {
            return true;
        }
    }
    false
}

/// Last `lines` lines of the log at `path`, or a placeholder if unreadable.
pub async fn read_log_tail(path: &Path, lines: usize) -> Vec<String> {
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            let text = String::from_utf8_lossy(&bytes);
            let all: Vec<&str> = text.lines().collect();
            let start = all.len().saturating_sub(lines);
            all[start..].iter().map(|line| line.to_string()).collect()
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Failed to read transcoder log");
            vec![UNREADABLE_LOG.to_string()]
        }
    }
}
