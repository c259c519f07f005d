//! Stream lifecycle orchestration.

use std::sync::Arc;

use tokio::time::Instant;
use tracing::{error, info, warn};

use super::config::StreamsConfig;
use super::error::StreamError;
use super::launcher::ProcessLauncher;
use super::prober::ReadinessProber;
use super::registry::JobRegistry;
use super::signal::{GroupSignal, PlatformSignal};
use super::terminator::Terminator;
use super::types::{generate_stream_id, JobState, StartedStream};
use crate::metrics::{STREAMS_ACTIVE, STREAM_READINESS_DURATION, STREAM_STARTS, STREAM_STOPS};

/// Starts conversion jobs, waits for their output, and stops them on demand.
///
/// Start requests hold the caller until the job is confirmed ready or the
/// readiness budget is spent. A job is registered from the moment its process
/// exists, so it can be stopped while the start request is still waiting.
pub struct StreamManager {
    config: Arc<StreamsConfig>,
    registry: Arc<JobRegistry>,
    launcher: ProcessLauncher,
    prober: ReadinessProber,
    terminator: Terminator,
}

impl StreamManager {
    /// Creates a manager with its own registry and the platform signal strategy.
    pub fn new(config: StreamsConfig) -> Self {
        Self::with_registry(config, Arc::new(JobRegistry::new()))
    }

    /// Creates a manager sharing `registry`.
    pub fn with_registry(config: StreamsConfig, registry: Arc<JobRegistry>) -> Self {
        Self::with_signal(config, registry, Arc::new(PlatformSignal::default()))
    }

    /// Creates a manager with an explicit termination strategy.
    pub fn with_signal(
        config: StreamsConfig,
        registry: Arc<JobRegistry>,
        signal: Arc<dyn GroupSignal>,
    ) -> Self {
        let config = Arc::new(config);
        Self {
            launcher: ProcessLauncher::new(Arc::clone(&config), Arc::clone(&registry)),
            prober: ReadinessProber::new(&config).with_registry(Arc::clone(&registry)),
            terminator: Terminator::new(
                Arc::clone(&registry),
                signal,
                config.shutdown.grace_period(),
            ),
            registry,
            config,
        }
    }

    pub fn config(&self) -> &StreamsConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// Whether job `id` is currently running.
    pub fn is_active(&self, id: &str) -> bool {
        self.registry.contains(id)
    }

    /// Ids of all running jobs, sorted.
    pub fn active_ids(&self) -> Vec<String> {
        self.registry.ids()
    }

    /// Picks an id not currently held by the registry.
    fn fresh_id(&self) -> String {
        loop {
            let id = generate_stream_id();
            if !self.registry.contains(&id) {
                return id;
            }
            warn!(stream_id = %id, "Generated stream id already registered, regenerating");
        }
    }

    /// Starts converting `source_url` and waits until output is available.
    ///
    /// The URL is handed to the transcoder as given; blank input is refused.
    /// Success means the job is registered and its transcoder running.
    pub async fn start(&self, source_url: &str) -> Result<StartedStream, StreamError> {
        if source_url.trim().is_empty() {
            STREAM_STARTS.with_label_values(&["invalid"]).inc();
            return Err(StreamError::InvalidSource {
                reason: "source URL is empty".to_string(),
            });
        }

        let id = self.fresh_id();
        let began = Instant::now();

        let mut job = match self.launcher.launch(source_url, &id).await {
            Ok(job) => job,
            Err(e) => {
                error!(stream_id = %id, error = %e, "Failed to launch transcoder");
                STREAM_STARTS.with_label_values(&["launch_failed"]).inc();
                return Err(e);
            }
        };
        STREAMS_ACTIVE.set(self.registry.len() as i64);

        match self.prober.wait_ready(&job).await {
            Ok(playlist_url) => {
                job.transition(JobState::Running);
                STREAM_STARTS.with_label_values(&["ready"]).inc();
                STREAM_READINESS_DURATION.observe(began.elapsed().as_secs_f64());
                STREAMS_ACTIVE.set(self.registry.len() as i64);
                info!(
                    stream_id = %job.id,
                    source = %job.source_url,
                    elapsed_ms = began.elapsed().as_millis() as u64,
                    "Stream running"
                );
                Ok(StartedStream {
                    id: job.id,
                    playlist_url,
                    output_dir: job.output_dir,
                })
            }
            Err(e) => {
                job.transition(JobState::Failed);
                warn!(stream_id = %job.id, error = %e, "Stream failed to start, cleaning up");
                if let Err(cleanup) = self.terminator.terminate(&job.id).await {
                    error!(stream_id = %job.id, error = %cleanup, "Cleanup after failed start did not complete");
                }
                STREAM_STARTS.with_label_values(&[e.kind()]).inc();
                STREAMS_ACTIVE.set(self.registry.len() as i64);
                Err(e)
            }
        }
    }

    /// Stops job `id`. Returns `false` when no such job is active.
    pub async fn stop(&self, id: &str) -> Result<bool, StreamError> {
        let result = self.terminator.terminate(id).await;
        STREAMS_ACTIVE.set(self.registry.len() as i64);

        match result {
            Ok(Some(_)) => {
                STREAM_STOPS.with_label_values(&["stopped"]).inc();
                Ok(true)
            }
            Ok(None) => {
                STREAM_STOPS.with_label_values(&["not_found"]).inc();
                Ok(false)
            }
            Err(e) => {
                STREAM_STOPS.with_label_values(&["failed"]).inc();
                Err(e)
            }
        }
    }

    /// Stops every active job, returning how many were stopped cleanly.
    pub async fn stop_all(&self) -> usize {
        let mut stopped = 0;
        for id in self.registry.ids() {
            match self.stop(&id).await {
                Ok(true) => stopped += 1,
                Ok(false) => {}
                Err(e) => error!(stream_id = %id, error = %e, "Failed to stop stream"),
            }
        }
        stopped
    }
}
