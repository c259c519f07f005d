//! Types for stream conversion jobs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::process::Child;

/// Prefix of every generated job id.
pub const STREAM_ID_PREFIX: &str = "stream_";

/// Lifecycle state of a conversion job.
///
/// `Starting` jobs become `Running` once output is observed, or `Failed`.
/// `Running` jobs become `Stopped`. Both `Stopped` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Starting,
    Running,
    Stopped,
    Failed,
}

impl JobState {
    /// Whether `next` is a legal successor of this state.
    pub fn can_transition_to(self, next: JobState) -> bool {
        matches!(
            (self, next),
            (JobState::Starting, JobState::Running)
                | (JobState::Starting, JobState::Failed)
                | (JobState::Running, JobState::Stopped)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Stopped | JobState::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Starting => "starting",
            JobState::Running => "running",
            JobState::Stopped => "stopped",
            JobState::Failed => "failed",
        }
    }
}

/// One conversion of a source feed into segmented output.
#[derive(Debug, Clone, Serialize)]
pub struct StreamJob {
    pub id: String,
    pub source_url: String,
    /// `<output_root>/<id>`, holding playlist, segments and log.
    pub output_dir: PathBuf,
    pub log_path: PathBuf,
    pub state: JobState,
    pub started_at: DateTime<Utc>,
}

impl StreamJob {
    /// Moves the job to `next`, ignoring illegal transitions.
    ///
    /// Returns whether the transition happened.
    pub fn transition(&mut self, next: JobState) -> bool {
        if self.state.can_transition_to(next) {
            self.state = next;
            true
        } else {
            false
        }
    }
}

/// Result of a successful start.
#[derive(Debug, Clone, Serialize)]
pub struct StartedStream {
    pub id: String,
    pub playlist_url: String,
    pub output_dir: PathBuf,
}

/// A live transcoder owned by the registry.
#[derive(Debug)]
pub struct RegisteredProcess {
    pub child: Child,
    pub source_url: String,
    pub started_at: DateTime<Utc>,
}

impl RegisteredProcess {
    pub fn new(child: Child, source_url: impl Into<String>) -> Self {
        Self {
            child,
            source_url: source_url.into(),
            started_at: Utc::now(),
        }
    }
}

/// Generates a fresh job id from random bytes rendered as lowercase hex.
pub fn generate_stream_id() -> String {
    format!("{}{}", STREAM_ID_PREFIX, uuid::Uuid::new_v4().simple())
}
