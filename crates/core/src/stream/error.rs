//! Error types for the stream module.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by stream start and stop operations.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The source URL was empty; nothing was launched.
    #[error("Invalid source URL: {reason}")]
    InvalidSource { reason: String },

    /// The transcoder binary could not be resolved; nothing was created.
    #[error("Transcoder '{binary}' not found in PATH")]
    TranscoderNotFound { binary: String },

    /// The job output directory or log file could not be created.
    #[error("Failed to prepare output directory {path}: {source}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The transcoder process could not be spawned.
    #[error("Failed to spawn transcoder {binary}: {source}")]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No playlist and segment appeared in time. The job was torn down.
    #[error(
        "Transcoder failed to produce an HLS playlist for {id} within {} seconds (log: {})",
        .timeout.as_secs(),
        .log_path.display()
    )]
    ReadinessTimeout {
        id: String,
        timeout: Duration,
        log_path: PathBuf,
        log_tail: Vec<String>,
    },

    /// The job was stopped while its start was still waiting for output.
    #[error("Stream {id} was stopped before it became ready")]
    StartCancelled { id: String },

    /// The transcoder exited before the job became ready.
    #[error("Transcoder for {id} exited before producing output ({status})")]
    TranscoderExited {
        id: String,
        status: String,
        log_path: PathBuf,
        log_tail: Vec<String>,
    },

    /// Another live job already holds this id; the new process was killed.
    #[error("Stream id {id} is already in use")]
    IdInUse { id: String },

    /// The process could not be shut down. Its registry entry is gone regardless.
    #[error("Failed to stop stream {id}: {reason}")]
    TerminationFailure { id: String, reason: String },

    /// No active job with this id.
    #[error("Stream not found: {id}")]
    JobNotFound { id: String },
}

impl StreamError {
    /// Creates a new termination failure error.
    pub fn termination_failure(id: impl Into<String>, reason: impl ToString) -> Self {
        Self::TerminationFailure {
            id: id.into(),
            reason: reason.to_string(),
        }
    }

    /// Trailing transcoder log lines, when the error carries them.
    pub fn log_tail(&self) -> Option<&[String]> {
        match self {
            Self::ReadinessTimeout { log_tail, .. }
            | Self::TranscoderExited { log_tail, .. } => Some(log_tail),
            _ => None,
        }
    }

    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidSource { .. } => "invalid_source",
            Self::TranscoderNotFound { .. } => "transcoder_not_found",
            Self::OutputDirectory { .. } => "output_directory",
            Self::Spawn { .. } => "spawn",
            Self::ReadinessTimeout { .. } => "readiness_timeout",
            Self::StartCancelled { .. } => "start_cancelled",
            Self::TranscoderExited { .. } => "transcoder_exited",
            Self::IdInUse { .. } => "id_in_use",
            Self::TerminationFailure { .. } => "termination_failure",
            Self::JobNotFound { .. } => "job_not_found",
        }
    }
}
