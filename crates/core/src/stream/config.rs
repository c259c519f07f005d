//! Configuration for stream conversion jobs.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Settings for launching, probing and tearing down conversion jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamsConfig {
    /// Root directory holding one output directory per job.
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,

    /// Externally reachable base URL under which `output_root` is served.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// Playlist file name written inside each job directory.
    #[serde(default = "default_playlist_name")]
    pub playlist_name: String,

    /// Transcoder log file name written inside each job directory.
    #[serde(default = "default_log_file_name")]
    pub log_file_name: String,

    #[serde(default)]
    pub transcoder: TranscoderConfig,

    #[serde(default)]
    pub readiness: ReadinessConfig,

    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

fn default_output_root() -> PathBuf {
    PathBuf::from("HLS_STREAMS")
}

fn default_public_base_url() -> String {
    "http://localhost:5000/hls/".to_string()
}

fn default_playlist_name() -> String {
    "index.m3u8".to_string()
}

fn default_log_file_name() -> String {
    "ffmpeg.log".to_string()
}

impl Default for StreamsConfig {
    fn default() -> Self {
        Self {
            output_root: default_output_root(),
            public_base_url: default_public_base_url(),
            playlist_name: default_playlist_name(),
            log_file_name: default_log_file_name(),
            transcoder: TranscoderConfig::default(),
            readiness: ReadinessConfig::default(),
            shutdown: ShutdownConfig::default(),
        }
    }
}

impl StreamsConfig {
    /// Creates a config writing under `output_root` and served from `public_base_url`.
    pub fn new(output_root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            output_root: output_root.into(),
            public_base_url: public_base_url.into(),
            ..Default::default()
        }
    }

    /// Sets the transcoder binary (name resolved on `PATH`, or a path).
    pub fn with_transcoder(mut self, binary: impl Into<String>) -> Self {
        self.transcoder.binary = binary.into();
        self
    }

    /// Sets the arguments placed before the generated transcoder arguments.
    pub fn with_global_args(mut self, args: Vec<String>) -> Self {
        self.transcoder.global_args = args;
        self
    }

    /// Sets the readiness poll interval and total budget.
    pub fn with_readiness(mut self, poll_interval: Duration, timeout: Duration) -> Self {
        self.readiness.poll_interval_ms = poll_interval.as_millis() as u64;
        self.readiness.timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Sets the grace period granted after the termination signal.
    pub fn with_grace_period(mut self, grace: Duration) -> Self {
        self.shutdown.grace_period_ms = grace.as_millis() as u64;
        self
    }
}

/// External transcoder invocation settings.
///
/// Codec choices are fixed by the launcher; only the segmenting window and
/// pass-through arguments are tunable here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscoderConfig {
    /// Binary name looked up on `PATH`, or an explicit path.
    #[serde(default = "default_binary")]
    pub binary: String,

    /// Target duration of each media segment in seconds.
    #[serde(default = "default_segment_duration")]
    pub segment_duration_secs: u32,

    /// Number of live segments kept in the playlist window.
    #[serde(default = "default_playlist_size")]
    pub playlist_size: u32,

    /// Arguments placed before the input options.
    #[serde(default = "default_global_args")]
    pub global_args: Vec<String>,

    /// Arguments placed right before the playlist output path.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_binary() -> String {
    "ffmpeg".to_string()
}

fn default_segment_duration() -> u32 {
    1
}

fn default_playlist_size() -> u32 {
    3
}

fn default_global_args() -> Vec<String> {
    vec!["-hide_banner".to_string()]
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            segment_duration_secs: default_segment_duration(),
            playlist_size: default_playlist_size(),
            global_args: default_global_args(),
            extra_args: Vec::new(),
        }
    }
}

/// Readiness polling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Total time a start request waits for the first playlist and segment.
    #[serde(default = "default_readiness_timeout")]
    pub timeout_ms: u64,

    /// Number of trailing log lines attached to a readiness timeout.
    #[serde(default = "default_log_tail_lines")]
    pub log_tail_lines: usize,
}

fn default_poll_interval() -> u64 {
    500
}

fn default_readiness_timeout() -> u64 {
    30_000
}

fn default_log_tail_lines() -> usize {
    60
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            timeout_ms: default_readiness_timeout(),
            log_tail_lines: default_log_tail_lines(),
        }
    }
}

impl ReadinessConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Termination settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownConfig {
    /// Time allowed between the termination signal and a forced kill.
    #[serde(default = "default_grace_period")]
    pub grace_period_ms: u64,
}

fn default_grace_period() -> u64 {
    5_000
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            grace_period_ms: default_grace_period(),
        }
    }
}

impl ShutdownConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }
}
