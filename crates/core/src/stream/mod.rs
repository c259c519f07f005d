//! Stream conversion manager.
//!
//! Turns a live RTSP feed into a rolling HLS playlist by driving an external
//! transcoder, and tracks each job so it can be stopped later.
//!
//! # Components
//!
//! - [`ProcessLauncher`] spawns the transcoder in its own process group and
//!   registers it immediately.
//! - [`ReadinessProber`] polls the job directory until a playlist and a
//!   segment exist.
//! - [`JobRegistry`] maps job ids to live processes.
//! - [`Terminator`] removes a job and shuts its process group down.
//! - [`StreamManager`] ties the above together.
//!
//! # Example
//!
//! ```ignore
//! use hlsrelay_core::stream::{StreamManager, StreamsConfig};
//!
//! let manager = StreamManager::new(StreamsConfig::new("/srv/hls", "http://localhost:5000/hls/"));
//!
//! let started = manager.start("rtsp://camera.local/live").await?;
//! println!("Playing at {}", started.playlist_url);
//!
//! manager.stop(&started.id).await?;
//! ```

mod config;
mod error;
mod launcher;
mod manager;
mod prober;
mod registry;
mod signal;
mod terminator;
mod types;

pub use config::{ReadinessConfig, ShutdownConfig, StreamsConfig, TranscoderConfig};
pub use error::StreamError;
pub use launcher::ProcessLauncher;
pub use manager::StreamManager;
pub use prober::{read_log_tail, ReadinessProber, SEGMENT_EXTENSION, UNREADABLE_LOG};
pub use registry::JobRegistry;
#[cfg(unix)]
pub use signal::ProcessGroupSignal;
pub use signal::{GroupSignal, HandleSignal, PlatformSignal};
pub use terminator::Terminator;
pub use types::{
    generate_stream_id, JobState, RegisteredProcess, StartedStream, StreamJob, STREAM_ID_PREFIX,
};
