//! Transcoder process launcher.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use chrono::Utc;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::config::StreamsConfig;
use super::error::StreamError;
use super::registry::JobRegistry;
use super::types::{JobState, RegisteredProcess, StreamJob};

#[cfg(windows)]
const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;

/// Starts transcoders and registers them as soon as they are spawned.
pub struct ProcessLauncher {
    config: Arc<StreamsConfig>,
    registry: Arc<JobRegistry>,
}

impl ProcessLauncher {
    pub fn new(config: Arc<StreamsConfig>, registry: Arc<JobRegistry>) -> Self {
        Self { config, registry }
    }

    /// Output directory for the job `id`.
    pub fn output_dir(&self, id: &str) -> PathBuf {
        self.config.output_root.join(id)
    }

    /// Resolves the configured transcoder against `PATH`.
    pub fn resolve_transcoder(&self) -> Result<PathBuf, StreamError> {
        which::which(&self.config.transcoder.binary).map_err(|_| StreamError::TranscoderNotFound {
            binary: self.config.transcoder.binary.clone(),
        })
    }

    /// Builds the transcoder arguments for pulling `source_url` into `output_dir`.
    fn build_args(&self, source_url: &str, output_dir: &Path) -> Vec<String> {
        let transcoder = &self.config.transcoder;
        let mut args = transcoder.global_args.clone();

        // Input over TCP; UDP drops packets on lossy camera links
        args.extend([
            "-rtsp_transport".to_string(),
            "tcp".to_string(),
            "-i".to_string(),
            source_url.to_string(),
        ]);

        // Low latency H.264 with a keyframe every 30 frames
        args.extend(
            [
                "-c:v", "libx264", "-preset", "veryfast", "-tune", "zerolatency",
                "-sc_threshold", "0", "-g", "30", "-keyint_min", "30",
            ]
            .map(String::from),
        );

        args.extend(["-c:a", "aac", "-b:a", "96k"].map(String::from));

        // Rolling HLS window
        args.extend([
            "-hls_time".to_string(),
            transcoder.segment_duration_secs.to_string(),
            "-hls_list_size".to_string(),
            transcoder.playlist_size.to_string(),
            "-hls_flags".to_string(),
            "delete_segments+append_list".to_string(),
            "-hls_segment_filename".to_string(),
            output_dir.join("seg_%03d.ts").to_string_lossy().to_string(),
        ]);

        args.extend(transcoder.extra_args.iter().cloned());

        args.push(
            output_dir
                .join(&self.config.playlist_name)
                .to_string_lossy()
                .to_string(),
        );

        args
    }

    /// Launches a transcoder for `source_url` under job `id` and registers it.
    ///
    /// The binary is resolved before anything is created on disk. The returned
    /// job is still `Starting`; readiness is established by the prober.
    pub async fn launch(&self, source_url: &str, id: &str) -> Result<StreamJob, StreamError> {
        let transcoder = self.resolve_transcoder()?;

        let output_dir = self.output_dir(id);
        tokio::fs::create_dir_all(&output_dir)
            .await
            .map_err(|source| StreamError::OutputDirectory {
                path: output_dir.clone(),
                source,
            })?;

        let log_path = output_dir.join(&self.config.log_file_name);
        let output_error = |source| StreamError::OutputDirectory {
            path: log_path.clone(),
            source,
        };
        let log = std::fs::File::create(&log_path).map_err(output_error)?;
        let log_stderr = log.try_clone().map_err(output_error)?;

        let args = self.build_args(source_url, &output_dir);
        debug!(stream_id = %id, binary = %transcoder.display(), ?args, "Spawning transcoder");

        let mut command = std::process::Command::new(&transcoder);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_stderr));
        detach(&mut command);

        let child = Command::from(command)
            .spawn()
            .map_err(|source| StreamError::Spawn {
                binary: transcoder.clone(),
                source,
            })?;
        let pid = child.id();

        if let Err(mut rejected) = self
            .registry
            .try_insert(id, RegisteredProcess::new(child, source_url))
        {
            warn!(stream_id = %id, "Stream id already registered, killing new transcoder");
            if rejected.child.start_kill().is_ok() {
                let _ = rejected.child.wait().await;
            }
            return Err(StreamError::IdInUse { id: id.to_string() });
        }

        info!(stream_id = %id, pid = ?pid, output_dir = %output_dir.display(), "Transcoder launched");

        Ok(StreamJob {
            id: id.to_string(),
            source_url: source_url.to_string(),
            output_dir,
            log_path,
            state: JobState::Starting,
            started_at: Utc::now(),
        })
    }
}

/// Puts the child in a fresh process group so it can be signalled with its helpers.
fn detach(command: &mut std::process::Command) {
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        command.creation_flags(CREATE_NEW_PROCESS_GROUP);
    }
}
