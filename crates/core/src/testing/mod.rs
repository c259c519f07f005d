//! Testing utilities for exercising the stream lifecycle without ffmpeg.
//!
//! [`FakeTranscoder`] writes a small shell script that accepts the launcher's
//! arguments and behaves like a transcoder: it logs, writes a playlist and a
//! segment next to the output path given as its last argument, and keeps
//! running until signalled.
//!
//! # Example
//!
//! ```rust,ignore
//! use hlsrelay_core::testing::{FakeBehavior, FakeTranscoder};
//!
//! let fake = FakeTranscoder::install(temp_dir.path(), FakeBehavior::Ready { delay_ms: 100 })?;
//! let manager = StreamManager::new(fake.config(temp_dir.path().join("streams"), "http://localhost/hls/"));
//! ```

#![cfg(unix)]

use std::io;
use std::path::{Path, PathBuf};

use crate::stream::StreamsConfig;

/// Name of the file the `WithHelper` behavior writes its helper pid into.
pub const HELPER_PID_FILE: &str = "helper.pid";

/// How the fake transcoder behaves once launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeBehavior {
    /// Produces a playlist and a segment after `delay_ms`, then idles.
    Ready { delay_ms: u64 },
    /// Logs an error and never produces output.
    Silent,
    /// Writes a playlist but no segment.
    PlaylistOnly,
    /// Produces output and ignores `SIGTERM`.
    IgnoreTerm,
    /// Produces output and spawns a helper process in its group.
    WithHelper,
}

impl FakeBehavior {
    fn body(self) -> String {
        const OUTPUT: &str = r#": > "$dir/seg_000.ts"
printf '#EXTM3U\n#EXT-X-TARGETDURATION:1\n#EXTINF:1.0,\nseg_000.ts\n' > "$playlist"
echo "fake transcoder: writing $playlist""#;

        match self {
            FakeBehavior::Ready { delay_ms } => format!(
                "sleep {}.{:03}\n{}\nexec sleep 300\n",
                delay_ms / 1000,
                delay_ms % 1000,
                OUTPUT
            ),
            FakeBehavior::Silent => {
                "echo \"fake transcoder: Connection refused\" >&2\nexec sleep 300\n".to_string()
            }
            FakeBehavior::PlaylistOnly => {
                "printf '#EXTM3U\\n' > \"$playlist\"\nexec sleep 300\n".to_string()
            }
            FakeBehavior::IgnoreTerm => {
                format!("trap '' TERM\n{}\nwhile :; do sleep 1; done\n", OUTPUT)
            }
            FakeBehavior::WithHelper => format!(
                "sleep 300 &\necho $! > \"$dir/{}\"\n{}\nwait\n",
                HELPER_PID_FILE, OUTPUT
            ),
        }
    }
}

// Logs the argument following `-i` exactly as received
const SOURCE_LINE: &str =
    "prev=\nfor arg; do [ \"$prev\" = \"-i\" ] && echo \"fake transcoder source: [$arg]\"; prev=$arg; done\n";

/// A shell script standing in for the transcoder binary.
#[derive(Debug, Clone)]
pub struct FakeTranscoder {
    script: PathBuf,
}

impl FakeTranscoder {
    /// Writes the script for `behavior` into `dir`.
    pub fn install(dir: &Path, behavior: FakeBehavior) -> io::Result<Self> {
        let script = dir.join("fake-transcoder.sh");
        let content = format!(
            "for playlist; do :; done\ndir=$(dirname \"$playlist\")\necho \"fake transcoder invoked with: $*\"\n{}{}",
            SOURCE_LINE,
            behavior.body()
        );
        std::fs::write(&script, content)?;
        Ok(Self { script })
    }

    pub fn script(&self) -> &Path {
        &self.script
    }

    /// A config running this script through `sh` for every launch.
    pub fn config(&self, output_root: impl Into<PathBuf>, public_base_url: &str) -> StreamsConfig {
        StreamsConfig::new(output_root, public_base_url)
            .with_transcoder("sh")
            .with_global_args(vec![self.script.to_string_lossy().to_string()])
    }
}

/// Whether `pid` is gone or only lingers as a zombie.
#[cfg(target_os = "linux")]
pub fn process_exited(pid: u32) -> bool {
    match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
        // State follows the parenthesised command name
        Ok(stat) => stat
            .rsplit_once(')')
            .and_then(|(_, rest)| rest.split_whitespace().next())
            .is_some_and(|state| state == "Z" || state == "X"),
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_install_writes_script() {
        let temp_dir = TempDir::new().unwrap();
        let fake = FakeTranscoder::install(temp_dir.path(), FakeBehavior::Ready { delay_ms: 1250 })
            .unwrap();
        let script = std::fs::read_to_string(fake.script()).unwrap();
        assert!(script.contains("sleep 1.250"));
        assert!(script.contains("seg_000.ts"));
    }

    #[test]
    fn test_config_runs_script_through_sh() {
        let temp_dir = TempDir::new().unwrap();
        let fake = FakeTranscoder::install(temp_dir.path(), FakeBehavior::Silent).unwrap();
        let config = fake.config("/srv/hls", "http://localhost/hls/");
        assert_eq!(config.transcoder.binary, "sh");
        assert_eq!(
            config.transcoder.global_args,
            vec![fake.script().to_string_lossy().to_string()]
        );
    }
}
