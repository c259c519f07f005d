//! Graceful termination of a transcoder and the helpers it spawned.
//!
//! The transcoder is launched as the leader of its own process group, so on
//! unix the whole group is signalled. Elsewhere only the handle itself can be
//! asked to terminate.

use std::io;
use tokio::process::Child;

/// Sends the graceful termination request for a launched transcoder.
pub trait GroupSignal: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Requests termination without waiting for the process to exit.
    fn terminate(&self, child: &mut Child) -> io::Result<()>;
}

/// Signals the process group led by the child with `SIGTERM`.
#[cfg(unix)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessGroupSignal;

#[cfg(unix)]
impl GroupSignal for ProcessGroupSignal {
    fn name(&self) -> &str {
        "process-group"
    }

    fn terminate(&self, child: &mut Child) -> io::Result<()> {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::{getpgid, Pid};

        let pid = child
            .id()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "process already reaped"))?;
        let pgid = getpgid(Some(Pid::from_raw(pid as i32)))?;
        killpg(pgid, Signal::SIGTERM)?;
        Ok(())
    }
}

/// Terminates the child handle only.
#[derive(Debug, Clone, Copy, Default)]
pub struct HandleSignal;

impl GroupSignal for HandleSignal {
    fn name(&self) -> &str {
        "handle"
    }

    fn terminate(&self, child: &mut Child) -> io::Result<()> {
        child.start_kill()
    }
}

/// The signal strategy for the current target.
#[cfg(unix)]
pub type PlatformSignal = ProcessGroupSignal;

/// The signal strategy for the current target.
#[cfg(not(unix))]
pub type PlatformSignal = HandleSignal;

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::process::{CommandExt, ExitStatusExt};
    use std::process::Stdio;
    use tokio::process::Command;

    fn spawn_group_leader(script: &str) -> Child {
        let mut command = std::process::Command::new("sh");
        command
            .arg("-c")
            .arg(script)
            .stdout(Stdio::null())
            .process_group(0);
        Command::from(command)
            .kill_on_drop(true)
            .spawn()
            .expect("Failed to spawn sh")
    }

    #[tokio::test]
    async fn test_process_group_signal_terminates_leader() {
        let mut child = spawn_group_leader("exec sleep 30");
        ProcessGroupSignal.terminate(&mut child).unwrap();
        let status = child.wait().await.unwrap();
        assert_eq!(
            status.signal(),
            Some(nix::sys::signal::Signal::SIGTERM as i32)
        );
    }

    #[tokio::test]
    async fn test_process_group_signal_fails_after_reap() {
        let mut child = spawn_group_leader("exit 0");
        child.wait().await.unwrap();
        let err = ProcessGroupSignal.terminate(&mut child).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_handle_signal_kills_child() {
        let mut child = spawn_group_leader("exec sleep 30");
        HandleSignal.terminate(&mut child).unwrap();
        let status = child.wait().await.unwrap();
        assert!(!status.success());
    }
}
