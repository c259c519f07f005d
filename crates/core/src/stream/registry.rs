//! In-memory registry of live transcoder processes.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io;
use std::process::ExitStatus;
use std::sync::{Mutex, MutexGuard};

use super::types::RegisteredProcess;

/// Maps job ids to their running transcoder.
///
/// Every operation takes the lock once and never awaits while holding it.
/// An id is present exactly while its process is considered active.
#[derive(Debug, Default)]
pub struct JobRegistry {
    entries: Mutex<HashMap<String, RegisteredProcess>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, RegisteredProcess>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Registers a process under a free `id`.
    ///
    /// An occupied id is left untouched and the process is handed back.
    pub fn try_insert(
        &self,
        id: impl Into<String>,
        process: RegisteredProcess,
    ) -> Result<(), RegisteredProcess> {
        match self.lock().entry(id.into()) {
            Entry::Occupied(_) => Err(process),
            Entry::Vacant(slot) => {
                slot.insert(process);
                Ok(())
            }
        }
    }

    /// Atomically removes and returns the process registered under `id`.
    pub fn remove(&self, id: &str) -> Option<RegisteredProcess> {
        self.lock().remove(id)
    }

    /// Polls the registered process without reaping its entry.
    ///
    /// `None` when nothing is registered under `id`.
    pub fn try_wait(&self, id: &str) -> Option<io::Result<Option<ExitStatus>>> {
        self.lock().get_mut(id).map(|entry| entry.child.try_wait())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains_key(id)
    }

    /// Snapshot of the registered ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::process::Stdio;
    use std::sync::Arc;
    use tokio::process::Command;

    fn sleeper() -> RegisteredProcess {
        let child = Command::new("sleep")
            .arg("30")
            .stdout(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .expect("Failed to spawn sleep");
        RegisteredProcess::new(child, "rtsp://camera.local/stream")
    }

    #[tokio::test]
    async fn test_insert_and_remove() {
        let registry = JobRegistry::new();
        assert!(registry.is_empty());

        assert!(registry.try_insert("stream_a", sleeper()).is_ok());
        assert!(registry.contains("stream_a"));
        assert_eq!(registry.len(), 1);

        let removed = registry.remove("stream_a").expect("entry should exist");
        assert_eq!(removed.source_url, "rtsp://camera.local/stream");
        assert!(!registry.contains("stream_a"));
        assert!(registry.remove("stream_a").is_none());
    }

    #[tokio::test]
    async fn test_insert_keeps_existing_entry() {
        let registry = JobRegistry::new();
        registry.try_insert("stream_a", sleeper()).unwrap();

        let mut rejected = registry
            .try_insert("stream_a", sleeper())
            .expect_err("occupied id must be refused");
        assert_eq!(registry.len(), 1);

        // The refused process is handed back, not dropped
        rejected.child.kill().await.unwrap();
        assert!(matches!(registry.try_wait("stream_a"), Some(Ok(None))));
    }

    #[tokio::test]
    async fn test_try_wait_reports_exit() {
        let registry = JobRegistry::new();
        assert!(registry.try_wait("stream_missing").is_none());

        let child = Command::new("sh")
            .arg("-c")
            .arg("exit 4")
            .spawn()
            .expect("Failed to spawn sh");
        registry
            .try_insert("stream_done", RegisteredProcess::new(child, "rtsp://camera.local/x"))
            .unwrap();

        let mut status = None;
        for _ in 0..100 {
            if let Some(Ok(Some(exit))) = registry.try_wait("stream_done") {
                status = Some(exit);
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(status.and_then(|s| s.code()), Some(4));
        // Polling does not remove the entry
        assert!(registry.contains("stream_done"));
    }

    #[tokio::test]
    async fn test_ids_are_sorted() {
        let registry = JobRegistry::new();
        registry.try_insert("stream_b", sleeper()).unwrap();
        registry.try_insert("stream_a", sleeper()).unwrap();
        assert_eq!(registry.ids(), vec!["stream_a", "stream_b"]);
    }

    #[tokio::test]
    async fn test_concurrent_remove_yields_exactly_one_winner() {
        let registry = Arc::new(JobRegistry::new());
        registry.try_insert("stream_race", sleeper()).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.remove("stream_race").is_some() })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert!(registry.is_empty());
    }
}
