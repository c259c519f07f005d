//! The active-streams gauge counts jobs from launch, not from readiness.
//!
//! Kept in its own test binary so no other test touches the global gauge.

#![cfg(unix)]

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use hlsrelay_core::metrics::STREAMS_ACTIVE;
use hlsrelay_core::stream::StreamManager;
use hlsrelay_core::testing::{FakeBehavior, FakeTranscoder};

#[tokio::test]
async fn test_gauge_counts_starting_jobs() {
    let temp_dir = TempDir::new().unwrap();
    let fake =
        FakeTranscoder::install(temp_dir.path(), FakeBehavior::Ready { delay_ms: 1500 }).unwrap();
    let config = fake
        .config(temp_dir.path().join("streams"), "http://localhost:5000/hls/")
        .with_readiness(Duration::from_millis(25), Duration::from_secs(10))
        .with_grace_period(Duration::from_millis(500));
    let manager = Arc::new(StreamManager::new(config));

    let starter = Arc::clone(&manager);
    let start = tokio::spawn(async move { starter.start("rtsp://camera.local/live").await });

    let mut id = None;
    for _ in 0..100 {
        if let Some(found) = manager.active_ids().pop() {
            id = Some(found);
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let id = id.expect("job should be registered while starting");

    // Give the manager a moment past registration to publish the gauge
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(STREAMS_ACTIVE.get(), 1);

    let started = start.await.unwrap().unwrap();
    assert_eq!(started.id, id);
    assert_eq!(STREAMS_ACTIVE.get(), 1);

    assert!(manager.stop(&id).await.unwrap());
    assert_eq!(STREAMS_ACTIVE.get(), 0);
}
