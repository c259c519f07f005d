//! Prometheus metrics for core components.
//!
//! This module provides metrics for the stream lifecycle: start outcomes,
//! time to first output, stop outcomes and the number of live jobs.

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Stream Metrics
// =============================================================================

/// Stream start attempts by result.
pub static STREAM_STARTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("hlsrelay_stream_starts_total", "Total stream start attempts"),
        &["result"], // "ready", "launch_failed", "invalid", or the failure kind
    )
    .unwrap()
});

/// Time from launch until the first playlist and segment were observed.
pub static STREAM_READINESS_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "hlsrelay_stream_readiness_seconds",
            "Time until a started stream produced output",
        )
        .buckets(vec![0.5, 1.0, 2.0, 3.0, 5.0, 10.0, 20.0, 30.0]),
    )
    .unwrap()
});

/// Stream stop requests by result.
pub static STREAM_STOPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("hlsrelay_stream_stops_total", "Total stream stop requests"),
        &["result"], // "stopped", "not_found", "failed"
    )
    .unwrap()
});

/// Currently registered streams.
pub static STREAMS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("hlsrelay_streams_active", "Number of active streams").unwrap()
});

/// All core metrics, for registration with a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(STREAM_STARTS.clone()),
        Box::new(STREAM_READINESS_DURATION.clone()),
        Box::new(STREAM_STOPS.clone()),
        Box::new(STREAMS_ACTIVE.clone()),
    ]
}
