//! Lightweight in-process query metrics.
//!
//! Counters and histograms are atomics keyed by label sets and rendered in
//! the Prometheus text exposition format on demand.

pub mod metrics;

pub use metrics::QueryMetrics;
