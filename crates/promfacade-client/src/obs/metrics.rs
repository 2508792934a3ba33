//! Query metrics registry.
//!
//! Labels are flattened into sorted key vectors for deterministic keys.
//! Histogram buckets are fixed in milliseconds, which fits backend query
//! latencies (a 20 s timeout is the ceiling).

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

type LabelKey = Vec<(String, String)>;

fn label_key(labels: &[(&str, &str)]) -> LabelKey {
    let mut key: LabelKey = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn render_labels(key: &LabelKey) -> String {
    key.iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<LabelKey, AtomicU64>,
}

impl CounterVec {
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Current value (0 when the label set was never seen).
    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} counter", name);
        for r in self.map.iter() {
            let val = r.value().load(Ordering::Relaxed);
            let _ = writeln!(out, "{}{{{}}} {}", name, render_labels(r.key()), val);
        }
    }
}

// 5ms, 10ms, 50ms, 100ms, 250ms, 500ms, 1s, 5s, 20s
const BUCKETS_MILLIS: [u64; 9] = [5, 10, 50, 100, 250, 500, 1_000, 5_000, 20_000];

#[derive(Default)]
struct AtomicHistogram {
    count: AtomicU64,
    sum: AtomicU64,
    buckets: [AtomicU64; 9],
}

#[derive(Default)]
pub struct HistogramVec {
    map: DashMap<LabelKey, AtomicHistogram>,
}

impl HistogramVec {
    /// Observe a duration and increment cumulative buckets (millisecond scale).
    pub fn observe(&self, labels: &[(&str, &str)], duration: Duration) {
        let hist = self
            .map
            .entry(label_key(labels))
            .or_insert_with(AtomicHistogram::default);
        let millis = duration.as_millis() as u64;

        hist.count.fetch_add(1, Ordering::Relaxed);
        hist.sum.fetch_add(millis, Ordering::Relaxed);

        for (i, &b) in BUCKETS_MILLIS.iter().enumerate() {
            if millis <= b {
                hist.buckets[i].fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn count(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|h| h.count.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} histogram", name);
        for r in self.map.iter() {
            let hist = r.value();
            let label_str = render_labels(r.key());
            let prefix = if label_str.is_empty() {
                String::new()
            } else {
                format!("{},", label_str)
            };

            for (i, &le) in BUCKETS_MILLIS.iter().enumerate() {
                let count = hist.buckets[i].load(Ordering::Relaxed);
                let _ = writeln!(out, "{}_bucket{{{}le=\"{}\"}} {}", name, prefix, le, count);
            }
            let count = hist.count.load(Ordering::Relaxed);
            let _ = writeln!(out, "{}_bucket{{{}le=\"+Inf\"}} {}", name, prefix, count);

            let sum = hist.sum.load(Ordering::Relaxed);
            let _ = writeln!(out, "{}_sum{{{}}} {}", name, label_str, sum);
            let _ = writeln!(out, "{}_count{{{}}} {}", name, label_str, count);
        }
    }
}

/// Metrics owned by one `MetricsClient`.
#[derive(Default)]
pub struct QueryMetrics {
    /// kind=instant|range, outcome=ok|<error code>
    pub queries: CounterVec,
    /// kind, actual=<backend value kind>
    pub shape_mismatches: CounterVec,
    pub query_duration: HistogramVec, // In Milliseconds
    pub batches: CounterVec,
}

impl QueryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render all metrics in Prometheus text format.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.queries.render("promfacade_queries_total", &mut out);
        self.shape_mismatches
            .render("promfacade_shape_mismatch_total", &mut out);
        self.query_duration
            .render("promfacade_query_duration_millis", &mut out);
        self.batches.render("promfacade_batches_total", &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_labels_are_order_insensitive() {
        let c = CounterVec::default();
        c.inc(&[("kind", "instant"), ("outcome", "ok")]);
        c.inc(&[("outcome", "ok"), ("kind", "instant")]);
        assert_eq!(c.get(&[("kind", "instant"), ("outcome", "ok")]), 2);
        assert_eq!(c.get(&[("kind", "range"), ("outcome", "ok")]), 0);
    }

    #[test]
    fn histogram_renders_cumulative_buckets() {
        let h = HistogramVec::default();
        h.observe(&[("kind", "range")], Duration::from_millis(70));

        let mut out = String::new();
        h.render("q", &mut out);
        assert!(out.contains("q_bucket{kind=\"range\",le=\"50\"} 0"));
        assert!(out.contains("q_bucket{kind=\"range\",le=\"100\"} 1"));
        assert!(out.contains("q_bucket{kind=\"range\",le=\"+Inf\"} 1"));
        assert!(out.contains("q_sum{kind=\"range\"} 70"));
    }

    #[test]
    fn escapes_quotes_in_labels() {
        let c = CounterVec::default();
        c.inc(&[("expr", "up{job=\"x\"}")]);
        let mut out = String::new();
        c.render("c", &mut out);
        assert!(out.contains(r#"c{expr="up{job=\"x\"}"} 1"#));
    }
}
