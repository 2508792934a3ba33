//! Single and batch query behaviour against a scripted in-memory backend.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use promfacade_client::{Backend, MetricsClient, Range};
use promfacade_core::error::{PromFacadeError, Result};
use promfacade_core::protocol::value::{LabelSet, Sample, SamplePair, SampleStream, Value};
use promfacade_core::MetricType;

#[derive(Clone)]
enum Step {
    Ok(f64),
    Delayed(Duration, f64),
    Fail(&'static str),
    Hang,
    Panic,
    Scalar,
}

struct ScriptedBackend {
    steps: HashMap<String, Step>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedBackend {
    fn new(steps: &[(&str, Step)]) -> Self {
        Self {
            steps: steps
                .iter()
                .map(|(k, s)| (k.to_string(), s.clone()))
                .collect(),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    async fn run(&self, expr: &str, shape: fn(&str, f64) -> Value) -> Result<Value> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let step = self.steps.get(expr).cloned().unwrap_or(Step::Ok(1.0));
        let res = match step {
            Step::Ok(v) => Ok(shape(expr, v)),
            Step::Delayed(d, v) => {
                tokio::time::sleep(d).await;
                Ok(shape(expr, v))
            }
            Step::Fail(msg) => Err(PromFacadeError::Transport(msg.to_string())),
            Step::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(shape(expr, 0.0))
            }
            Step::Panic => panic!("scripted backend panic"),
            Step::Scalar => Ok(Value::Scalar(SamplePair::new(T0_MS, 1.0))),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        res
    }
}

const T0_MS: i64 = 1_700_000_000_000;

fn labels(expr: &str) -> LabelSet {
    let mut l = LabelSet::new();
    l.insert("__name__".into(), expr.into());
    l
}

fn vector(expr: &str, v: f64) -> Value {
    Value::Vector(vec![Sample {
        metric: labels(expr),
        value: SamplePair::new(T0_MS, v),
    }])
}

fn matrix(expr: &str, v: f64) -> Value {
    Value::Matrix(vec![SampleStream {
        metric: labels(expr),
        values: (0..3)
            .map(|i| SamplePair::new(T0_MS + i * 15_000, v + i as f64))
            .collect(),
    }])
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn query(&self, expr: &str, _time: DateTime<Utc>) -> Result<Value> {
        self.run(expr, vector).await
    }

    async fn query_range(&self, expr: &str, _range: &Range) -> Result<Value> {
        self.run(expr, matrix).await
    }
}

fn t0() -> DateTime<Utc> {
    Utc.timestamp_millis_opt(T0_MS).unwrap()
}

fn exprs(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn sorted_names(results: &[promfacade_core::Metric]) -> Vec<String> {
    let mut names: Vec<String> = results.iter().map(|m| m.metric_name().to_string()).collect();
    names.sort();
    names
}

#[tokio::test]
async fn single_query_is_untagged() {
    let client = MetricsClient::new(ScriptedBackend::new(&[("up", Step::Ok(1.0))]));
    let m = client.query("up", t0()).await;

    assert_eq!(m.metric_name(), "");
    assert!(m.error().is_none());
    let values = m.data().and_then(|d| d.as_vector()).expect("vector");
    assert_eq!(values.len(), 1);
    assert_eq!(values[0].sample.timestamp(), 1_700_000_000.0);
    assert_eq!(values[0].sample.value(), 1.0);
}

#[tokio::test]
async fn single_query_failure_is_captured() {
    let client = MetricsClient::new(ScriptedBackend::new(&[("up", Step::Fail("connection refused"))]));
    let m = client.query("up", t0()).await;

    assert!(m.data().is_none());
    assert_eq!(m.error(), Some("transport: connection refused"));
}

#[tokio::test]
async fn single_range_query() {
    let client = MetricsClient::new(ScriptedBackend::new(&[]));
    let range = Range::new(t0(), t0() + chrono::Duration::seconds(30), Duration::from_secs(15));
    let m = client.query_range("node_load1", &range).await;

    let series = &m.data().and_then(|d| d.as_matrix()).expect("matrix")[0].series;
    let ts: Vec<f64> = series.iter().map(|p| p.timestamp()).collect();
    assert_eq!(ts, vec![1_700_000_000.0, 1_700_000_015.0, 1_700_000_030.0]);
}

#[tokio::test]
async fn filtered_query_drops_series() {
    let client = MetricsClient::new(ScriptedBackend::new(&[]));
    let reject = |l: &LabelSet| l.get("__name__").map(String::as_str) != Some("up");
    let m = client.query_filtered("up", t0(), Some(&reject)).await;
    assert_eq!(m.data().map(|d| d.len()), Some(0));
}

#[tokio::test]
async fn backend_timeout_becomes_error() {
    let client = MetricsClient::new(ScriptedBackend::new(&[("slow", Step::Hang)]))
        .with_timeout(Duration::from_millis(50));
    let m = client.query("slow", t0()).await;
    assert!(m.error().unwrap().starts_with("timeout"), "{:?}", m.error());
}

#[tokio::test]
async fn empty_batch_returns_nothing() {
    let client = MetricsClient::new(ScriptedBackend::new(&[]));
    assert!(client.query_many(&[], t0()).await.is_empty());
}

#[tokio::test]
async fn every_expression_reported_exactly_once() {
    let client = MetricsClient::new(ScriptedBackend::new(&[]));
    let input = exprs(&["up", "cpu_usage", "up", "mem_free", "disk_io"]);
    let results = client.query_many(&input, t0()).await;

    let mut expected = input.clone();
    expected.sort();
    assert_eq!(results.len(), input.len());
    assert_eq!(sorted_names(&results), expected);
    assert!(results.iter().all(|m| m.is_ok()));
}

#[tokio::test]
async fn partial_failure_is_isolated() {
    let client = MetricsClient::new(ScriptedBackend::new(&[
        ("a", Step::Fail("boom")),
        ("c", Step::Fail("connection reset")),
    ]));
    let results = client.query_many(&exprs(&["a", "b", "c", "d", "e"]), t0()).await;

    assert_eq!(results.len(), 5);
    let failed: Vec<&str> = {
        let mut f: Vec<&str> = results
            .iter()
            .filter(|m| m.error().is_some())
            .map(|m| m.metric_name())
            .collect();
        f.sort();
        f
    };
    assert_eq!(failed, vec!["a", "c"]);
    for m in results.iter().filter(|m| m.is_ok()) {
        assert_eq!(m.data().map(|d| d.len()), Some(1));
        assert_eq!(m.error(), None);
    }
}

#[tokio::test]
async fn up_ok_cpu_usage_times_out() {
    let client = MetricsClient::new(ScriptedBackend::new(&[
        ("up", Step::Ok(1.0)),
        ("cpu_usage", Step::Hang),
    ]))
    .with_timeout(Duration::from_millis(100));

    let results = client.query_many(&exprs(&["up", "cpu_usage"]), t0()).await;
    let by_name: HashMap<&str, &promfacade_core::Metric> =
        results.iter().map(|m| (m.metric_name(), m)).collect();

    let up = by_name["up"];
    assert_eq!(up.error(), None);
    let data = up.data().unwrap();
    assert_eq!(data.metric_type(), MetricType::Vector);
    assert_eq!(data.as_vector().unwrap()[0].sample.value(), 1.0);

    let cpu = by_name["cpu_usage"];
    assert!(cpu.data().is_none());
    assert_eq!(cpu.error(), Some("timeout: query exceeded 100ms"));
}

#[tokio::test]
async fn batch_latency_is_bounded_by_slowest_query() {
    let slow = Step::Delayed(Duration::from_millis(200), 1.0);
    let client = MetricsClient::new(ScriptedBackend::new(&[
        ("slow_a", slow.clone()),
        ("slow_b", slow.clone()),
        ("slow_c", slow),
    ]));

    let started = Instant::now();
    let results = client
        .query_many(&exprs(&["slow_a", "fast", "slow_b", "slow_c"]), t0())
        .await;
    let elapsed = started.elapsed();

    assert_eq!(results.len(), 4);
    assert!(elapsed >= Duration::from_millis(200));
    assert!(elapsed < Duration::from_millis(550), "took {elapsed:?}");
    assert!(client.backend().max_in_flight.load(Ordering::SeqCst) > 1);
}

#[tokio::test]
async fn max_concurrency_caps_fan_out() {
    let slow = Step::Delayed(Duration::from_millis(50), 1.0);
    let client = MetricsClient::new(ScriptedBackend::new(&[
        ("a", slow.clone()),
        ("b", slow.clone()),
        ("c", slow),
    ]))
    .with_max_concurrency(1);

    let started = Instant::now();
    let results = client.query_many(&exprs(&["a", "b", "c"]), t0()).await;

    assert_eq!(results.len(), 3);
    assert!(started.elapsed() >= Duration::from_millis(150));
    assert_eq!(client.backend().max_in_flight.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn range_batch_tags_and_normalizes() {
    let client = MetricsClient::new(ScriptedBackend::new(&[("bad", Step::Fail("step must be positive"))]));
    let range = Range::new(t0(), t0() + chrono::Duration::seconds(30), Duration::from_secs(15));
    let results = client
        .query_many_range(&exprs(&["rate(x[5m])", "bad"]), range)
        .await;

    assert_eq!(sorted_names(&results), vec!["bad", "rate(x[5m])"]);
    for m in &results {
        match m.metric_name() {
            "bad" => assert_eq!(m.error(), Some("transport: step must be positive")),
            _ => {
                let data = m.data().unwrap();
                assert_eq!(data.metric_type(), MetricType::Matrix);
                assert_eq!(data.as_matrix().unwrap()[0].series.len(), 3);
            }
        }
    }
}

#[tokio::test]
async fn panicking_worker_still_yields_a_result() {
    let client = MetricsClient::new(ScriptedBackend::new(&[("boom", Step::Panic)]));
    let results = client.query_many(&exprs(&["ok", "boom"]), t0()).await;

    assert_eq!(sorted_names(&results), vec!["boom", "ok"]);
    let boom = results.iter().find(|m| m.metric_name() == "boom").unwrap();
    assert!(boom.error().unwrap().contains("aborted"));
}

#[tokio::test]
async fn shape_mismatch_is_empty_and_counted() {
    let client = MetricsClient::new(ScriptedBackend::new(&[("scalar(1)", Step::Scalar)]));
    let m = client.query("scalar(1)", t0()).await;

    assert_eq!(m.error(), None);
    assert_eq!(m.data().map(|d| d.is_empty()), Some(true));
    assert_eq!(
        client
            .metrics()
            .shape_mismatches
            .get(&[("kind", "instant"), ("actual", "scalar")]),
        1
    );
}

#[tokio::test]
async fn metrics_track_outcomes() {
    let client = MetricsClient::new(ScriptedBackend::new(&[("x", Step::Fail("down"))]));
    client.query_many(&exprs(&["x", "y", "z"]), t0()).await;

    let q = &client.metrics().queries;
    assert_eq!(q.get(&[("kind", "instant"), ("outcome", "ok")]), 2);
    assert_eq!(q.get(&[("kind", "instant"), ("outcome", "TRANSPORT")]), 1);
    assert_eq!(client.metrics().batches.get(&[("kind", "instant")]), 1);
    assert!(client.metrics().render().contains("promfacade_queries_total"));
}
