//! Single-metric queries.
//!
//! Every entry point returns a `Metric`; backend failures and timeouts are
//! captured on `Metric::error` instead of being propagated, so the same
//! call can run unchanged inside a batch fan-out. No retries, no caching.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use promfacade_core::error::{PromFacadeError, Result};
use promfacade_core::normalize::{normalize_instant, normalize_range, shape_matches, LabelFilter};
use promfacade_core::protocol::value::Value;
use promfacade_core::{Metric, MetricData, MetricType};

use crate::backend::{Backend, Range};
use crate::config::schema::DEFAULT_TIMEOUT_MS;
use crate::config::ClientConfig;
use crate::http::PrometheusHttp;
use crate::obs::QueryMetrics;

/// Query kind, used for logs and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Instant,
    Range,
}

impl QueryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            QueryKind::Instant => "instant",
            QueryKind::Range => "range",
        }
    }

    fn metric_type(self) -> MetricType {
        match self {
            QueryKind::Instant => MetricType::Vector,
            QueryKind::Range => MetricType::Matrix,
        }
    }
}

/// Query facade over a `Backend`. Cheap to clone; clones share the backend
/// handle and the metrics registry.
pub struct MetricsClient<B> {
    pub(crate) backend: Arc<B>,
    pub(crate) timeout: Duration,
    pub(crate) max_concurrency: usize,
    pub(crate) metrics: Arc<QueryMetrics>,
}

impl<B> Clone for MetricsClient<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            timeout: self.timeout,
            max_concurrency: self.max_concurrency,
            metrics: Arc::clone(&self.metrics),
        }
    }
}

impl MetricsClient<PrometheusHttp> {
    /// Build an HTTP-backed client from config.
    pub fn from_config(cfg: &ClientConfig) -> Result<Self> {
        let backend = PrometheusHttp::new(&cfg.prometheus)?;
        Ok(Self::new(backend)
            .with_timeout(cfg.prometheus.timeout())
            .with_max_concurrency(cfg.batch.max_concurrency))
    }
}

impl<B: Backend + 'static> MetricsClient<B> {
    pub fn new(backend: B) -> Self {
        Self::from_arc(Arc::new(backend))
    }

    pub fn from_arc(backend: Arc<B>) -> Self {
        Self {
            backend,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            max_concurrency: 0,
            metrics: Arc::new(QueryMetrics::new()),
        }
    }

    /// Per-call deadline applied to every backend request.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Cap on concurrent backend calls per batch. `0` means unbounded.
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn metrics(&self) -> &QueryMetrics {
        &self.metrics
    }

    /// Instant query at `time`.
    pub async fn query(&self, expr: &str, time: DateTime<Utc>) -> Metric {
        self.query_filtered(expr, time, None).await
    }

    /// Instant query keeping only series accepted by `filter`.
    pub async fn query_filtered(
        &self,
        expr: &str,
        time: DateTime<Utc>,
        filter: Option<&LabelFilter>,
    ) -> Metric {
        let started = Instant::now();
        let res = self.call(self.backend.query(expr, time)).await;
        self.finish(QueryKind::Instant, expr, started, res, |v| {
            normalize_instant(v, filter)
        })
    }

    /// Ranged query over `range`.
    pub async fn query_range(&self, expr: &str, range: &Range) -> Metric {
        self.query_range_filtered(expr, range, None).await
    }

    /// Ranged query keeping only series accepted by `filter`.
    pub async fn query_range_filtered(
        &self,
        expr: &str,
        range: &Range,
        filter: Option<&LabelFilter>,
    ) -> Metric {
        let started = Instant::now();
        let res = self.call(self.backend.query_range(expr, range)).await;
        self.finish(QueryKind::Range, expr, started, res, |v| {
            normalize_range(v, filter)
        })
    }

    async fn call<F>(&self, fut: F) -> Result<Value>
    where
        F: Future<Output = Result<Value>>,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| PromFacadeError::Timeout(self.timeout))?
    }

    fn finish(
        &self,
        kind: QueryKind,
        expr: &str,
        started: Instant,
        res: Result<Value>,
        normalize: impl FnOnce(&Value) -> MetricData,
    ) -> Metric {
        let labels = [("kind", kind.as_str())];
        self.metrics.query_duration.observe(&labels, started.elapsed());

        match res {
            Ok(value) => {
                if !shape_matches(kind.metric_type(), &value) {
                    self.metrics
                        .shape_mismatches
                        .inc(&[("kind", kind.as_str()), ("actual", value.kind().as_str())]);
                }
                let data = normalize(&value);
                self.metrics
                    .queries
                    .inc(&[("kind", kind.as_str()), ("outcome", "ok")]);
                tracing::debug!(kind = kind.as_str(), expr, series = data.len(), "query ok");
                Metric::success("", data)
            }
            Err(e) => {
                self.metrics
                    .queries
                    .inc(&[("kind", kind.as_str()), ("outcome", e.code().as_str())]);
                tracing::warn!(kind = kind.as_str(), expr, error = %e, "query failed");
                Metric::failure("", e)
            }
        }
    }
}
