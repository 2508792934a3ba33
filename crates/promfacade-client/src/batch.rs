//! Concurrent batch queries (fan-out / join).
//!
//! One tokio task per expression. Workers report `(index, Metric)` over an
//! mpsc channel drained by the calling task; the channel closes once every
//! worker has dropped its sender, which is the join barrier. Output order
//! is completion order.
//!
//! A failing expression never cancels its siblings. A worker that dies
//! without reporting is detected after the barrier and reported as a failed
//! `Metric`, so N expressions always yield N results.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, Semaphore};

use promfacade_core::Metric;

use crate::backend::{Backend, Range};
use crate::query::{MetricsClient, QueryKind};

impl<B: Backend + 'static> MetricsClient<B> {
    /// Instant-query every expression at `time` concurrently.
    pub async fn query_many(&self, exprs: &[String], time: DateTime<Utc>) -> Vec<Metric> {
        self.fan_out(QueryKind::Instant, exprs, move |client, expr| async move {
            client.query(&expr, time).await
        })
        .await
    }

    /// Range-query every expression over `range` concurrently.
    pub async fn query_many_range(&self, exprs: &[String], range: Range) -> Vec<Metric> {
        self.fan_out(QueryKind::Range, exprs, move |client, expr| async move {
            client.query_range(&expr, &range).await
        })
        .await
    }

    async fn fan_out<F, Fut>(&self, kind: QueryKind, exprs: &[String], run: F) -> Vec<Metric>
    where
        F: Fn(Self, String) -> Fut,
        Fut: Future<Output = Metric> + Send + 'static,
    {
        if exprs.is_empty() {
            return Vec::new();
        }

        let started = Instant::now();
        let limiter = (self.max_concurrency > 0)
            .then(|| Arc::new(Semaphore::new(self.max_concurrency)));

        // Capacity == worker count, so no send ever waits on the collector.
        let (tx, mut rx) = mpsc::channel::<(usize, Metric)>(exprs.len());

        for (idx, expr) in exprs.iter().enumerate() {
            let tx = tx.clone();
            let limiter = limiter.clone();
            let name = expr.clone();
            let fut = run(self.clone(), expr.clone());

            tokio::spawn(async move {
                let _permit = match limiter {
                    Some(sem) => sem.acquire_owned().await.ok(),
                    None => None,
                };
                let metric = fut.await.with_name(name);
                let _ = tx.send((idx, metric)).await;
            });
        }
        drop(tx);

        let mut results = Vec::with_capacity(exprs.len());
        let mut reported = vec![false; exprs.len()];
        while let Some((idx, metric)) = rx.recv().await {
            if let Some(slot) = reported.get_mut(idx) {
                *slot = true;
            }
            results.push(metric);
        }

        for (expr, done) in exprs.iter().zip(&reported) {
            if !done {
                tracing::error!(kind = kind.as_str(), expr = %expr, "batch worker exited without a result");
                results.push(Metric::failure(
                    expr.clone(),
                    "internal: query task aborted before reporting",
                ));
            }
        }

        let failed = results.iter().filter(|m| !m.is_ok()).count();
        self.metrics.batches.inc(&[("kind", kind.as_str())]);
        tracing::info!(
            kind = kind.as_str(),
            total = results.len(),
            failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "batch query finished"
        );

        results
    }
}
