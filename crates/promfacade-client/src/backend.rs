//! Backend seam: the time-series store the client queries.
//!
//! Implementations must be safe to call concurrently; the batch engine
//! shares one instance across all workers without locking.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use promfacade_core::error::Result;
use promfacade_core::protocol::value::Value;

/// Evaluation window of a ranged query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub step: Duration,
}

impl Range {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, step: Duration) -> Self {
        Self { start, end, step }
    }
}

/// Instant and ranged query capability of a time-series backend.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Evaluate `expr` at `time`.
    async fn query(&self, expr: &str, time: DateTime<Utc>) -> Result<Value>;

    /// Evaluate `expr` over `range`. Step validation is left to the backend.
    async fn query_range(&self, expr: &str, range: &Range) -> Result<Value>;
}
