//! Prometheus HTTP API backend.
//!
//! - `GET /api/v1/query?query=..&time=..`
//! - `GET /api/v1/query_range?query=..&start=..&end=..&step=..`
//!
//! Error responses (4xx/5xx) still carry the JSON envelope, so the body is
//! always decoded and backend errors surface with their `errorType`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;

use promfacade_core::error::{PromFacadeError, Result};
use promfacade_core::protocol::api::decode_response;
use promfacade_core::protocol::value::Value;

use crate::backend::{Backend, Range};
use crate::config::PrometheusSection;

const QUERY_PATH: &str = "/api/v1/query";
const QUERY_RANGE_PATH: &str = "/api/v1/query_range";

/// Backend talking to a Prometheus-compatible HTTP API.
#[derive(Debug, Clone)]
pub struct PrometheusHttp {
    client: Client,
    base_url: String,
}

impl PrometheusHttp {
    /// Build from config. The reqwest client is created once and shared.
    pub fn new(cfg: &PrometheusSection) -> Result<Self> {
        Self::with_base_url(cfg.base_url(), cfg.timeout())
    }

    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PromFacadeError::Internal(format!("http client build failed: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);

        let resp = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        let body = resp.bytes().await.map_err(transport_error)?;

        let decoded = match decode_response(&body) {
            Ok(d) => d,
            // A non-JSON error page says more through its status line.
            Err(PromFacadeError::Decode(msg)) if !status.is_success() => {
                return Err(PromFacadeError::Transport(format!(
                    "{url} returned {status}: {msg}"
                )));
            }
            Err(e) => return Err(e),
        };

        for w in &decoded.warnings {
            tracing::warn!(path, warning = %w, "backend returned warning");
        }

        Ok(decoded.value)
    }
}

#[async_trait]
impl Backend for PrometheusHttp {
    async fn query(&self, expr: &str, time: DateTime<Utc>) -> Result<Value> {
        let params = [("query", expr.to_string()), ("time", unix_seconds(time))];
        self.get(QUERY_PATH, &params).await
    }

    async fn query_range(&self, expr: &str, range: &Range) -> Result<Value> {
        let params = [
            ("query", expr.to_string()),
            ("start", unix_seconds(range.start)),
            ("end", unix_seconds(range.end)),
            ("step", range.step.as_secs_f64().to_string()),
        ];
        self.get(QUERY_RANGE_PATH, &params).await
    }
}

/// Unix seconds with millisecond precision, as the API accepts.
fn unix_seconds(t: DateTime<Utc>) -> String {
    format!("{:.3}", t.timestamp_millis() as f64 / 1000.0)
}

fn transport_error(e: reqwest::Error) -> PromFacadeError {
    if e.is_timeout() {
        PromFacadeError::Transport(format!("request timed out: {e}"))
    } else {
        PromFacadeError::Transport(e.to_string())
    }
}
