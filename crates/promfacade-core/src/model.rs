//! Normalized metric model handed to upstream handlers.
//!
//! Instant and ranged query results share one representation. The
//! vector/matrix distinction is carried by `MetricData` variants, so a
//! vector entry can never hold a series and a matrix entry can never hold
//! a single sample.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::protocol::value::LabelSet;

/// A single `(timestamp, value)` sample. Timestamp is seconds since epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Point {
    timestamp: f64,
    value: f64,
}

impl Point {
    pub fn new(timestamp: f64, value: f64) -> Self {
        Self { timestamp, value }
    }

    /// Seconds since epoch (fractional).
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

impl From<(f64, f64)> for Point {
    fn from((timestamp, value): (f64, f64)) -> Self {
        Self::new(timestamp, value)
    }
}

impl From<Point> for (f64, f64) {
    fn from(p: Point) -> Self {
        (p.timestamp, p.value)
    }
}

/// One labeled sample from an instant query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorValue {
    pub metadata: LabelSet,
    pub sample: Point,
}

/// One labeled series from a ranged query. Points keep backend order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixValue {
    pub metadata: LabelSet,
    pub series: Vec<Point>,
}

/// Query kind tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricType {
    Vector,
    Matrix,
}

impl MetricType {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricType::Vector => "vector",
            MetricType::Matrix => "matrix",
        }
    }
}

/// Normalized result payload of one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "metricType", content = "metricValues", rename_all = "lowercase")]
pub enum MetricData {
    Vector(Vec<VectorValue>),
    Matrix(Vec<MatrixValue>),
}

impl MetricData {
    pub fn empty(kind: MetricType) -> Self {
        match kind {
            MetricType::Vector => MetricData::Vector(Vec::new()),
            MetricType::Matrix => MetricData::Matrix(Vec::new()),
        }
    }

    pub fn metric_type(&self) -> MetricType {
        match self {
            MetricData::Vector(_) => MetricType::Vector,
            MetricData::Matrix(_) => MetricType::Matrix,
        }
    }

    /// Number of labeled entries (samples or series).
    pub fn len(&self) -> usize {
        match self {
            MetricData::Vector(v) => v.len(),
            MetricData::Matrix(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_vector(&self) -> Option<&[VectorValue]> {
        match self {
            MetricData::Vector(v) => Some(v),
            MetricData::Matrix(_) => None,
        }
    }

    pub fn as_matrix(&self) -> Option<&[MatrixValue]> {
        match self {
            MetricData::Matrix(m) => Some(m),
            MetricData::Vector(_) => None,
        }
    }
}

/// Result for one requested expression: either normalized data or the
/// failure message. `metric_name` is set only by batch queries.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    metric_name: String,
    outcome: std::result::Result<MetricData, String>,
}

impl Metric {
    pub fn success(metric_name: impl Into<String>, data: MetricData) -> Self {
        Self {
            metric_name: metric_name.into(),
            outcome: Ok(data),
        }
    }

    /// Failed result. An empty message is replaced so that a failure is
    /// always distinguishable from a success.
    pub fn failure(metric_name: impl Into<String>, error: impl ToString) -> Self {
        let mut error = error.to_string();
        if error.is_empty() {
            error = "unknown error".to_string();
        }
        Self {
            metric_name: metric_name.into(),
            outcome: Err(error),
        }
    }

    /// Tag the result with the expression that produced it.
    pub fn with_name(mut self, metric_name: impl Into<String>) -> Self {
        self.metric_name = metric_name.into();
        self
    }

    pub fn metric_name(&self) -> &str {
        &self.metric_name
    }

    pub fn data(&self) -> Option<&MetricData> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&str> {
        self.outcome.as_ref().err().map(String::as_str)
    }

    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn into_result(self) -> std::result::Result<MetricData, String> {
        self.outcome
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Metric", 3)?;
        s.serialize_field("metricName", &self.metric_name)?;
        s.serialize_field("metricData", &self.data())?;
        s.serialize_field("error", self.error().unwrap_or(""))?;
        s.end()
    }
}
