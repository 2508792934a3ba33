//! Backend-native result values.
//!
//! Timestamps are kept in the backend's own unit (milliseconds since epoch);
//! conversion to seconds happens in the normalizer.

use std::collections::BTreeMap;

/// Label name -> label value identifying one series.
pub type LabelSet = BTreeMap<String, String>;

/// One raw sample with a millisecond timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePair {
    pub timestamp_ms: i64,
    pub value: f64,
}

impl SamplePair {
    pub fn new(timestamp_ms: i64, value: f64) -> Self {
        Self {
            timestamp_ms,
            value,
        }
    }
}

/// Element of an instant vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub metric: LabelSet,
    pub value: SamplePair,
}

/// Element of a range matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleStream {
    pub metric: LabelSet,
    pub values: Vec<SamplePair>,
}

/// Result value of a backend query.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Vector(Vec<Sample>),
    Matrix(Vec<SampleStream>),
    Scalar(SamplePair),
    String { timestamp_ms: i64, value: String },
}

/// Shape tag of a `Value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Vector,
    Matrix,
    Scalar,
    String,
}

impl ValueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Vector => "vector",
            ValueKind::Matrix => "matrix",
            ValueKind::Scalar => "scalar",
            ValueKind::String => "string",
        }
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Vector(_) => ValueKind::Vector,
            Value::Matrix(_) => ValueKind::Matrix,
            Value::Scalar(_) => ValueKind::Scalar,
            Value::String { .. } => ValueKind::String,
        }
    }
}
