//! Response normalizer: backend `Value` -> `MetricData`.
//!
//! Rules:
//! - A value whose shape does not match the query kind yields an empty
//!   result (and a warning), never an error.
//! - A series rejected by the label filter is skipped entirely.
//! - Labels are copied verbatim. Timestamps go from milliseconds to seconds.
//! - Range points keep the backend's order.

use crate::model::{MatrixValue, MetricData, MetricType, Point, VectorValue};
use crate::protocol::value::{LabelSet, SamplePair, Value};

/// Predicate over a series' label set. `false` drops the series.
pub type LabelFilter = dyn Fn(&LabelSet) -> bool + Send + Sync;

/// Normalize the result of an instant query (expects a vector).
pub fn normalize_instant(value: &Value, filter: Option<&LabelFilter>) -> MetricData {
    let Value::Vector(samples) = value else {
        warn_mismatch(MetricType::Vector, value);
        return MetricData::empty(MetricType::Vector);
    };

    let values = samples
        .iter()
        .filter(|s| keep(filter, &s.metric))
        .map(|s| VectorValue {
            metadata: s.metric.clone(),
            sample: to_point(&s.value),
        })
        .collect();

    MetricData::Vector(values)
}

/// Normalize the result of a ranged query (expects a matrix).
pub fn normalize_range(value: &Value, filter: Option<&LabelFilter>) -> MetricData {
    let Value::Matrix(streams) = value else {
        warn_mismatch(MetricType::Matrix, value);
        return MetricData::empty(MetricType::Matrix);
    };

    let values = streams
        .iter()
        .filter(|s| keep(filter, &s.metric))
        .map(|s| MatrixValue {
            metadata: s.metric.clone(),
            series: s.values.iter().map(to_point).collect(),
        })
        .collect();

    MetricData::Matrix(values)
}

/// Whether `value` has the shape `expected` normalizes from.
pub fn shape_matches(expected: MetricType, value: &Value) -> bool {
    matches!(
        (expected, value),
        (MetricType::Vector, Value::Vector(_)) | (MetricType::Matrix, Value::Matrix(_))
    )
}

fn keep(filter: Option<&LabelFilter>, labels: &LabelSet) -> bool {
    filter.map_or(true, |f| f(labels))
}

fn to_point(p: &SamplePair) -> Point {
    Point::new(p.timestamp_ms as f64 / 1000.0, p.value)
}

fn warn_mismatch(expected: MetricType, value: &Value) {
    tracing::warn!(
        expected = expected.as_str(),
        actual = value.kind().as_str(),
        "backend result shape mismatch; treating as empty"
    );
}
