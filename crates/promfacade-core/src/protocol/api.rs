//! HTTP API response envelope (JSON).
//!
//! `data.result` is kept as `RawValue` until `resultType` is known, then
//! parsed into the matching shape.

use serde::Deserialize;
use serde_json::value::RawValue;

use crate::error::{PromFacadeError, Result};
use crate::protocol::value::{LabelSet, Sample, SamplePair, SampleStream, Value};

/// Decoded successful response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub value: Value,
    pub warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    status: String,
    #[serde(default)]
    data: Option<ResultData>,
    #[serde(default, rename = "errorType")]
    error_type: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ResultData {
    #[serde(rename = "resultType")]
    result_type: String,
    result: Box<RawValue>,
}

/// `[<unix seconds>, "<value>"]`
type WirePair = (f64, String);

#[derive(Debug, Deserialize)]
struct WireSample {
    #[serde(default)]
    metric: LabelSet,
    value: WirePair,
}

#[derive(Debug, Deserialize)]
struct WireStream {
    #[serde(default)]
    metric: LabelSet,
    #[serde(default)]
    values: Vec<WirePair>,
}

/// Decode a query / query_range response body.
pub fn decode_response(body: &[u8]) -> Result<ApiResponse> {
    let env: Envelope = serde_json::from_slice(body)
        .map_err(|e| PromFacadeError::Decode(format!("invalid response json: {e}")))?;

    if env.status != "success" {
        return Err(PromFacadeError::Backend {
            error_type: env.error_type.unwrap_or_else(|| "unknown".into()),
            message: env.error.unwrap_or_else(|| format!("status {}", env.status)),
        });
    }

    let data = env
        .data
        .ok_or_else(|| PromFacadeError::Decode("success response without data".into()))?;

    Ok(ApiResponse {
        value: decode_result(&data.result_type, data.result.get())?,
        warnings: env.warnings,
    })
}

fn decode_result(result_type: &str, raw: &str) -> Result<Value> {
    match result_type {
        "vector" => {
            let wire: Vec<WireSample> = parse(raw, "vector")?;
            let samples = wire
                .into_iter()
                .map(|s| {
                    Ok(Sample {
                        metric: s.metric,
                        value: pair(&s.value)?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::Vector(samples))
        }
        "matrix" => {
            let wire: Vec<WireStream> = parse(raw, "matrix")?;
            let streams = wire
                .into_iter()
                .map(|s| {
                    let values = s.values.iter().map(pair).collect::<Result<Vec<_>>>()?;
                    Ok(SampleStream {
                        metric: s.metric,
                        values,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::Matrix(streams))
        }
        "scalar" => {
            let wire: WirePair = parse(raw, "scalar")?;
            Ok(Value::Scalar(pair(&wire)?))
        }
        "string" => {
            let (ts, value): WirePair = parse(raw, "string")?;
            Ok(Value::String {
                timestamp_ms: seconds_to_millis(ts),
                value,
            })
        }
        other => Err(PromFacadeError::Decode(format!(
            "unknown resultType: {other}"
        ))),
    }
}

fn parse<'a, T: Deserialize<'a>>(raw: &'a str, what: &str) -> Result<T> {
    serde_json::from_str(raw)
        .map_err(|e| PromFacadeError::Decode(format!("invalid {what} result: {e}")))
}

fn pair((ts, value): &WirePair) -> Result<SamplePair> {
    Ok(SamplePair::new(seconds_to_millis(*ts), parse_sample_value(value)?))
}

/// Wire timestamps are fractional seconds; the model keeps milliseconds.
pub fn seconds_to_millis(secs: f64) -> i64 {
    (secs * 1000.0).round() as i64
}

/// Sample values travel as strings so that NaN and infinities survive JSON.
pub fn parse_sample_value(s: &str) -> Result<f64> {
    match s {
        "NaN" => Ok(f64::NAN),
        "+Inf" | "Inf" => Ok(f64::INFINITY),
        "-Inf" => Ok(f64::NEG_INFINITY),
        _ => s
            .parse::<f64>()
            .map_err(|e| PromFacadeError::Decode(format!("invalid sample value {s:?}: {e}"))),
    }
}
