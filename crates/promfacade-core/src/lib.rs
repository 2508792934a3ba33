//! promfacade core: the normalized metric model, the backend's wire value
//! model, and the normalizer that maps one onto the other.
//!
//! This crate carries no runtime or transport dependencies. The async
//! backend seam, the HTTP client and the concurrent batch engine live in
//! `promfacade-client`.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here.
//! Malformed backend payloads surface as `PromFacadeError`, and shape
//! anomalies are normalized to empty results instead of failing.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod model;
pub mod normalize;
pub mod protocol;

/// Shared result type.
pub use error::{PromFacadeError, Result};
pub use model::{MatrixValue, Metric, MetricData, MetricType, Point, VectorValue};
