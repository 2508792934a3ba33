//! promfacade client library entry.
//!
//! This crate wires a time-series backend (the `Backend` trait, with a
//! Prometheus HTTP implementation) to the single-query and concurrent
//! batch-query entry points of `MetricsClient`. It is consumed by the probe
//! binary (`main.rs`), by upstream request handlers, and by integration tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod backend;
pub mod batch;
pub mod config;
pub mod http;
pub mod obs;
pub mod query;

pub use backend::{Backend, Range};
pub use http::PrometheusHttp;
pub use query::{MetricsClient, QueryKind};
