//! Backend protocol modules.
//!
//! - `value`: the backend's native result model (vector / matrix / scalar / string).
//! - `api`: decoding of the HTTP API JSON envelope into that model.
//!
//! Decoders never panic: malformed payloads are reported as
//! `PromFacadeError::Decode` and backend-side failures as
//! `PromFacadeError::Backend`.

pub mod api;
pub mod value;
