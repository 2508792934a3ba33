//! Top-level facade crate for promfacade.
//!
//! Re-exports the core model and the query client so users can depend on a single crate.

pub mod core {
    pub use promfacade_core::*;
}

pub mod client {
    pub use promfacade_client::*;
}
