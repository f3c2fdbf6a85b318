//! Postbox daemon library
//!
//! Exposed for integration tests; the binary lives in `main.rs`.

pub mod config;
pub mod node;
pub mod state;
