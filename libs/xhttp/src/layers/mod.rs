//! Tower layers for the per-request transport stack
//!
//! ## Available Layers
//!
//! - [`RequestTraceLayer`] - Wraps each outbound request in a `tracing` span

mod trace;

pub use trace::{RequestTraceLayer, RequestTraceService};
