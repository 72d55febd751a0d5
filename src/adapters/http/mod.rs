//! HTTP adapters - REST API implementation.
//!
//! The pipeline edge is the only HTTP surface (§6): regeneration,
//! rendering, and the demo fixtures. Nested under `/api` by `main`.

pub mod pipeline;

pub use pipeline::{pipeline_routes, PipelineAppState};
