//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod demo;
pub mod pipeline;

pub use demo::{DemoIds, DemoSeeder};
pub use pipeline::{GenerateDocumentHandler, JobRouter, PipelineCoordinator, RegenerateDocumentHandler, ReusedOutput, RunOutcome, RunRequest};
