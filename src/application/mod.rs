//! Application layer - handlers that orchestrate domain operations and
//! coordinate between ports.

pub mod handlers;

pub use handlers::{DemoIds, DemoSeeder, GenerateDocumentHandler, JobRouter, PipelineCoordinator, RegenerateDocumentHandler, ReusedOutput, RunOutcome, RunRequest};
