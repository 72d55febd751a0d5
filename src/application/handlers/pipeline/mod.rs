//! Pipeline Coordinator (C9, §4.9) and the thin `JobHandler`s that dispatch
//! into it from the Job Scheduler (C8).

mod coordinator;
mod generate_document;
mod regenerate_document;
mod router;

pub use coordinator::{PipelineCoordinator, ReusedOutput, RunOutcome, RunRequest};
pub use generate_document::GenerateDocumentHandler;
pub use regenerate_document::RegenerateDocumentHandler;
pub use router::JobRouter;
