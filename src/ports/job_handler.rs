//! Port the Job Scheduler's worker loop (C8) dispatches through — implemented
//! by the Pipeline Coordinator (C9) at the application layer.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::foundation::DomainError;
use crate::domain::job::JobType;

/// Executes one job's payload and returns its result value, or an error
/// carrying the failure that should be recorded on the job row.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, job_type: JobType, payload: Value) -> Result<Value, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_handler_is_object_safe() {
        fn check<T: JobHandler + ?Sized>() {}
        check::<dyn JobHandler>();
    }
}
