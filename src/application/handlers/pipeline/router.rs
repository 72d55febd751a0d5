//! Dispatches a claimed job to the handler registered for its `JobType`.
//! The worker loop (C8) only ever drives one `Arc<dyn JobHandler>`; this is
//! that handler, fanning out to `GenerateDocumentHandler` and
//! `RegenerateDocumentHandler`. `Parse` and `Classify` are stages the
//! Pipeline Coordinator runs inline within `run()`, not standalone jobs, so
//! no job of either type is ever enqueued; routing one here is a bug.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::job::JobType;
use crate::ports::JobHandler;

pub struct JobRouter {
    generate: Arc<dyn JobHandler>,
    regenerate: Arc<dyn JobHandler>,
}

impl JobRouter {
    pub fn new(generate: Arc<dyn JobHandler>, regenerate: Arc<dyn JobHandler>) -> Self {
        Self { generate, regenerate }
    }
}

#[async_trait]
impl JobHandler for JobRouter {
    async fn handle(&self, job_type: JobType, payload: Value) -> Result<Value, DomainError> {
        match job_type {
            JobType::Generate => self.generate.handle(job_type, payload).await,
            JobType::Regenerate => self.regenerate.handle(job_type, payload).await,
            JobType::Parse | JobType::Classify => Err(DomainError::new(
                ErrorCode::ValidationFailed,
                format!("no standalone job handler is registered for {job_type:?}"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct StubHandler(JobType);

    #[async_trait]
    impl JobHandler for StubHandler {
        async fn handle(&self, job_type: JobType, _payload: Value) -> Result<Value, DomainError> {
            assert_eq!(job_type, self.0);
            Ok(json!({"handled": true}))
        }
    }

    #[tokio::test]
    async fn routes_generate_and_regenerate_to_their_handlers() {
        let router = JobRouter::new(Arc::new(StubHandler(JobType::Generate)), Arc::new(StubHandler(JobType::Regenerate)));

        let result = router.handle(JobType::Generate, json!({})).await.unwrap();
        assert_eq!(result, json!({"handled": true}));

        let result = router.handle(JobType::Regenerate, json!({})).await.unwrap();
        assert_eq!(result, json!({"handled": true}));
    }

    #[tokio::test]
    async fn rejects_parse_and_classify() {
        let router = JobRouter::new(Arc::new(StubHandler(JobType::Generate)), Arc::new(StubHandler(JobType::Regenerate)));

        assert!(router.handle(JobType::Parse, json!({})).await.is_err());
        assert!(router.handle(JobType::Classify, json!({})).await.is_err());
    }
}
