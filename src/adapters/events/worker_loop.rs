//! Job Scheduler worker loop (C8, §4.8) - polls the Artifact Store's job
//! queue, dispatches to a `JobHandler` by `job_type`, and records the
//! outcome. Grounded on the teacher's `OutboxPublisher` poll/shutdown loop,
//! generalized from publishing events to claiming and completing jobs.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;
use tracing::{error, info, instrument, warn};

use crate::domain::foundation::{DomainError, Repository};
use crate::domain::job::Job;
use crate::ports::{JobHandler, JobRepository};

/// Tunables for the worker loop.
#[derive(Debug, Clone)]
pub struct WorkerLoopConfig {
    /// How often to poll for a pending job when none was just claimed.
    pub poll_interval: Duration,
    /// Identifies this worker in `Job.worker_id` and claim-row audit trails.
    pub worker_id: String,
}

impl WorkerLoopConfig {
    pub fn new(worker_id: impl Into<String>) -> Self {
        Self { poll_interval: Duration::from_millis(250), worker_id: worker_id.into() }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Background worker that drives the C8 claim -> dispatch -> complete/fail loop.
pub struct JobWorkerLoop {
    jobs: Arc<dyn JobRepository>,
    handler: Arc<dyn JobHandler>,
    config: WorkerLoopConfig,
}

impl JobWorkerLoop {
    pub fn new(jobs: Arc<dyn JobRepository>, handler: Arc<dyn JobHandler>, config: WorkerLoopConfig) -> Self {
        Self { jobs, handler, config }
    }

    /// Runs until `shutdown` is flipped to `true`, finishing any in-flight
    /// job claim before returning.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), DomainError> {
        let mut interval = time::interval(self.config.poll_interval);

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        self.claim_and_process_one().await?;
                        return Ok(());
                    }
                }
                _ = interval.tick() => {
                    self.claim_and_process_one().await?;
                }
            }
        }
    }

    /// Claims and fully processes at most one job. Returns `false` if the
    /// queue was empty. Exposed separately so tests can drive the loop
    /// deterministically instead of racing a timer.
    pub async fn claim_and_process_one(&self) -> Result<bool, DomainError> {
        let Some(job) = self.jobs.claim_pending(&self.config.worker_id).await? else {
            return Ok(false);
        };
        self.process_claimed(job).await?;
        Ok(true)
    }

    #[instrument(skip(self, job), fields(job_id = %job.id, job_type = ?job.job_type))]
    async fn process_claimed(&self, job: Job) -> Result<(), DomainError> {
        info!("claimed job");
        match self.handler.handle(job.job_type, job.payload.clone()).await {
            Ok(result) => {
                let completed = job.clone().complete(result).map_err(|e| {
                    error!(error = %e, "failed to mark job completed after successful handler run");
                    e
                })?;
                self.jobs.update(&completed).await?;
                info!("job completed");
            }
            Err(e) => {
                warn!(error = %e, "job handler returned an error");
                let failed = job.fail(e.to_string())?;
                self.jobs.update(&failed).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::in_memory_artifact_store::InMemoryJobRepository;
    use crate::domain::job::JobType;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHandler {
        calls: AtomicUsize,
        should_fail: bool,
    }

    #[async_trait]
    impl JobHandler for CountingHandler {
        async fn handle(&self, _job_type: JobType, _payload: serde_json::Value) -> Result<serde_json::Value, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.should_fail {
                Err(DomainError::new(crate::domain::foundation::ErrorCode::InternalError, "boom"))
            } else {
                Ok(json!({"ok": true}))
            }
        }
    }

    #[tokio::test]
    async fn claim_and_process_one_completes_successful_job() {
        let jobs: Arc<dyn JobRepository> = Arc::new(InMemoryJobRepository::new());
        let job = Job::new(JobType::Parse, json!({}));
        jobs.save(&job).await.unwrap();

        let handler = Arc::new(CountingHandler { calls: AtomicUsize::new(0), should_fail: false });
        let worker = JobWorkerLoop::new(jobs.clone(), handler.clone(), WorkerLoopConfig::new("worker-1"));

        let processed = worker.claim_and_process_one().await.unwrap();
        assert!(processed);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);

        let reloaded = jobs.find_by_id(job.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, crate::domain::job::JobStatus::Completed);
    }

    #[tokio::test]
    async fn claim_and_process_one_fails_job_on_handler_error() {
        let jobs: Arc<dyn JobRepository> = Arc::new(InMemoryJobRepository::new());
        let job = Job::new(JobType::Generate, json!({}));
        jobs.save(&job).await.unwrap();

        let handler = Arc::new(CountingHandler { calls: AtomicUsize::new(0), should_fail: true });
        let worker = JobWorkerLoop::new(jobs.clone(), handler, WorkerLoopConfig::new("worker-1"));

        worker.claim_and_process_one().await.unwrap();

        let reloaded = jobs.find_by_id(job.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, crate::domain::job::JobStatus::Failed);
        assert!(reloaded.error.unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn claim_and_process_one_returns_false_when_queue_empty() {
        let jobs: Arc<dyn JobRepository> = Arc::new(InMemoryJobRepository::new());
        let handler = Arc::new(CountingHandler { calls: AtomicUsize::new(0), should_fail: false });
        let worker = JobWorkerLoop::new(jobs, handler, WorkerLoopConfig::new("worker-1"));

        assert!(!worker.claim_and_process_one().await.unwrap());
    }
}
