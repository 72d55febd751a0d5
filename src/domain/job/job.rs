//! `Job` — a unit of work dispatched by the Job Scheduler (C8).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::{DomainError, ErrorCode, JobId, StateMachine, Timestamp};

/// What kind of pipeline work a job dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    Parse,
    Classify,
    Generate,
    Regenerate,
}

/// Lifecycle of a `Job`. No transition skips a state; attempts raise
/// `invalid_transition`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl StateMachine for JobStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use JobStatus::*;
        matches!((self, target), (Pending, Running) | (Running, Completed) | (Running, Failed))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use JobStatus::*;
        match self {
            Pending => vec![Running],
            Running => vec![Completed, Failed],
            Completed | Failed => vec![],
        }
    }
}

/// A durable unit of work. `payload` is opaque to the scheduler — only the
/// handler the Pipeline Coordinator dispatches to by `job_type` interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub job_type: JobType,
    pub status: JobStatus,
    pub payload: Value,
    pub result: Option<Value>,
    pub error: Option<String>,
    pub worker_id: Option<String>,
    pub created_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
}

impl Job {
    pub fn new(job_type: JobType, payload: Value) -> Self {
        Self {
            id: JobId::new(),
            job_type,
            status: JobStatus::Pending,
            payload,
            result: None,
            error: None,
            worker_id: None,
            created_at: Timestamp::now(),
            started_at: None,
            completed_at: None,
        }
    }

    fn guard_transition(&self, target: JobStatus) -> Result<(), DomainError> {
        self.status
            .transition_to(target)
            .map_err(|e| DomainError::new(ErrorCode::InvalidTransition, e.to_string()))?;
        Ok(())
    }

    /// The single point where race-free single-assignment is established:
    /// the Artifact Store wraps this call in a row-locked transaction so
    /// concurrent claimants never receive the same job (see C8, C1).
    pub fn claim(mut self, worker_id: impl Into<String>) -> Result<Self, DomainError> {
        self.guard_transition(JobStatus::Running)?;
        self.status = JobStatus::Running;
        self.worker_id = Some(worker_id.into());
        self.started_at = Some(Timestamp::now());
        Ok(self)
    }

    pub fn complete(mut self, result: Value) -> Result<Self, DomainError> {
        self.guard_transition(JobStatus::Completed)?;
        self.status = JobStatus::Completed;
        self.result = Some(result);
        self.completed_at = Some(Timestamp::now());
        Ok(self)
    }

    pub fn fail(mut self, error: impl Into<String>) -> Result<Self, DomainError> {
        self.guard_transition(JobStatus::Failed)?;
        self.status = JobStatus::Failed;
        self.error = Some(error.into());
        self.completed_at = Some(Timestamp::now());
        Ok(self)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, JobStatus::Completed | JobStatus::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn claiming_sets_worker_and_started_at() {
        let job = Job::new(JobType::Generate, json!({"document_id": "d1"})).claim("worker-1").unwrap();
        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(job.worker_id.as_deref(), Some("worker-1"));
        assert!(job.started_at.is_some());
    }

    #[test]
    fn completing_requires_running_first() {
        let job = Job::new(JobType::Parse, json!({}));
        let err = job.complete(json!({})).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);
    }

    #[test]
    fn terminal_states_cannot_transition_again() {
        let job = Job::new(JobType::Classify, json!({})).claim("w").unwrap().fail("boom").unwrap();
        assert!(job.is_terminal());
        let err = job.claim("w2").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);
    }
}
