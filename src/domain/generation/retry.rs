//! Retry policy for Section Generator (C3): eligibility, backoff, and the
//! per-attempt history appended to a `SectionOutput`.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;
use crate::domain::generation::validator::FailureCategory;

/// The final bucket a section's terminal failure is recorded under.
/// Distinct from `FailureCategory`: this adds the two cases the validator
/// itself can't produce (`generation_failure` from the model, and
/// `retry_exhaustion` once an eligible type runs out of attempts).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureType {
    BoundsViolation,
    StructuralViolation,
    QualityFailure,
    GenerationFailure,
    RetryExhaustion,
    MissingInput,
    UnexpectedError,
}

impl From<FailureCategory> for FailureType {
    fn from(category: FailureCategory) -> Self {
        match category {
            FailureCategory::BoundsViolation => FailureType::BoundsViolation,
            FailureCategory::StructuralViolation => FailureType::StructuralViolation,
            FailureCategory::QualityFailure => FailureType::QualityFailure,
        }
    }
}

impl FailureType {
    /// `eligible_failure_types = {generation_failure, bounds_violation}`.
    pub fn is_retry_eligible(&self) -> bool {
        matches!(self, FailureType::GenerationFailure | FailureType::BoundsViolation)
    }
}

/// One failed attempt, appended to a `SectionOutput.retry_history` before
/// looping back to prompt assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryAttempt {
    pub attempt_number: u32,
    pub error_code: FailureType,
    pub error_message: String,
    pub timestamp: Timestamp,
}

impl RetryAttempt {
    pub fn new(attempt_number: u32, error_code: FailureType, error_message: impl Into<String>) -> Self {
        Self {
            attempt_number,
            error_code,
            error_message: error_message.into(),
            timestamp: Timestamp::now(),
        }
    }
}

/// Bounds retry behavior for C3. Constructed once from `PipelineConfig` and
/// passed by value — never a global.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 3 }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    /// `delay(attempt) = min(2^attempt, 16)`, in seconds. Design-level only:
    /// test doubles observe this value without actually sleeping.
    pub fn delay_seconds(&self, attempt: u32) -> u64 {
        2u64.saturating_pow(attempt).min(16)
    }

    pub fn should_retry(&self, failure_type: FailureType, retry_count: u32) -> bool {
        failure_type.is_retry_eligible() && retry_count < self.max_retries
    }
}
