//! Generation domain — Content Validator (C2), Section Generator (C3) and
//! Batch Executor (C4) value objects and aggregates.

pub mod input_batch;
pub mod output_batch;
pub mod prompt;
pub mod retry;
pub mod validator;

pub use input_batch::{BatchStatus, GenerationInput, GenerationInputBatch};
pub use output_batch::{OutputBatchStatus, OutputStatus, SectionOutput, SectionOutputBatch};
pub use prompt::{assemble_prompt, input_hash, PromptInputs};
pub use retry::{FailureType, RetryAttempt, RetryPolicy};
pub use validator::{validate, BoundsCode, FailureCategory, QualityCode, StructuralCode, ValidationResult, ValidatorConstraints};
