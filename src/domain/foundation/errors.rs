//! Error types for the domain layer.
//!
//! `ErrorCode` enumerates every failure code named across the component
//! designs; `ErrorCategory` and `ErrorSeverity` are orthogonal to the code
//! (a given code always maps to the same category/severity/recovery hint,
//! but callers reason about category and severity independently of which
//! exact code fired). `DomainError` is the single error type threaded
//! through every fallible operation in the pipeline.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: i64,
        max: i64,
        actual: i64,
    },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an out of range validation error.
    pub fn out_of_range(field: impl Into<String>, min: i64, max: i64, actual: i64) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min,
            max,
            actual,
        }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Error codes produced anywhere in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // ---- Content Validator (C2) ----
    EmptyContent,
    NearEmptyContent,
    TooShort,
    TooLong,
    StructuralViolation,
    QualityFailure,

    // ---- Section Generator (C3) / retry ----
    GenerationFailure,
    RetryExhausted,
    MissingInput,

    // ---- Batch Executor (C4) ----
    BatchNotValidated,
    DuplicateOutputBatch,
    UnexpectedError,

    // ---- Assembler (C5) ----
    MissingValidatedContent,
    AssemblyInconsistent,

    // ---- Renderer (C6) ----
    RenderFailed,
    PersistenceFailed,
    InvalidDocument,

    // ---- Regeneration Planner (C7) ----
    StaticSectionError,
    TemplateVersionMismatch,

    // ---- Job Scheduler (C8) ----
    InvalidTransition,
    JobNotFound,

    // ---- Artifact Store (C1) / general persistence ----
    ImmutabilityViolation,
    NotFound,
    AlreadyExists,
    AlreadyRendered,
    DocumentNotImmutable,

    // ---- Word codec / object store / model endpoint (§6) ----
    EmptyFile,
    InvalidFormat,
    CorruptedFile,
    FileTooLarge,
    MissingContent,
    ModelUnavailable,
    ModelTimeout,

    // ---- Cross-cutting ----
    ValidationFailed,
    DatabaseError,
    ConfigurationError,
    InternalError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::EmptyContent => "EMPTY_CONTENT",
            ErrorCode::NearEmptyContent => "NEAR_EMPTY_CONTENT",
            ErrorCode::TooShort => "TOO_SHORT",
            ErrorCode::TooLong => "TOO_LONG",
            ErrorCode::StructuralViolation => "STRUCTURAL_VIOLATION",
            ErrorCode::QualityFailure => "QUALITY_FAILURE",
            ErrorCode::GenerationFailure => "GENERATION_FAILURE",
            ErrorCode::RetryExhausted => "RETRY_EXHAUSTED",
            ErrorCode::MissingInput => "MISSING_INPUT",
            ErrorCode::BatchNotValidated => "BATCH_NOT_VALIDATED",
            ErrorCode::DuplicateOutputBatch => "DUPLICATE_OUTPUT_BATCH",
            ErrorCode::UnexpectedError => "UNEXPECTED_ERROR",
            ErrorCode::MissingValidatedContent => "MISSING_VALIDATED_CONTENT",
            ErrorCode::AssemblyInconsistent => "ASSEMBLY_INCONSISTENT",
            ErrorCode::RenderFailed => "RENDER_FAILED",
            ErrorCode::PersistenceFailed => "PERSISTENCE_FAILED",
            ErrorCode::InvalidDocument => "INVALID_DOCUMENT",
            ErrorCode::StaticSectionError => "STATIC_SECTION_ERROR",
            ErrorCode::TemplateVersionMismatch => "TEMPLATE_VERSION_MISMATCH",
            ErrorCode::InvalidTransition => "INVALID_TRANSITION",
            ErrorCode::JobNotFound => "JOB_NOT_FOUND",
            ErrorCode::ImmutabilityViolation => "IMMUTABILITY_VIOLATION",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::AlreadyExists => "ALREADY_EXISTS",
            ErrorCode::AlreadyRendered => "ALREADY_RENDERED",
            ErrorCode::DocumentNotImmutable => "DOCUMENT_NOT_IMMUTABLE",
            ErrorCode::EmptyFile => "EMPTY_FILE",
            ErrorCode::InvalidFormat => "INVALID_FORMAT",
            ErrorCode::CorruptedFile => "CORRUPTED_FILE",
            ErrorCode::FileTooLarge => "FILE_TOO_LARGE",
            ErrorCode::MissingContent => "MISSING_CONTENT",
            ErrorCode::ModelUnavailable => "MODEL_UNAVAILABLE",
            ErrorCode::ModelTimeout => "MODEL_TIMEOUT",
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::ConfigurationError => "CONFIGURATION_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// High-level grouping of an error's origin, orthogonal to its exact code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Validation,
    Parsing,
    Classification,
    Generation,
    Assembly,
    Rendering,
    Versioning,
    Regeneration,
    Infrastructure,
    Configuration,
    Unknown,
}

/// How urgently an error should be surfaced, orthogonal to its exact code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// What a caller (or operator) should do in response to this error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecoveryHint {
    Retry,
    Skip,
    Manual,
    Rollback,
    Restart,
    ContactSupport,
    None,
}

impl ErrorCode {
    /// The category this code belongs to.
    pub fn category(&self) -> ErrorCategory {
        use ErrorCode::*;
        match self {
            EmptyContent | NearEmptyContent | TooShort | TooLong | StructuralViolation
            | QualityFailure | ValidationFailed => ErrorCategory::Validation,
            EmptyFile | InvalidFormat | CorruptedFile | FileTooLarge | MissingContent => {
                ErrorCategory::Parsing
            }
            MissingInput => ErrorCategory::Classification,
            GenerationFailure | RetryExhausted | BatchNotValidated | DuplicateOutputBatch
            | UnexpectedError | ModelUnavailable | ModelTimeout => ErrorCategory::Generation,
            MissingValidatedContent | AssemblyInconsistent => ErrorCategory::Assembly,
            RenderFailed | PersistenceFailed | InvalidDocument => ErrorCategory::Rendering,
            AlreadyRendered | DocumentNotImmutable => ErrorCategory::Versioning,
            StaticSectionError | TemplateVersionMismatch => ErrorCategory::Regeneration,
            InvalidTransition | JobNotFound | ImmutabilityViolation | NotFound | AlreadyExists
            | DatabaseError => ErrorCategory::Infrastructure,
            ConfigurationError => ErrorCategory::Configuration,
            InternalError => ErrorCategory::Unknown,
        }
    }

    /// The severity this code carries.
    pub fn severity(&self) -> ErrorSeverity {
        use ErrorCode::*;
        match self {
            EmptyContent | NearEmptyContent | TooShort | TooLong => ErrorSeverity::Low,
            StructuralViolation | QualityFailure | GenerationFailure | ValidationFailed
            | DuplicateOutputBatch | AlreadyRendered | JobNotFound | NotFound | AlreadyExists => {
                ErrorSeverity::Medium
            }
            RetryExhausted | BatchNotValidated | MissingInput | MissingValidatedContent
            | AssemblyInconsistent | RenderFailed | StaticSectionError
            | TemplateVersionMismatch | InvalidTransition | DocumentNotImmutable
            | ModelUnavailable | ModelTimeout | EmptyFile | InvalidFormat | CorruptedFile
            | FileTooLarge | MissingContent => ErrorSeverity::High,
            ImmutabilityViolation | PersistenceFailed | InvalidDocument | DatabaseError
            | ConfigurationError | UnexpectedError | InternalError => ErrorSeverity::Critical,
        }
    }

    /// What the caller should do about this error.
    pub fn recovery_hint(&self) -> RecoveryHint {
        use ErrorCode::*;
        match self {
            EmptyContent | NearEmptyContent | TooShort | TooLong | GenerationFailure
            | ModelUnavailable | ModelTimeout => RecoveryHint::Retry,
            StructuralViolation | QualityFailure | MissingInput => RecoveryHint::Skip,
            RetryExhausted | MissingValidatedContent | StaticSectionError
            | TemplateVersionMismatch | AlreadyRendered | DocumentNotImmutable
            | InvalidTransition | BatchNotValidated | DuplicateOutputBatch | NotFound
            | AlreadyExists | JobNotFound | EmptyFile | InvalidFormat | CorruptedFile
            | FileTooLarge | MissingContent | ValidationFailed => RecoveryHint::Manual,
            AssemblyInconsistent | RenderFailed | InvalidDocument => RecoveryHint::Rollback,
            ImmutabilityViolation | UnexpectedError | InternalError => RecoveryHint::ContactSupport,
            DatabaseError => RecoveryHint::Restart,
            ConfigurationError => RecoveryHint::None,
        }
    }

    /// True if this code is in the retry-eligible set defined by the
    /// Section Generator's retry policy (§4.3): `generation_failure` and
    /// the retryable `bounds_violation` outcomes (empty/near-empty/too
    /// short/too long all surface here — see the validator, C2).
    pub fn is_retry_eligible(&self) -> bool {
        matches!(
            self,
            ErrorCode::GenerationFailure
                | ErrorCode::EmptyContent
                | ErrorCode::NearEmptyContent
                | ErrorCode::TooShort
                | ErrorCode::TooLong
        )
    }
}

/// Standard domain error with code, category/severity/hint, message, and details.
#[derive(Debug, Clone)]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, String>,
}

impl DomainError {
    /// Creates a new domain error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    /// Creates a validation error for a specific field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message).with_detail("field", field.into())
    }

    /// Adds a detail to the error.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// The error's category, derived from its code.
    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    /// The error's severity, derived from its code.
    pub fn severity(&self) -> ErrorSeverity {
        self.code.severity()
    }

    /// The recommended recovery action, derived from its code.
    pub fn recovery_hint(&self) -> RecoveryHint {
        self.code.recovery_hint()
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for DomainError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_empty_field_displays_correctly() {
        let err = ValidationError::empty_field("structural_path");
        assert_eq!(format!("{}", err), "Field 'structural_path' cannot be empty");
    }

    #[test]
    fn validation_error_out_of_range_displays_correctly() {
        let err = ValidationError::out_of_range("max_retries", 0, 10, 15);
        assert_eq!(
            format!("{}", err),
            "Field 'max_retries' must be between 0 and 10, got 15"
        );
    }

    #[test]
    fn domain_error_displays_code_and_message() {
        let err = DomainError::new(ErrorCode::NotFound, "document not found");
        assert_eq!(format!("{}", err), "[NOT_FOUND] document not found");
    }

    #[test]
    fn domain_error_with_detail_adds_detail() {
        let err = DomainError::new(ErrorCode::ValidationFailed, "bad input")
            .with_detail("field", "client_data")
            .with_detail("reason", "missing key");

        assert_eq!(err.details.get("field"), Some(&"client_data".to_string()));
        assert_eq!(err.details.get("reason"), Some(&"missing key".to_string()));
    }

    #[test]
    fn immutability_violation_is_critical_and_contact_support() {
        let code = ErrorCode::ImmutabilityViolation;
        assert_eq!(code.severity(), ErrorSeverity::Critical);
        assert_eq!(code.recovery_hint(), RecoveryHint::ContactSupport);
        assert_eq!(code.category(), ErrorCategory::Infrastructure);
    }

    #[test]
    fn structural_violation_is_not_retry_eligible() {
        assert!(!ErrorCode::StructuralViolation.is_retry_eligible());
        assert!(!ErrorCode::QualityFailure.is_retry_eligible());
    }

    #[test]
    fn bounds_and_generation_failures_are_retry_eligible() {
        assert!(ErrorCode::GenerationFailure.is_retry_eligible());
        assert!(ErrorCode::TooLong.is_retry_eligible());
        assert!(ErrorCode::EmptyContent.is_retry_eligible());
    }

    #[test]
    fn retry_exhausted_is_not_retry_eligible() {
        assert!(!ErrorCode::RetryExhausted.is_retry_eligible());
    }

    #[test]
    fn error_code_display_formats_correctly() {
        assert_eq!(format!("{}", ErrorCode::StaticSectionError), "STATIC_SECTION_ERROR");
        assert_eq!(format!("{}", ErrorCode::InternalError), "INTERNAL_ERROR");
    }
}
