//! Content Validator (C2) — pure bounds/structural/quality checks on one
//! generated string.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Thresholds a caller configures the validator with. Never a global —
/// constructed once at startup (from `PipelineConfig`) and passed by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorConstraints {
    pub min_length: usize,
    pub max_length: usize,
    pub min_meaningful: usize,
    pub max_repetition_ratio: f64,
    pub custom_structural_patterns: Vec<String>,
}

impl Default for ValidatorConstraints {
    fn default() -> Self {
        Self {
            min_length: 20,
            max_length: 4000,
            min_meaningful: 5,
            max_repetition_ratio: 0.4,
            custom_structural_patterns: Vec::new(),
        }
    }
}

/// A bounds-check failure. All are retryable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundsCode {
    Empty,
    NearEmpty,
    TooShort,
    TooLong,
}

/// A structural-check failure. Never retryable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuralCode {
    HtmlTag,
    MarkdownHeader,
    Emphasis,
    Link,
    CodeSpan,
    HorizontalRule,
    PipeTable,
    ListNumbering,
    CustomPattern,
}

/// A quality-check failure. Never retryable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityCode {
    Repetitive,
    Boilerplate,
    TooFewUniqueWords,
}

/// The overall bucket a failed validation is classified under, used to
/// decide retry eligibility (see `domain::generation::retry`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    BoundsViolation,
    StructuralViolation,
    QualityFailure,
}

/// The combined outcome of running all three sub-checks. Codes within a
/// failed sub-check are deduplicated but not reduced to a single "first
/// match" — callers that need one category call `failure_category()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub bounds_codes: Vec<BoundsCode>,
    pub structural_codes: Vec<StructuralCode>,
    pub quality_codes: Vec<QualityCode>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.bounds_codes.is_empty() && self.structural_codes.is_empty() && self.quality_codes.is_empty()
    }

    /// Precedence when multiple sub-checks fire: structural overrides
    /// bounds, bounds overrides quality.
    pub fn failure_category(&self) -> Option<FailureCategory> {
        if !self.structural_codes.is_empty() {
            Some(FailureCategory::StructuralViolation)
        } else if !self.bounds_codes.is_empty() {
            Some(FailureCategory::BoundsViolation)
        } else if !self.quality_codes.is_empty() {
            Some(FailureCategory::QualityFailure)
        } else {
            None
        }
    }
}

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?[a-zA-Z][^>]*>").unwrap());
static MARKDOWN_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#{1,6}\s").unwrap());
static EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\*\*[^*]+\*\*|__[^_]+__|\*[^*]+\*|_[^_]+_)").unwrap());
static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]+\]\([^)]+\)").unwrap());
static CODE_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"```[\s\S]*?```|`[^`]+`").unwrap());
static HORIZONTAL_RULE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*(-{3,}|_{3,}|\*{3,})\s*$").unwrap());
static PIPE_TABLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*\|.*\|\s*$").unwrap());
static LIST_NUMBERING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*(\d+\.|[a-zA-Z]\))\s+").unwrap());
static BOILERPLATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)lorem ipsum|placeholder|\btodo\b|\[insert[^\]]*\]").unwrap());

fn check_bounds(trimmed: &str, constraints: &ValidatorConstraints) -> Vec<BoundsCode> {
    let len = trimmed.chars().count();
    if len == 0 {
        return vec![BoundsCode::Empty];
    }
    let mut codes = Vec::new();
    if len < constraints.min_meaningful {
        codes.push(BoundsCode::NearEmpty);
    }
    if len < constraints.min_length {
        codes.push(BoundsCode::TooShort);
    }
    if len > constraints.max_length {
        codes.push(BoundsCode::TooLong);
    }
    codes
}

fn check_structural(text: &str, constraints: &ValidatorConstraints) -> Vec<StructuralCode> {
    let mut codes = Vec::new();
    if HTML_TAG.is_match(text) {
        codes.push(StructuralCode::HtmlTag);
    }
    if MARKDOWN_HEADER.is_match(text) {
        codes.push(StructuralCode::MarkdownHeader);
    }
    if EMPHASIS.is_match(text) {
        codes.push(StructuralCode::Emphasis);
    }
    if LINK.is_match(text) {
        codes.push(StructuralCode::Link);
    }
    if CODE_SPAN.is_match(text) {
        codes.push(StructuralCode::CodeSpan);
    }
    if HORIZONTAL_RULE.is_match(text) {
        codes.push(StructuralCode::HorizontalRule);
    }
    if PIPE_TABLE.is_match(text) {
        codes.push(StructuralCode::PipeTable);
    }
    if LIST_NUMBERING.is_match(text) {
        codes.push(StructuralCode::ListNumbering);
    }
    for pattern in &constraints.custom_structural_patterns {
        if let Ok(re) = Regex::new(pattern) {
            if re.is_match(text) {
                codes.push(StructuralCode::CustomPattern);
                break;
            }
        }
    }
    codes
}

fn check_quality(text: &str, constraints: &ValidatorConstraints) -> Vec<QualityCode> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let total = words.len();
    let mut codes = Vec::new();

    if total >= 10 {
        let mut counts = std::collections::HashMap::new();
        for w in &words {
            *counts.entry(w.to_lowercase()).or_insert(0usize) += 1;
        }
        let max_word_count = counts.values().copied().max().unwrap_or(0);
        let ratio = max_word_count as f64 / total as f64;
        if ratio > constraints.max_repetition_ratio {
            codes.push(QualityCode::Repetitive);
        }
    }

    if BOILERPLATE.is_match(text) {
        codes.push(QualityCode::Boilerplate);
    }

    if total >= 5 {
        let unique: std::collections::HashSet<String> = words.iter().map(|w| w.to_lowercase()).collect();
        if unique.len() < constraints.min_meaningful {
            codes.push(QualityCode::TooFewUniqueWords);
        }
    }

    codes
}

/// Runs bounds, then structural, then quality, in that fixed order.
/// Empty content short-circuits: structural/quality are skipped.
pub fn validate(text: &str, constraints: &ValidatorConstraints) -> ValidationResult {
    let trimmed = text.trim();
    let bounds_codes = check_bounds(trimmed, constraints);

    if bounds_codes.contains(&BoundsCode::Empty) {
        return ValidationResult { bounds_codes, ..Default::default() };
    }

    let structural_codes = check_structural(trimmed, constraints);
    let quality_codes = check_quality(trimmed, constraints);

    ValidationResult { bounds_codes, structural_codes, quality_codes }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraints() -> ValidatorConstraints {
        ValidatorConstraints {
            min_length: 20,
            max_length: 100,
            min_meaningful: 5,
            max_repetition_ratio: 0.4,
            custom_structural_patterns: vec![],
        }
    }

    #[test]
    fn plain_valid_text_passes() {
        let text = "This engagement letter confirms the scope of professional services to be rendered this quarter.";
        let result = validate(text, &constraints());
        assert!(result.is_valid());
        assert_eq!(result.failure_category(), None);
    }

    #[test]
    fn empty_content_short_circuits() {
        let result = validate("   ", &constraints());
        assert_eq!(result.bounds_codes, vec![BoundsCode::Empty]);
        assert!(result.structural_codes.is_empty());
        assert!(result.quality_codes.is_empty());
        assert_eq!(result.failure_category(), Some(FailureCategory::BoundsViolation));
    }

    #[test]
    fn too_long_is_bounds_violation() {
        let text = "word ".repeat(50);
        let result = validate(&text, &constraints());
        assert!(result.bounds_codes.contains(&BoundsCode::TooLong));
        assert_eq!(result.failure_category(), Some(FailureCategory::BoundsViolation));
    }

    #[test]
    fn markdown_header_is_structural_and_not_retryable_category() {
        let text = "# Header\nThis is the body text that follows the heading line.";
        let result = validate(text, &constraints());
        assert!(result.structural_codes.contains(&StructuralCode::MarkdownHeader));
        assert_eq!(result.failure_category(), Some(FailureCategory::StructuralViolation));
    }

    #[test]
    fn pipe_table_is_structural() {
        let text = "Intro paragraph text here that is long enough to pass bounds checks.\n| a | b |\n| c | d |";
        let result = validate(text, &constraints());
        assert!(result.structural_codes.contains(&StructuralCode::PipeTable));
    }

    #[test]
    fn boilerplate_is_quality_failure() {
        let text = "Lorem ipsum dolor sit amet this is placeholder text used in many templates repeatedly.";
        let result = validate(text, &constraints());
        assert!(result.quality_codes.contains(&QualityCode::Boilerplate));
        assert_eq!(result.failure_category(), Some(FailureCategory::QualityFailure));
    }

    #[test]
    fn highly_repetitive_text_is_quality_failure() {
        let text = "same same same same same same same same same same word word";
        let result = validate(text, &constraints());
        assert!(result.quality_codes.contains(&QualityCode::Repetitive));
    }

    #[test]
    fn structural_takes_precedence_over_quality_when_both_fire() {
        let text = "# Header\nlorem ipsum lorem ipsum lorem ipsum lorem ipsum lorem ipsum text.";
        let result = validate(text, &constraints());
        assert!(!result.structural_codes.is_empty());
        assert!(!result.quality_codes.is_empty());
        assert_eq!(result.failure_category(), Some(FailureCategory::StructuralViolation));
    }
}

#[cfg(test)]
mod laws {
    use super::*;
    use crate::domain::generation::retry::FailureType;
    use proptest::prelude::*;

    const VOCAB: &[&str] = &[
        "engagement", "letter", "confirms", "scope", "professional", "services", "rendered",
        "quarter", "client", "agreement", "billing", "schedule", "deliverables", "timeline",
        "review", "signature", "counsel", "retainer", "invoice", "amendment",
    ];

    fn generous_constraints() -> ValidatorConstraints {
        ValidatorConstraints { min_length: 20, max_length: 1000, min_meaningful: 5, max_repetition_ratio: 0.4, custom_structural_patterns: vec![] }
    }

    fn plain_prose(word_count: usize) -> String {
        (0..word_count).map(|i| VOCAB[i % VOCAB.len()]).collect::<Vec<_>>().join(" ") + "."
    }

    proptest! {
        #[test]
        fn plain_prose_within_bounds_always_passes(word_count in 8usize..40) {
            let text = plain_prose(word_count);
            let result = validate(&text, &generous_constraints());
            prop_assert!(result.is_valid());
            prop_assert_eq!(result.failure_category(), None);
        }

        #[test]
        fn any_structural_marker_makes_otherwise_valid_text_a_non_retryable_structural_violation(
            marker in prop_oneof![
                Just("<b>emphasis</b>"),
                Just("# Heading"),
                Just("---"),
                Just("| a | b |"),
                Just("[a link](https://example.com)"),
                Just("`inline code`"),
            ],
        ) {
            let text = format!("{}\n{marker}\n{}", plain_prose(10), plain_prose(10));
            let result = validate(&text, &generous_constraints());
            prop_assert!(!result.structural_codes.is_empty());
            prop_assert_eq!(result.failure_category(), Some(FailureCategory::StructuralViolation));
            prop_assert!(!FailureType::from(result.failure_category().unwrap()).is_retry_eligible());
        }

        #[test]
        fn exceeding_max_length_is_a_retry_eligible_bounds_violation(extra_words in 50usize..100) {
            let constraints = ValidatorConstraints { max_length: 100, ..generous_constraints() };
            let text = plain_prose(extra_words);
            prop_assume!(text.chars().count() > constraints.max_length);
            let result = validate(&text, &constraints);
            prop_assert!(result.bounds_codes.contains(&BoundsCode::TooLong));
            prop_assert_eq!(result.failure_category(), Some(FailureCategory::BoundsViolation));
            prop_assert!(FailureType::from(result.failure_category().unwrap()).is_retry_eligible());
        }
    }
}
