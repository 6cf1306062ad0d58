//! Error taxonomy for the onboarding workflow.
//!
//! Every failure mode is a distinct variant so callers can pick user-facing
//! copy without string matching. Only store unavailability is retryable.

use crate::state::SectionStatus;
use crate::store::{ConflictKind, StoreError};

/// Catalog configuration errors (ordinals, ids).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("Duplicate section ordinal: {0}")]
    DuplicateOrdinal(u32),

    #[error("Section ordinals must be contiguous from 1: expected {expected}, found {found}")]
    OrdinalGap { expected: u32, found: u32 },

    #[error("Duplicate section id: {0}")]
    DuplicateId(String),

    #[error("Section at ordinal {0} has an empty id")]
    EmptyId(u32),

    #[error("No section with ordinal {0}")]
    UnknownOrdinal(u32),
}

/// A mutation the workflow does not permit in the record's current state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Section '{section_id}' is locked until '{blocked_by}' is complete")]
    SectionLocked {
        section_id: String,
        blocked_by: String,
    },

    #[error("Onboarding record has been submitted and is read-only")]
    RecordSubmitted,

    #[error("Unknown section: {0}")]
    UnknownSection(String),

    #[error("Section cannot move from {from} to {to}")]
    InvalidTransition {
        from: SectionStatus,
        to: SectionStatus,
    },

    #[error("Section changed concurrently: expected {expected}, found {actual}")]
    StaleSection {
        expected: SectionStatus,
        actual: SectionStatus,
    },
}

impl From<ConflictKind> for ValidationError {
    fn from(kind: ConflictKind) -> Self {
        match kind {
            ConflictKind::AlreadySubmitted => ValidationError::RecordSubmitted,
            ConflictKind::StatusMismatch { expected, actual } => {
                ValidationError::StaleSection { expected, actual }
            }
        }
    }
}

/// Errors from the certification step.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("Required sections incomplete: {}", .incomplete.join(", "))]
    NotReady { incomplete: Vec<String> },

    #[error("Signature text is empty")]
    EmptySignature,

    #[error("Onboarding record already submitted")]
    AlreadySubmitted,

    #[error("Record store unavailable: {0}")]
    StoreUnavailable(String),
}

impl SubmissionError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

impl From<StoreError> for SubmissionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(_) => SubmissionError::AlreadySubmitted,
            StoreError::Unavailable(msg) => SubmissionError::StoreUnavailable(msg),
        }
    }
}

/// Errors from the non-submission controller operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Record store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Catalog configuration error: {0}")]
    Catalog(#[from] CatalogError),
}

impl WorkflowError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(kind) => WorkflowError::Validation(kind.into()),
            StoreError::Unavailable(msg) => WorkflowError::StoreUnavailable(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_store_unavailable_is_retryable() {
        assert!(WorkflowError::StoreUnavailable("timeout".into()).is_retryable());
        assert!(!WorkflowError::Validation(ValidationError::RecordSubmitted).is_retryable());
        assert!(SubmissionError::StoreUnavailable("down".into()).is_retryable());
        assert!(!SubmissionError::AlreadySubmitted.is_retryable());
        assert!(!SubmissionError::EmptySignature.is_retryable());
        assert!(!SubmissionError::NotReady { incomplete: vec![] }.is_retryable());
    }

    #[test]
    fn test_store_conflict_mapping() {
        let err: WorkflowError = StoreError::Conflict(ConflictKind::AlreadySubmitted).into();
        assert_eq!(err, WorkflowError::Validation(ValidationError::RecordSubmitted));

        let err: SubmissionError = StoreError::Conflict(ConflictKind::AlreadySubmitted).into();
        assert_eq!(err, SubmissionError::AlreadySubmitted);
    }

    #[test]
    fn test_not_ready_lists_sections() {
        let err = SubmissionError::NotReady {
            incomplete: vec!["w4".into(), "i9".into()],
        };
        assert_eq!(err.to_string(), "Required sections incomplete: w4, i9");
    }
}
