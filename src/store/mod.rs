//! Onboarding Record Store
//!
//! Abstract persistence for per-employee onboarding records. The workflow
//! operates exclusively through [`RecordStore`], so backends are pluggable:
//! [`MemoryRecordStore`] for tests and local runs, `PgRecordStore` (feature
//! `database`) for production.

use async_trait::async_trait;
use uuid::Uuid;

use crate::state::{OnboardingRecord, SectionStatus, Submission};

mod memory;
#[cfg(feature = "database")]
pub mod postgres;

pub use memory::MemoryRecordStore;

/// Why a conditional write was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// The record already carries a submission
    AlreadySubmitted,
    /// The section's stored status differs from the caller's expectation
    StatusMismatch {
        expected: SectionStatus,
        actual: SectionStatus,
    },
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadySubmitted => write!(f, "record already submitted"),
            Self::StatusMismatch { expected, actual } => {
                write!(f, "expected status {}, found {}", expected, actual)
            }
        }
    }
}

/// Error type for record store operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Write conflict: {0}")]
    Conflict(ConflictKind),

    /// Transient I/O failure; safe to retry
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Durable per-employee onboarding state
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch the record, `None` if the employee has no record yet
    async fn get(&self, user_id: Uuid) -> Result<Option<OnboardingRecord>, StoreError>;

    /// Write one section's result, creating the record if needed.
    ///
    /// Must refuse with [`ConflictKind::AlreadySubmitted`] once the record is
    /// submitted, and with [`ConflictKind::StatusMismatch`] when
    /// `expected_current` is given and differs from the stored status.
    async fn put_section(
        &self,
        user_id: Uuid,
        section_id: &str,
        status: SectionStatus,
        payload: Option<serde_json::Value>,
        expected_current: Option<SectionStatus>,
    ) -> Result<(), StoreError>;

    /// Set the submission only if none is set yet (atomic compare-and-set).
    async fn put_submission(&self, user_id: Uuid, submission: &Submission)
        -> Result<(), StoreError>;
}

#[async_trait]
impl<T: RecordStore + ?Sized> RecordStore for std::sync::Arc<T> {
    async fn get(&self, user_id: Uuid) -> Result<Option<OnboardingRecord>, StoreError> {
        (**self).get(user_id).await
    }

    async fn put_section(
        &self,
        user_id: Uuid,
        section_id: &str,
        status: SectionStatus,
        payload: Option<serde_json::Value>,
        expected_current: Option<SectionStatus>,
    ) -> Result<(), StoreError> {
        (**self)
            .put_section(user_id, section_id, status, payload, expected_current)
            .await
    }

    async fn put_submission(
        &self,
        user_id: Uuid,
        submission: &Submission,
    ) -> Result<(), StoreError> {
        (**self).put_submission(user_id, submission).await
    }
}
