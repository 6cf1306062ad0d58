//! Workflow Controller
//!
//! Façade called by the presentation layer. Holds only immutable
//! configuration; each operation is a read-modify-write against the record
//! store, wrapped in the retry policy. Gating is enforced here, not just in
//! the UI: a locked section cannot be written even by a direct call.

use chrono::{SubsecRound, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::catalog::{SectionCatalog, SectionDefinition};
use crate::config::OnboardingConfig;
use crate::error::{SubmissionError, ValidationError, WorkflowError};
use crate::progress::{compute_progress, Progress};
use crate::retry::RetryPolicy;
use crate::state::{OnboardingRecord, SectionStatus, Submission};
use crate::store::{ConflictKind, RecordStore, StoreError};
use crate::submission::{can_submit, incomplete_required, prepare_certification};
use crate::unlock::{first_blocking_section, is_unlocked, unlocked_flags};

/// One row of the wizard's section list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionView {
    pub definition: SectionDefinition,
    pub status: SectionStatus,
    pub unlocked: bool,
}

/// Everything the wizard header and review screen need in one read
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OnboardingOverview {
    pub user_id: Uuid,
    pub sections: Vec<SectionView>,
    pub progress: Progress,
    pub can_submit: bool,
    pub incomplete_required: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission: Option<Submission>,
}

/// The onboarding workflow over a record store
pub struct WorkflowController<S> {
    store: S,
    catalog: Arc<SectionCatalog>,
    retry: RetryPolicy,
}

impl<S: RecordStore> WorkflowController<S> {
    pub fn new(store: S, catalog: SectionCatalog) -> Self {
        Self {
            store,
            catalog: Arc::new(catalog),
            retry: RetryPolicy::default(),
        }
    }

    pub fn from_config(store: S, config: &OnboardingConfig) -> Self {
        Self::new(store, config.catalog()).with_retry_policy(config.retry_policy())
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn catalog(&self) -> &SectionCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetch the record, or an empty one for a first-time employee
    async fn fetch(&self, user_id: Uuid) -> Result<OnboardingRecord, StoreError> {
        let record = self.retry.run("get", || self.store.get(user_id)).await?;
        Ok(record.unwrap_or_else(|| OnboardingRecord::new(user_id)))
    }

    fn views_for(&self, record: &OnboardingRecord) -> Vec<SectionView> {
        let flags = unlocked_flags(&self.catalog, record);
        self.catalog
            .iter()
            .zip(flags)
            .map(|(definition, unlocked)| SectionView {
                definition: definition.clone(),
                status: record.status_of(&definition.id),
                unlocked,
            })
            .collect()
    }

    /// Current onboarding state for an employee
    #[instrument(skip(self))]
    pub async fn load_status(&self, user_id: Uuid) -> Result<OnboardingRecord, WorkflowError> {
        Ok(self.fetch(user_id).await?)
    }

    /// Catalog sections with their status and unlock flag, in ordinal order
    #[instrument(skip(self))]
    pub async fn section_view(&self, user_id: Uuid) -> Result<Vec<SectionView>, WorkflowError> {
        let record = self.fetch(user_id).await?;
        Ok(self.views_for(&record))
    }

    #[instrument(skip(self))]
    pub async fn progress(&self, user_id: Uuid) -> Result<Progress, WorkflowError> {
        let record = self.fetch(user_id).await?;
        Ok(compute_progress(self.catalog.sections(), &record))
    }

    #[instrument(skip(self))]
    pub async fn overview(&self, user_id: Uuid) -> Result<OnboardingOverview, WorkflowError> {
        let record = self.fetch(user_id).await?;
        let sections = self.catalog.sections();

        Ok(OnboardingOverview {
            user_id,
            sections: self.views_for(&record),
            progress: compute_progress(sections, &record),
            can_submit: can_submit(sections, &record),
            incomplete_required: incomplete_required(sections, &record),
            submission: record.submission,
        })
    }

    /// Record the outcome of a section's sub-form.
    ///
    /// Rejected when the record is submitted, the section is unknown or
    /// locked, or the status change is not an allowed transition.
    #[instrument(skip(self, payload))]
    pub async fn record_section_result(
        &self,
        user_id: Uuid,
        section_id: &str,
        new_status: SectionStatus,
        payload: Option<serde_json::Value>,
    ) -> Result<OnboardingRecord, WorkflowError> {
        let record = self.fetch(user_id).await?;

        if record.is_submitted() {
            return Err(ValidationError::RecordSubmitted.into());
        }

        let definition = self
            .catalog
            .get(section_id)
            .ok_or_else(|| ValidationError::UnknownSection(section_id.to_string()))?;

        if !is_unlocked(self.catalog.sections(), definition.ordinal, &record)? {
            let blocked_by = first_blocking_section(&self.catalog, definition.ordinal, &record)
                .map(|s| s.id.clone())
                .unwrap_or_default();
            tracing::info!(
                user_id = %user_id,
                section_id,
                blocked_by = %blocked_by,
                "Rejected write to locked section"
            );
            return Err(ValidationError::SectionLocked {
                section_id: section_id.to_string(),
                blocked_by,
            }
            .into());
        }

        let current = record.status_of(section_id);
        if !current.can_transition_to(new_status) {
            return Err(ValidationError::InvalidTransition {
                from: current,
                to: new_status,
            }
            .into());
        }

        let write = self
            .retry
            .run("put_section", || {
                self.store.put_section(
                    user_id,
                    section_id,
                    new_status,
                    payload.clone(),
                    Some(current),
                )
            })
            .await;

        match write {
            Ok(()) => {}
            // A retried write whose first attempt landed sees its own result
            Err(StoreError::Conflict(ConflictKind::StatusMismatch { actual, .. }))
                if actual == new_status =>
            {
                tracing::debug!(section_id, "Section write already applied");
            }
            Err(err) => return Err(err.into()),
        }

        if current == SectionStatus::Complete && new_status == SectionStatus::InProgress {
            tracing::info!(user_id = %user_id, section_id, "Section reopened");
        } else {
            tracing::debug!(
                user_id = %user_id,
                section_id,
                from = %current,
                to = %new_status,
                "Recorded section result"
            );
        }

        Ok(self.fetch(user_id).await?)
    }

    /// Certify and finalize the record.
    ///
    /// The store write is conditional, so of two racing submits exactly one
    /// succeeds and the other gets `AlreadySubmitted`.
    #[instrument(skip(self, signature_text))]
    pub async fn submit(
        &self,
        user_id: Uuid,
        signature_text: &str,
    ) -> Result<OnboardingRecord, SubmissionError> {
        let mut record = self.fetch(user_id).await?;

        // Postgres keeps microseconds; truncate so the stored value compares equal
        let now = Utc::now().trunc_subsecs(6);
        let submission = prepare_certification(self.catalog.sections(), &record, signature_text, now)
            .inspect_err(|err| {
                tracing::info!(user_id = %user_id, error = %err, "Submission refused");
            })?;

        let write = self
            .retry
            .run("put_submission", || {
                self.store.put_submission(user_id, &submission)
            })
            .await;

        match write {
            Ok(()) => {}
            Err(StoreError::Conflict(_)) => {
                // Our own earlier attempt may have landed with its ack lost
                let stored = self.fetch(user_id).await?;
                if stored.submission.as_ref() != Some(&submission) {
                    tracing::info!(user_id = %user_id, "Submission lost race, already submitted");
                    return Err(SubmissionError::AlreadySubmitted);
                }
                record = stored;
            }
            Err(err) => return Err(err.into()),
        }

        tracing::info!(
            user_id = %user_id,
            submitted_at = %submission.submitted_at,
            "Onboarding record certified"
        );

        record.updated_at = submission.submitted_at;
        record.submission = Some(submission);
        Ok(record)
    }
}
