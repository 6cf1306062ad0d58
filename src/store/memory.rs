//! In-memory record store
//!
//! All checks run under the write lock, so `put_submission` is a true
//! compare-and-set. Fault injection hooks exist to exercise retry paths.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ConflictKind, RecordStore, StoreError};
use crate::state::{OnboardingRecord, SectionStatus, Submission};

#[derive(Default)]
pub struct MemoryRecordStore {
    records: Arc<RwLock<HashMap<Uuid, OnboardingRecord>>>,
    /// Calls to fail before touching state
    fail_before: AtomicU32,
    /// Writes to apply but report as failed (lost acknowledgement)
    fail_after_write: AtomicU32,
    latency: Option<Duration>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call, for exercising caller timeouts
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail the next `n` calls with `Unavailable` without touching state
    pub fn fail_next(&self, n: u32) {
        self.fail_before.store(n, Ordering::SeqCst);
    }

    /// Apply the next `n` writes but report them as `Unavailable`
    pub fn drop_next_acks(&self, n: u32) {
        self.fail_after_write.store(n, Ordering::SeqCst);
    }

    /// Seed or replace a record directly
    pub async fn insert(&self, record: OnboardingRecord) {
        self.records.write().await.insert(record.user_id, record);
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    async fn before_call(&self) -> Result<(), StoreError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if take_one(&self.fail_before) {
            return Err(StoreError::Unavailable("injected failure".into()));
        }
        Ok(())
    }

    fn after_write(&self) -> Result<(), StoreError> {
        if take_one(&self.fail_after_write) {
            return Err(StoreError::Unavailable("acknowledgement lost".into()));
        }
        Ok(())
    }
}

fn take_one(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get(&self, user_id: Uuid) -> Result<Option<OnboardingRecord>, StoreError> {
        self.before_call().await?;
        let records = self.records.read().await;
        Ok(records.get(&user_id).cloned())
    }

    async fn put_section(
        &self,
        user_id: Uuid,
        section_id: &str,
        status: SectionStatus,
        payload: Option<serde_json::Value>,
        expected_current: Option<SectionStatus>,
    ) -> Result<(), StoreError> {
        self.before_call().await?;
        {
            let mut records = self.records.write().await;
            let record = records
                .entry(user_id)
                .or_insert_with(|| OnboardingRecord::new(user_id));

            if record.is_submitted() {
                return Err(StoreError::Conflict(ConflictKind::AlreadySubmitted));
            }
            if let Some(expected) = expected_current {
                let actual = record.status_of(section_id);
                if actual != expected {
                    return Err(StoreError::Conflict(ConflictKind::StatusMismatch {
                        expected,
                        actual,
                    }));
                }
            }

            record.apply_section_result(section_id, status, payload, Utc::now());
        }
        self.after_write()
    }

    async fn put_submission(
        &self,
        user_id: Uuid,
        submission: &Submission,
    ) -> Result<(), StoreError> {
        self.before_call().await?;
        {
            let mut records = self.records.write().await;
            let record = records
                .entry(user_id)
                .or_insert_with(|| OnboardingRecord::new(user_id));

            if record.is_submitted() {
                return Err(StoreError::Conflict(ConflictKind::AlreadySubmitted));
            }
            record.submission = Some(submission.clone());
            record.updated_at = submission.submitted_at;
        }
        self.after_write()
    }
}
