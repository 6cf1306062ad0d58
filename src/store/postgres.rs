//! Postgres-backed record store
//!
//! Section writes run in a transaction holding a row lock on the employee's
//! record row. Certification is a single `UPDATE ... WHERE submitted_at IS NULL`,
//! so concurrent submits resolve to exactly one winner.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::{ConflictKind, RecordStore, StoreError};
use crate::state::{OnboardingRecord, SectionState, SectionStatus, SectionTransition, Submission};

const SCHEMA_SQL: &str = include_str!("../../migrations/0001_onboarding_records.sql");

fn unavailable(err: sqlx::Error) -> StoreError {
    tracing::warn!(error = %err, "Onboarding record store query failed");
    StoreError::Unavailable(err.to_string())
}

fn parse_status(raw: &str) -> Result<SectionStatus, StoreError> {
    raw.parse()
        .map_err(|e: String| StoreError::Unavailable(format!("Corrupt section row: {}", e)))
}

type RecordRow = (
    Option<String>,
    Option<DateTime<Utc>>,
    DateTime<Utc>,
    DateTime<Utc>,
);
type SectionRow = (String, String, Option<serde_json::Value>, DateTime<Utc>);
type HistoryRow = (String, String, String, DateTime<Utc>);

pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with a small pool sized for an interactive client backend
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(unavailable)?;
        Ok(Self::new(pool))
    }

    /// Create the onboarding tables if they do not exist
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA_SQL)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn get(&self, user_id: Uuid) -> Result<Option<OnboardingRecord>, StoreError> {
        let row: Option<RecordRow> = sqlx::query_as(
            r#"
            SELECT submission_signature, submitted_at, created_at, updated_at
            FROM onboarding_records
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        let Some((signature, submitted_at, created_at, updated_at)) = row else {
            return Ok(None);
        };

        let section_rows: Vec<SectionRow> = sqlx::query_as(
            r#"
            SELECT section_id, status, payload, updated_at
            FROM onboarding_sections
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        let mut sections = BTreeMap::new();
        for (section_id, status, payload, section_updated_at) in section_rows {
            sections.insert(
                section_id,
                SectionState {
                    status: parse_status(&status)?,
                    payload,
                    updated_at: Some(section_updated_at),
                },
            );
        }

        let history_rows: Vec<HistoryRow> = sqlx::query_as(
            r#"
            SELECT section_id, from_status, to_status, transitioned_at
            FROM onboarding_section_history
            WHERE user_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        let mut history = Vec::with_capacity(history_rows.len());
        for (section_id, from, to, transitioned_at) in history_rows {
            history.push(SectionTransition {
                section_id,
                from_status: parse_status(&from)?,
                to_status: parse_status(&to)?,
                transitioned_at,
            });
        }

        let submission = match (signature, submitted_at) {
            (Some(signature), Some(submitted_at)) => Some(Submission {
                signature,
                submitted_at,
            }),
            _ => None,
        };

        Ok(Some(OnboardingRecord {
            user_id,
            sections,
            submission,
            history,
            created_at,
            updated_at,
        }))
    }

    async fn put_section(
        &self,
        user_id: Uuid,
        section_id: &str,
        status: SectionStatus,
        payload: Option<serde_json::Value>,
        expected_current: Option<SectionStatus>,
    ) -> Result<(), StoreError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(unavailable)?;

        sqlx::query(
            r#"
            INSERT INTO onboarding_records (user_id, created_at, updated_at)
            VALUES ($1, $2, $2)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(unavailable)?;

        let submitted_at: Option<DateTime<Utc>> = sqlx::query_scalar(
            "SELECT submitted_at FROM onboarding_records WHERE user_id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(unavailable)?;

        if submitted_at.is_some() {
            return Err(StoreError::Conflict(ConflictKind::AlreadySubmitted));
        }

        let current: Option<String> = sqlx::query_scalar(
            "SELECT status FROM onboarding_sections WHERE user_id = $1 AND section_id = $2",
        )
        .bind(user_id)
        .bind(section_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(unavailable)?;

        let actual = match current {
            Some(raw) => parse_status(&raw)?,
            None => SectionStatus::NotStarted,
        };
        if let Some(expected) = expected_current {
            if expected != actual {
                return Err(StoreError::Conflict(ConflictKind::StatusMismatch {
                    expected,
                    actual,
                }));
            }
        }

        sqlx::query(
            r#"
            INSERT INTO onboarding_sections (user_id, section_id, status, payload, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, section_id) DO UPDATE
            SET status = EXCLUDED.status,
                payload = COALESCE(EXCLUDED.payload, onboarding_sections.payload),
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user_id)
        .bind(section_id)
        .bind(status.as_str())
        .bind(payload)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(unavailable)?;

        sqlx::query(
            r#"
            INSERT INTO onboarding_section_history
                (user_id, section_id, from_status, to_status, transitioned_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user_id)
        .bind(section_id)
        .bind(actual.as_str())
        .bind(status.as_str())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(unavailable)?;

        sqlx::query("UPDATE onboarding_records SET updated_at = $2 WHERE user_id = $1")
            .bind(user_id)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(unavailable)?;

        tx.commit().await.map_err(unavailable)?;
        Ok(())
    }

    async fn put_submission(
        &self,
        user_id: Uuid,
        submission: &Submission,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO onboarding_records (user_id, created_at, updated_at)
            VALUES ($1, $2, $2)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(submission.submitted_at)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        let result = sqlx::query(
            r#"
            UPDATE onboarding_records
            SET submission_signature = $2,
                submitted_at = $3,
                updated_at = $3
            WHERE user_id = $1 AND submitted_at IS NULL
            "#,
        )
        .bind(user_id)
        .bind(&submission.signature)
        .bind(submission.submitted_at)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict(ConflictKind::AlreadySubmitted));
        }
        Ok(())
    }
}
