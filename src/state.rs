//! Onboarding State Types
//!
//! Per-employee record: one [`SectionState`] per catalog section, an optional
//! certification, and an audit trail of section transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Status of a single onboarding section
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    #[default]
    NotStarted,
    InProgress,
    Complete,
}

impl SectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Complete => "complete",
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }

    /// Whether a recorded result may move a section from `self` to `to`.
    ///
    /// Forward moves and same-status rewrites are allowed, as is the explicit
    /// reopen edge `complete -> in_progress`. Nothing returns to `not_started`.
    pub fn can_transition_to(&self, to: SectionStatus) -> bool {
        match (self, to) {
            (_, Self::NotStarted) => *self == Self::NotStarted,
            (Self::NotStarted, _) => true,
            (Self::InProgress, _) => true,
            (Self::Complete, Self::InProgress | Self::Complete) => true,
        }
    }
}

impl std::fmt::Display for SectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SectionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(Self::NotStarted),
            "in_progress" => Ok(Self::InProgress),
            "complete" => Ok(Self::Complete),
            _ => Err(format!("Unknown section status: {}", s)),
        }
    }
}

/// Stored state of one section for one employee
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionState {
    pub status: SectionStatus,
    /// Answers captured by the section's sub-form; opaque to the workflow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    /// When the last result was recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Certification captured at submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// Attestation text as typed by the employee (trimmed)
    pub signature: String,
    pub submitted_at: DateTime<Utc>,
}

/// Record of an accepted section write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionTransition {
    pub section_id: String,
    pub from_status: SectionStatus,
    pub to_status: SectionStatus,
    pub transitioned_at: DateTime<Utc>,
}

/// One employee's onboarding record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnboardingRecord {
    pub user_id: Uuid,

    /// Section id -> state. Missing entries read as `not_started`.
    #[serde(default)]
    pub sections: BTreeMap<String, SectionState>,

    /// Present once the record is certified; the record is then read-only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission: Option<Submission>,

    #[serde(default)]
    pub history: Vec<SectionTransition>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OnboardingRecord {
    /// Empty record for an employee seen for the first time
    pub fn new(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            sections: BTreeMap::new(),
            submission: None,
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status_of(&self, section_id: &str) -> SectionStatus {
        self.sections
            .get(section_id)
            .map(|s| s.status)
            .unwrap_or_default()
    }

    pub fn section(&self, section_id: &str) -> Option<&SectionState> {
        self.sections.get(section_id)
    }

    pub fn is_submitted(&self) -> bool {
        self.submission.is_some()
    }

    /// Apply an accepted section write and log the transition.
    ///
    /// Callers (stores) are responsible for checking that the record is not
    /// submitted before applying.
    pub fn apply_section_result(
        &mut self,
        section_id: &str,
        status: SectionStatus,
        payload: Option<serde_json::Value>,
        at: DateTime<Utc>,
    ) {
        let from_status = self.status_of(section_id);
        let entry = self.sections.entry(section_id.to_string()).or_default();
        entry.status = status;
        if payload.is_some() {
            entry.payload = payload;
        }
        entry.updated_at = Some(at);

        self.history.push(SectionTransition {
            section_id: section_id.to_string(),
            from_status,
            to_status: status,
            transitioned_at: at,
        });
        self.updated_at = at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_section_defaults_to_not_started() {
        let record = OnboardingRecord::new(Uuid::new_v4());
        assert_eq!(record.status_of("w4"), SectionStatus::NotStarted);
        assert!(!record.is_submitted());
    }

    #[test]
    fn test_transition_rules() {
        use SectionStatus::*;

        assert!(NotStarted.can_transition_to(InProgress));
        assert!(NotStarted.can_transition_to(Complete));
        assert!(InProgress.can_transition_to(Complete));
        assert!(Complete.can_transition_to(InProgress));
        assert!(Complete.can_transition_to(Complete));
        assert!(NotStarted.can_transition_to(NotStarted));

        assert!(!InProgress.can_transition_to(NotStarted));
        assert!(!Complete.can_transition_to(NotStarted));
    }

    #[test]
    fn test_apply_section_result_records_history() {
        let mut record = OnboardingRecord::new(Uuid::new_v4());
        let now = Utc::now();

        record.apply_section_result(
            "personal_info",
            SectionStatus::InProgress,
            Some(serde_json::json!({"first_name": "Jane"})),
            now,
        );
        record.apply_section_result("personal_info", SectionStatus::Complete, None, now);

        let state = record.section("personal_info").unwrap();
        assert_eq!(state.status, SectionStatus::Complete);
        // A result without payload keeps the earlier answers
        assert_eq!(state.payload, Some(serde_json::json!({"first_name": "Jane"})));

        assert_eq!(record.history.len(), 2);
        assert_eq!(record.history[0].from_status, SectionStatus::NotStarted);
        assert_eq!(record.history[1].from_status, SectionStatus::InProgress);
        assert_eq!(record.history[1].to_status, SectionStatus::Complete);
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            SectionStatus::NotStarted,
            SectionStatus::InProgress,
            SectionStatus::Complete,
        ] {
            assert_eq!(status.as_str().parse::<SectionStatus>(), Ok(status));
        }
        assert!("done".parse::<SectionStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&SectionStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }
}
