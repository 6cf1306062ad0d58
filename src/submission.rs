//! Submission Gate / Certification
//!
//! Readiness checks and construction of the attestation. Persisting the
//! attestation is the controller's job, through the store's conditional
//! write, so a lost race surfaces as `AlreadySubmitted`.

use chrono::{DateTime, Utc};

use crate::catalog::SectionDefinition;
use crate::error::SubmissionError;
use crate::state::{OnboardingRecord, Submission};

/// Ids of required sections that are not complete, in catalog order.
pub fn incomplete_required(
    sections: &[SectionDefinition],
    record: &OnboardingRecord,
) -> Vec<String> {
    let mut ordered: Vec<&SectionDefinition> = sections.iter().filter(|s| s.required).collect();
    ordered.sort_by_key(|s| s.ordinal);
    ordered
        .into_iter()
        .filter(|s| !record.status_of(&s.id).is_complete())
        .map(|s| s.id.clone())
        .collect()
}

/// True iff every required section is complete and nothing was submitted yet.
pub fn can_submit(sections: &[SectionDefinition], record: &OnboardingRecord) -> bool {
    !record.is_submitted()
        && sections
            .iter()
            .filter(|s| s.required)
            .all(|s| record.status_of(&s.id).is_complete())
}

/// Validate preconditions and build the attestation to persist.
pub fn prepare_certification(
    sections: &[SectionDefinition],
    record: &OnboardingRecord,
    signature_text: &str,
    now: DateTime<Utc>,
) -> Result<Submission, SubmissionError> {
    if record.is_submitted() {
        return Err(SubmissionError::AlreadySubmitted);
    }

    let signature = signature_text.trim();
    if signature.is_empty() {
        return Err(SubmissionError::EmptySignature);
    }

    let incomplete = incomplete_required(sections, record);
    if !incomplete.is_empty() {
        return Err(SubmissionError::NotReady { incomplete });
    }

    Ok(Submission {
        signature: signature.to_string(),
        submitted_at: now,
    })
}
