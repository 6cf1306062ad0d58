//! Progress Calculator

use serde::{Deserialize, Serialize};

use crate::catalog::SectionDefinition;
use crate::state::OnboardingRecord;

/// Aggregate completion for dashboards and the wizard header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// Whole-number percentage, 0..=100
    pub percent: u8,
    pub completed_count: usize,
    pub total_count: usize,
    pub required_complete: usize,
    pub required_total: usize,
}

/// Count complete sections (required and optional) against the catalog.
///
/// Only catalog sections are counted; stray ids in the record are ignored.
pub fn compute_progress(sections: &[SectionDefinition], record: &OnboardingRecord) -> Progress {
    let total_count = sections.len();
    let mut completed_count = 0;
    let mut required_complete = 0;
    let mut required_total = 0;

    for section in sections {
        let done = record.status_of(&section.id).is_complete();
        if done {
            completed_count += 1;
        }
        if section.required {
            required_total += 1;
            if done {
                required_complete += 1;
            }
        }
    }

    Progress {
        percent: percent_half_up(completed_count, total_count),
        completed_count,
        total_count,
        required_complete,
        required_total,
    }
}

fn percent_half_up(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    // round(100 * part / whole) with halves rounded up, in integers
    let scaled = (200 * part + whole) / (2 * whole);
    scaled.min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SectionCatalog;
    use crate::state::SectionStatus;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_empty_catalog_is_zero_percent() {
        let record = OnboardingRecord::new(Uuid::new_v4());
        let progress = compute_progress(&[], &record);
        assert_eq!(progress.percent, 0);
        assert_eq!(progress.total_count, 0);
        assert_eq!(progress.completed_count, 0);
    }

    #[test]
    fn test_rounding_half_up() {
        assert_eq!(percent_half_up(1, 3), 33);
        assert_eq!(percent_half_up(2, 3), 67);
        assert_eq!(percent_half_up(1, 8), 13); // 12.5
        assert_eq!(percent_half_up(1, 200), 1); // 0.5
        assert_eq!(percent_half_up(0, 7), 0);
        assert_eq!(percent_half_up(7, 7), 100);
    }

    #[test]
    fn test_counts_optional_sections() {
        let catalog = SectionCatalog::standard();
        let mut record = OnboardingRecord::new(Uuid::new_v4());
        let now = Utc::now();
        record.apply_section_result("personal_info", SectionStatus::Complete, None, now);
        record.apply_section_result("profile_photo", SectionStatus::Complete, None, now);
        record.apply_section_result("benefits", SectionStatus::InProgress, None, now);
        record.apply_section_result("not_in_catalog", SectionStatus::Complete, None, now);

        let progress = compute_progress(catalog.sections(), &record);
        assert_eq!(progress.completed_count, 2);
        assert_eq!(progress.total_count, 10);
        assert_eq!(progress.percent, 20);
        assert_eq!(progress.required_complete, 1);
        assert_eq!(progress.required_total, 8);
    }
}
