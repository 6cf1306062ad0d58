//! Unlock Resolver
//!
//! A section at ordinal k is unlocked iff every required section with an
//! ordinal below k is complete. Optional sections never gate anything but
//! are gated by the same rule. Pure functions of catalog and record.

use crate::catalog::{validate_ordinals, SectionCatalog, SectionDefinition};
use crate::error::CatalogError;
use crate::state::OnboardingRecord;

/// Whether the section at `ordinal` is accessible.
///
/// Fails fast if the ordinals in `sections` are not unique and contiguous
/// from 1, or if `ordinal` does not name a section.
pub fn is_unlocked(
    sections: &[SectionDefinition],
    ordinal: u32,
    record: &OnboardingRecord,
) -> Result<bool, CatalogError> {
    validate_ordinals(sections)?;
    if ordinal == 0 || ordinal as usize > sections.len() {
        return Err(CatalogError::UnknownOrdinal(ordinal));
    }
    if ordinal == 1 {
        return Ok(true);
    }

    Ok(sections
        .iter()
        .filter(|s| s.ordinal < ordinal && s.required)
        .all(|s| record.status_of(&s.id).is_complete()))
}

/// Unlock flag for every section, in catalog order.
pub fn unlocked_flags(catalog: &SectionCatalog, record: &OnboardingRecord) -> Vec<bool> {
    let mut flags = Vec::with_capacity(catalog.len());
    let mut gate_open = true;

    for section in catalog.iter() {
        flags.push(gate_open);
        if section.required && !record.status_of(&section.id).is_complete() {
            gate_open = false;
        }
    }

    flags
}

/// Earliest incomplete required section before `ordinal`, if any.
pub fn first_blocking_section<'a>(
    catalog: &'a SectionCatalog,
    ordinal: u32,
    record: &OnboardingRecord,
) -> Option<&'a SectionDefinition> {
    catalog
        .iter()
        .take_while(|s| s.ordinal < ordinal)
        .find(|s| s.required && !record.status_of(&s.id).is_complete())
}
