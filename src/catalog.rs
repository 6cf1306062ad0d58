//! Section Catalog
//!
//! Immutable, ordered definition of the onboarding sections. A catalog is
//! built once (from the built-in table or configuration) and passed
//! explicitly to the resolver, calculator, and controller.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::CatalogError;

/// One step of the onboarding workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionDefinition {
    /// Position in the sequence, 1..N
    pub ordinal: u32,
    /// Stable identifier (e.g., "direct_deposit")
    pub id: String,
    /// Display title
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Must be complete before later sections unlock and before submission
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl SectionDefinition {
    pub fn new(ordinal: u32, id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            ordinal,
            id: id.into(),
            title: title.into(),
            description: String::new(),
            required: true,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Check that ordinals are unique and contiguous from 1.
///
/// Order of the input slice does not matter.
pub fn validate_ordinals(sections: &[SectionDefinition]) -> Result<(), CatalogError> {
    let mut ordinals: Vec<u32> = sections.iter().map(|s| s.ordinal).collect();
    ordinals.sort_unstable();

    for (idx, ordinal) in ordinals.iter().enumerate() {
        let expected = idx as u32 + 1;
        if *ordinal == expected {
            continue;
        }
        if idx > 0 && ordinals[idx - 1] == *ordinal {
            return Err(CatalogError::DuplicateOrdinal(*ordinal));
        }
        return Err(CatalogError::OrdinalGap {
            expected,
            found: *ordinal,
        });
    }

    Ok(())
}

/// Validated, ordinal-sorted set of sections
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SectionCatalog {
    sections: Vec<SectionDefinition>,
}

impl SectionCatalog {
    pub fn new(mut sections: Vec<SectionDefinition>) -> Result<Self, CatalogError> {
        validate_ordinals(&sections)?;

        let mut seen = HashSet::new();
        for section in &sections {
            if section.id.trim().is_empty() {
                return Err(CatalogError::EmptyId(section.ordinal));
            }
            if !seen.insert(section.id.as_str()) {
                return Err(CatalogError::DuplicateId(section.id.clone()));
            }
        }

        sections.sort_by_key(|s| s.ordinal);
        Ok(Self { sections })
    }

    /// The built-in employee onboarding catalog
    pub fn standard() -> Self {
        let sections = vec![
            SectionDefinition::new(1, "personal_info", "Personal Information")
                .with_description("Legal name, address, date of birth, and contact details"),
            SectionDefinition::new(2, "emergency_contacts", "Emergency Contacts")
                .with_description("People to contact in an emergency"),
            SectionDefinition::new(3, "w4_federal", "Federal Tax Withholding (W-4)")
                .with_description("Filing status, dependents, and extra withholding"),
            SectionDefinition::new(4, "state_withholding", "State Tax Withholding")
                .with_description("State-specific withholding allowances"),
            SectionDefinition::new(5, "direct_deposit", "Direct Deposit")
                .with_description("Bank accounts and pay distribution"),
            SectionDefinition::new(6, "i9_eligibility", "Employment Eligibility (I-9)")
                .with_description("Citizenship attestation and identity documents"),
            SectionDefinition::new(7, "benefits", "Benefits Enrollment")
                .with_description("Medical, dental, vision, and retirement elections"),
            SectionDefinition::new(8, "policy_acknowledgment", "Policy Acknowledgment")
                .with_description("Handbook and workplace policy acknowledgments"),
            SectionDefinition::new(9, "eeo_self_id", "Voluntary Self-Identification")
                .with_description("Equal employment opportunity survey")
                .optional(),
            SectionDefinition::new(10, "profile_photo", "Profile Photo")
                .with_description("Photo for the employee directory")
                .optional(),
        ];

        Self { sections }
    }

    pub fn empty() -> Self {
        Self {
            sections: Vec::new(),
        }
    }

    pub fn sections(&self) -> &[SectionDefinition] {
        &self.sections
    }

    pub fn iter(&self) -> impl Iterator<Item = &SectionDefinition> {
        self.sections.iter()
    }

    pub fn get(&self, id: &str) -> Option<&SectionDefinition> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn by_ordinal(&self, ordinal: u32) -> Option<&SectionDefinition> {
        // Sorted and contiguous from 1
        ordinal
            .checked_sub(1)
            .and_then(|idx| self.sections.get(idx as usize))
    }

    pub fn required(&self) -> impl Iterator<Item = &SectionDefinition> {
        self.sections.iter().filter(|s| s.required)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

impl<'de> Deserialize<'de> for SectionCatalog {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let sections = Vec::<SectionDefinition>::deserialize(deserializer)?;
        SectionCatalog::new(sections).map_err(serde::de::Error::custom)
    }
}
