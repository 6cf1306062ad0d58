//! Onboarding configuration loaded from YAML
//!
//! The catalog is immutable configuration: it is loaded once at start-up and
//! handed to the controller. When no `sections` are configured the built-in
//! standard catalog applies.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::catalog::SectionCatalog;
use crate::retry::RetryPolicy;

/// Root configuration loaded from YAML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OnboardingConfig {
    /// Section catalog; validated on load
    #[serde(default)]
    pub sections: Option<SectionCatalog>,

    #[serde(default)]
    pub retry: RetryConfig,
}

/// Record store retry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub timeout_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 2_000,
            timeout_ms: 5_000,
        }
    }
}

impl OnboardingConfig {
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Parsing onboarding config")
    }

    /// Load from a YAML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
        let config: OnboardingConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Parsing {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            sections = config.catalog().len(),
            "Loaded onboarding config"
        );
        Ok(config)
    }

    /// Configured catalog, or the standard one
    pub fn catalog(&self) -> SectionCatalog {
        self.sections.clone().unwrap_or_else(SectionCatalog::standard)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.retry)
    }
}
