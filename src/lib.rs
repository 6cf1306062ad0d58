//! Employee Onboarding Workflow
//!
//! Gated multi-section onboarding: an ordered catalog of sections, unlock
//! gating on required predecessors, progress aggregation, and a certified,
//! non-retractable submission step.
//!
//! ## Layering
//!
//! ```text
//! SectionCatalog ─► unlock ─► progress ─► submission ─► WorkflowController
//!                                                            │
//!                                                            ▼
//!                                                       RecordStore
//! ```
//!
//! The controller holds no mutable state of its own. Every operation is a
//! read-modify-write against the [`RecordStore`], which is the single point
//! of truth and provides the compare-and-set used by certification.

pub mod catalog;
pub mod config;
pub mod controller;
pub mod error;
pub mod progress;
pub mod retry;
pub mod state;
pub mod store;
pub mod submission;
pub mod unlock;

pub use catalog::{validate_ordinals, SectionCatalog, SectionDefinition};
pub use config::{OnboardingConfig, RetryConfig};
pub use controller::{OnboardingOverview, SectionView, WorkflowController};
pub use error::{CatalogError, SubmissionError, ValidationError, WorkflowError};
pub use progress::{compute_progress, Progress};
pub use retry::RetryPolicy;
pub use state::{OnboardingRecord, SectionState, SectionStatus, SectionTransition, Submission};
pub use store::{ConflictKind, MemoryRecordStore, RecordStore, StoreError};
pub use submission::{can_submit, incomplete_required, prepare_certification};
pub use unlock::{first_blocking_section, is_unlocked, unlocked_flags};

#[cfg(feature = "database")]
pub use store::postgres::PgRecordStore;
