use std::path::Path;

use onboarding_workflow::{MemoryRecordStore, OnboardingConfig, SectionCatalog, WorkflowController};
use uuid::Uuid;

fn shipped_config() -> OnboardingConfig {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/onboarding.yaml");
    OnboardingConfig::load_from_file(&path).unwrap()
}

#[test]
fn test_shipped_config_matches_standard_catalog() {
    let config = shipped_config();
    assert_eq!(config.catalog(), SectionCatalog::standard());
    assert_eq!(config.retry_policy().max_attempts, 3);
}

#[tokio::test]
async fn test_controller_from_shipped_config() {
    let controller = WorkflowController::from_config(MemoryRecordStore::new(), &shipped_config());
    let view = controller.section_view(Uuid::new_v4()).await.unwrap();

    assert_eq!(view.len(), 10);
    assert!(view[0].unlocked);
    assert!(view.iter().skip(1).all(|v| !v.unlocked));
}
