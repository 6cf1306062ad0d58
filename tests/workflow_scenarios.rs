//! End-to-end workflow scenarios against the in-memory record store.
//!
//! Run with: cargo test --test workflow_scenarios

use std::sync::Arc;

use onboarding_workflow::{
    MemoryRecordStore, RecordStore, SectionCatalog, SectionDefinition, SectionStatus,
    SectionView, SubmissionError, ValidationError, WorkflowController, WorkflowError,
};
use uuid::Uuid;

/// #1 required, #2 required, #3 optional
fn three_section_catalog() -> SectionCatalog {
    SectionCatalog::new(vec![
        SectionDefinition::new(1, "personal_info", "Personal Information"),
        SectionDefinition::new(2, "w4_federal", "Federal Tax Withholding (W-4)"),
        SectionDefinition::new(3, "profile_photo", "Profile Photo").optional(),
    ])
    .unwrap()
}

fn unlocked(view: &[SectionView]) -> Vec<bool> {
    view.iter().map(|v| v.unlocked).collect()
}

#[tokio::test]
async fn test_three_section_walkthrough() {
    let controller = WorkflowController::new(MemoryRecordStore::new(), three_section_catalog());
    let user = Uuid::new_v4();

    // Initial state: only #1 unlocked, 0%
    let view = controller.section_view(user).await.unwrap();
    assert_eq!(unlocked(&view), vec![true, false, false]);
    assert_eq!(controller.progress(user).await.unwrap().percent, 0);

    // #1 complete: #2 unlocks, #3 still waits on #2
    controller
        .record_section_result(user, "personal_info", SectionStatus::Complete, None)
        .await
        .unwrap();
    let view = controller.section_view(user).await.unwrap();
    assert_eq!(unlocked(&view), vec![true, true, false]);
    assert_eq!(controller.progress(user).await.unwrap().percent, 33);

    // #2 complete: #3 unlocks, ready to submit without the optional section
    controller
        .record_section_result(user, "w4_federal", SectionStatus::Complete, None)
        .await
        .unwrap();
    let view = controller.section_view(user).await.unwrap();
    assert_eq!(unlocked(&view), vec![true, true, true]);
    let overview = controller.overview(user).await.unwrap();
    assert_eq!(overview.progress.percent, 67);
    assert!(overview.can_submit);

    let record = controller.submit(user, "Jane Doe").await.unwrap();
    let submission = record.submission.clone().unwrap();
    assert_eq!(submission.signature, "Jane Doe");

    let err = controller.submit(user, "Jane Doe").await.unwrap_err();
    assert_eq!(err, SubmissionError::AlreadySubmitted);
}

#[tokio::test]
async fn test_locked_section_write_leaves_state_unchanged() {
    let controller = WorkflowController::new(MemoryRecordStore::new(), three_section_catalog());
    let user = Uuid::new_v4();

    controller
        .record_section_result(user, "personal_info", SectionStatus::Complete, None)
        .await
        .unwrap();
    let before = controller.load_status(user).await.unwrap();

    let err = controller
        .record_section_result(
            user,
            "profile_photo",
            SectionStatus::Complete,
            Some(serde_json::json!({"photo_ref": "blob://1"})),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Validation(ValidationError::SectionLocked { ref blocked_by, .. })
            if blocked_by == "w4_federal"
    ));
    assert!(!err.is_retryable());

    let after = controller.load_status(user).await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_section_view_reflects_recorded_result() {
    let controller = WorkflowController::new(MemoryRecordStore::new(), SectionCatalog::standard());
    let user = Uuid::new_v4();

    for id in ["personal_info", "emergency_contacts", "w4_federal"] {
        controller
            .record_section_result(user, id, SectionStatus::Complete, None)
            .await
            .unwrap();

        let view = controller.section_view(user).await.unwrap();
        let row = view.iter().find(|v| v.definition.id == id).unwrap();
        assert_eq!(row.status, SectionStatus::Complete);

        let next = view
            .iter()
            .find(|v| v.definition.ordinal == row.definition.ordinal + 1)
            .unwrap();
        assert!(next.unlocked);
        assert!(view
            .iter()
            .filter(|v| v.definition.ordinal > row.definition.ordinal + 1)
            .all(|v| !v.unlocked));
    }
}

#[tokio::test]
async fn test_submit_requires_required_sections() {
    let controller = WorkflowController::new(MemoryRecordStore::new(), three_section_catalog());
    let user = Uuid::new_v4();

    controller
        .record_section_result(user, "personal_info", SectionStatus::Complete, None)
        .await
        .unwrap();

    let err = controller.submit(user, "Jane Doe").await.unwrap_err();
    assert_eq!(
        err,
        SubmissionError::NotReady {
            incomplete: vec!["w4_federal".to_string()]
        }
    );

    controller
        .record_section_result(user, "w4_federal", SectionStatus::Complete, None)
        .await
        .unwrap();
    let err = controller.submit(user, "   ").await.unwrap_err();
    assert_eq!(err, SubmissionError::EmptySignature);

    // Neither failure left an attestation behind
    assert!(!controller.load_status(user).await.unwrap().is_submitted());
}

#[tokio::test]
async fn test_repeated_submit_keeps_first_attestation() {
    let controller = WorkflowController::new(MemoryRecordStore::new(), three_section_catalog());
    let user = Uuid::new_v4();
    for id in ["personal_info", "w4_federal"] {
        controller
            .record_section_result(user, id, SectionStatus::Complete, None)
            .await
            .unwrap();
    }

    let first = controller
        .submit(user, "Jane Doe")
        .await
        .unwrap()
        .submission
        .unwrap();

    for signature in ["Jane Doe", "J. Doe", ""] {
        let err = controller.submit(user, signature).await.unwrap_err();
        assert_eq!(err, SubmissionError::AlreadySubmitted);
    }

    let stored = controller.load_status(user).await.unwrap();
    assert_eq!(stored.submission, Some(first));
}

#[tokio::test]
async fn test_submitted_record_is_read_only() {
    let controller = WorkflowController::new(MemoryRecordStore::new(), three_section_catalog());
    let user = Uuid::new_v4();
    for id in ["personal_info", "w4_federal"] {
        controller
            .record_section_result(user, id, SectionStatus::Complete, None)
            .await
            .unwrap();
    }
    controller.submit(user, "Jane Doe").await.unwrap();

    for (id, status) in [
        ("profile_photo", SectionStatus::Complete),
        ("personal_info", SectionStatus::InProgress),
    ] {
        let err = controller
            .record_section_result(user, id, status, None)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            WorkflowError::Validation(ValidationError::RecordSubmitted)
        );
    }
}

#[tokio::test]
async fn test_reopen_keeps_downstream_state_but_relocks() {
    let controller = WorkflowController::new(MemoryRecordStore::new(), three_section_catalog());
    let user = Uuid::new_v4();
    for id in ["personal_info", "w4_federal"] {
        controller
            .record_section_result(user, id, SectionStatus::Complete, None)
            .await
            .unwrap();
    }

    controller
        .record_section_result(user, "personal_info", SectionStatus::InProgress, None)
        .await
        .unwrap();

    let view = controller.section_view(user).await.unwrap();
    assert_eq!(view[0].status, SectionStatus::InProgress);
    // Downstream status is not invalidated
    assert_eq!(view[1].status, SectionStatus::Complete);
    assert_eq!(unlocked(&view), vec![true, false, false]);

    let err = controller.submit(user, "Jane Doe").await.unwrap_err();
    assert_eq!(
        err,
        SubmissionError::NotReady {
            incomplete: vec!["personal_info".to_string()]
        }
    );
}

#[tokio::test]
async fn test_concurrent_submits_have_one_winner() {
    let store = Arc::new(MemoryRecordStore::new());
    let controller = Arc::new(WorkflowController::new(
        store.clone(),
        three_section_catalog(),
    ));
    let user = Uuid::new_v4();
    for id in ["personal_info", "w4_federal"] {
        controller
            .record_section_result(user, id, SectionStatus::Complete, None)
            .await
            .unwrap();
    }

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let controller = controller.clone();
            tokio::spawn(async move { controller.submit(user, &format!("Jane Doe {}", i)).await })
        })
        .collect();

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(err) => assert_eq!(err, SubmissionError::AlreadySubmitted),
        }
    }
    assert_eq!(successes, 1);
    let stored = store.get(user).await.unwrap().unwrap();
    assert!(stored.is_submitted());
}

#[tokio::test]
async fn test_empty_catalog_is_vacuously_ready() {
    let controller = WorkflowController::new(MemoryRecordStore::new(), SectionCatalog::empty());
    let user = Uuid::new_v4();

    let overview = controller.overview(user).await.unwrap();
    assert_eq!(overview.progress.percent, 0);
    assert!(overview.can_submit);
    assert!(overview.sections.is_empty());

    assert!(controller.submit(user, "Jane Doe").await.is_ok());
}
