//! End-to-end form controller tests against the in-memory backend:
//! duplicate guarding, submission gating, and edit-mode loading.

use std::sync::Arc;

use serde_json::{Map, Value};

use hireline_core::{
    CapPolicy, DuplicateCheck, DuplicateState, Error, ErrorKind, FormMode, RecordFormController,
    Resource,
};
use hireline_test_utils::{init_test_logging, intake_schema, MemoryBackend};

fn controller(backend: Arc<MemoryBackend>) -> RecordFormController {
    RecordFormController::new(
        Resource::CallDetails,
        backend,
        intake_schema(),
        CapPolicy::call_details(),
        "contactNumber",
    )
}

fn fill_required(form: &mut RecordFormController) {
    form.apply_field_change("candidateName", "Priya Sharma")
        .unwrap();
    form.apply_field_change("callStatus", "Callback").unwrap();
}

#[tokio::test]
async fn locked_number_blocks_submission_until_edited() {
    init_test_logging();
    let backend = Arc::new(MemoryBackend::new());
    backend.seed_duplicate(
        "9876543210",
        DuplicateCheck::Locked {
            locked_by: "Asha".to_string(),
            remaining: "4 days".to_string(),
        },
    );

    let mut form = controller(backend.clone());
    fill_required(&mut form);
    let outcome = form
        .apply_field_change("contactNumber", "9876543210")
        .unwrap();
    let request = outcome.duplicate_check.expect("complete number triggers");
    form.run_duplicate_check(request).await;

    assert!(matches!(
        form.duplicate_state(),
        DuplicateState::Duplicate { locked_by, .. } if locked_by == "Asha"
    ));
    let err = form.submit().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateLocked);
    assert!(err.blocks_submission());
    assert_eq!(backend.calls("create"), 0);

    // Editing the number clears the lock and lets the save through.
    let outcome = form
        .apply_field_change("contactNumber", "9123456789")
        .unwrap();
    let request = outcome.duplicate_check.expect("new number triggers");
    form.run_duplicate_check(request).await;
    assert_eq!(form.duplicate_state(), &DuplicateState::Clear);

    let ack = form.submit().await.expect("save succeeds");
    assert_eq!(ack.message, "Record created");
    assert_eq!(backend.calls("create"), 1);
}

#[tokio::test]
async fn unregistered_number_requests_redirect_not_an_error() {
    let backend = Arc::new(MemoryBackend::new());
    backend.seed_duplicate("9000000000", DuplicateCheck::NotFound);

    let mut form = controller(backend);
    let outcome = form
        .apply_field_change("contactNumber", "9000000000")
        .unwrap();
    form.run_duplicate_check(outcome.duplicate_check.unwrap())
        .await;
    assert_eq!(form.duplicate_state(), &DuplicateState::Redirect);
}

#[tokio::test]
async fn failed_probe_is_captured_not_propagated() {
    let backend = Arc::new(MemoryBackend::new());
    backend.fail_network("check_duplicate", "connection refused");

    let mut form = controller(backend);
    let outcome = form
        .apply_field_change("contactNumber", "9876543210")
        .unwrap();
    form.run_duplicate_check(outcome.duplicate_check.unwrap())
        .await;
    assert!(matches!(
        form.duplicate_state(),
        DuplicateState::CheckFailed { message } if message.contains("connection refused")
    ));
}

#[tokio::test]
async fn missing_required_fields_reject_submission() {
    let backend = Arc::new(MemoryBackend::new());
    let mut form = controller(backend.clone());
    form.apply_field_change("contactNumber", "9876543210")
        .unwrap();

    let err = form.submit().await.unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
    assert_eq!(backend.calls("create"), 0);

    // Lineup status pulls in the conditional requirements too.
    form.apply_field_change("candidateName", "Priya Sharma")
        .unwrap();
    form.apply_field_change("callStatus", "Lineup").unwrap();
    let errors = form.validate();
    assert!(errors.iter().any(|e| e.field == "state"));
    assert!(errors.iter().any(|e| e.field == "qualification"));
    assert!(errors.iter().any(|e| e.field == "experience"));
}

#[tokio::test]
async fn backend_failure_keeps_the_draft_for_retry() {
    init_test_logging();
    let backend = Arc::new(MemoryBackend::new());
    backend.fail_with("create", 422, "call status is not accepted");

    let mut form = controller(backend.clone());
    fill_required(&mut form);
    form.apply_field_change("contactNumber", "9876543210")
        .unwrap();

    let err = form.submit().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    assert!(err.to_string().contains("call status is not accepted"));

    // Everything the user typed is still there.
    assert_eq!(form.draft().get("candidateName"), "Priya Sharma");
    assert_eq!(form.draft().get("contactNumber"), "9876543210");

    // Unchanged resubmission goes through once the backend recovers.
    let ack = form.submit().await.expect("retry succeeds");
    assert!(ack.record.is_some());
    assert_eq!(backend.calls("create"), 2);

    // Success resets the form for the next record.
    assert!(form.draft().is_empty());
    assert_eq!(form.duplicate_state(), &DuplicateState::Idle);
}

#[tokio::test]
async fn successful_submit_normalizes_the_payload() {
    let backend = Arc::new(MemoryBackend::new());
    let mut form = controller(backend.clone());
    fill_required(&mut form);
    form.apply_field_change("contactNumber", "9876543210")
        .unwrap();
    form.apply_field_change("lineupCompany", "others").unwrap();
    form.apply_field_change("customLineupCompany", "Acme Outsourcing")
        .unwrap();
    form.apply_field_change("customLineupProcess", "Voice Support")
        .unwrap();
    form.apply_field_change("lineupDate", "garbage").unwrap();

    let ack = form.submit().await.expect("save succeeds");
    let record = ack.record.expect("create echoes the record");
    assert_eq!(record["lineupCompany"], Value::String("Acme Outsourcing".into()));
    assert_eq!(record["lineupProcess"], Value::String("Voice Support".into()));
    assert!(!record.contains_key("customLineupCompany"));
    assert_eq!(record["lineupDate"], Value::Null);
    assert_eq!(record["whatsappNumber"], Value::String("9876543210".into()));
}

#[tokio::test]
async fn edit_mode_loads_updates_and_returns_to_create() {
    let backend = Arc::new(MemoryBackend::new());
    let mut seeded = Map::new();
    seeded.insert("contactNumber".into(), Value::String("9876543210".into()));
    seeded.insert("candidateName".into(), Value::String("Rahul Verma".into()));
    seeded.insert("callStatus".into(), Value::String("Callback".into()));
    backend.seed_record(Resource::CallDetails, "cd-7", seeded);

    let mut form = controller(backend.clone());
    form.load("cd-7").await.expect("record exists");
    assert_eq!(
        form.mode(),
        &FormMode::Edit {
            id: "cd-7".to_string()
        }
    );
    assert_eq!(form.draft().get("candidateName"), "Rahul Verma");

    form.apply_field_change("callStatus", "Lineup").unwrap();
    form.apply_field_change("state", "MP").unwrap();
    form.apply_field_change("qualification", "Graduate").unwrap();
    form.apply_field_change("experience", "Fresher").unwrap();

    let ack = form.submit().await.expect("update succeeds");
    assert_eq!(ack.message, "Record updated");
    assert_eq!(backend.calls("update"), 1);
    assert_eq!(backend.calls("create"), 0);
    assert_eq!(form.mode(), &FormMode::Create);

    let stored = backend
        .stored(Resource::CallDetails, "cd-7")
        .expect("record updated in place");
    assert_eq!(stored["callStatus"], Value::String("Lineup".into()));
}

#[tokio::test]
async fn load_of_missing_record_propagates_not_found() {
    let backend = Arc::new(MemoryBackend::new());
    let mut form = controller(backend);
    let err = form.load("nope").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
