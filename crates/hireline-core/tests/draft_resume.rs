//! Session resume: persisting an in-progress draft and restoring it into a
//! fresh controller session.

use hireline_core::{DraftStore, MemoryDraftStore, RecordDraft};
use hireline_test_utils::intake_schema;

#[test]
fn saved_draft_restores_into_a_fresh_session() {
    let store = MemoryDraftStore::new();

    let mut draft = RecordDraft::new(intake_schema());
    draft
        .apply_field_change("contactNumber", "9876543210")
        .unwrap();
    draft
        .apply_field_change("candidateName", "Priya Sharma")
        .unwrap();
    draft.apply_field_change("callStatus", "Lineup").unwrap();
    store.save(draft.values()).expect("draft persists");

    // A new session starts empty and picks the persisted values back up.
    let mut resumed = RecordDraft::new(intake_schema());
    assert!(resumed.is_empty());
    let stored = store.load().expect("store readable").expect("draft fresh");
    resumed.restore(&stored.values);

    assert_eq!(resumed.get("contactNumber"), "9876543210");
    // The mirror was applied at entry time and persists as a plain value.
    assert_eq!(resumed.get("whatsappNumber"), "9876543210");
    assert_eq!(resumed.get("callStatus"), "Lineup");
}

#[test]
fn cleared_store_yields_no_draft_to_resume() {
    let store = MemoryDraftStore::new();

    let mut draft = RecordDraft::new(intake_schema());
    draft
        .apply_field_change("contactNumber", "9876543210")
        .unwrap();
    store.save(draft.values()).expect("draft persists");

    store.clear().expect("store clears");
    assert!(store.load().expect("store readable").is_none());
}
