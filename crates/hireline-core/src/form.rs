//! Per-record form controller.
//!
//! Owns a single record's [`RecordDraft`] plus the transient state around
//! it: the duplicate guard for the identifier field and the in-flight
//! submission flag. All edits flow through [`RecordFormController::apply_field_change`];
//! submission goes through the persistence bridge and leaves the draft
//! intact on failure so nothing the user typed is lost.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::bridge::{MutationAck, PersistenceBridge, Resource};
use crate::draft::{FieldError, RecordDraft};
use crate::dupcheck::{CapPolicy, CheckRequest, DuplicateGuard, DuplicateState};
use crate::error::{Error, Result};
use crate::field::FormSchema;

/// Whether the form creates a new record or updates an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    /// Creating a new record.
    Create,
    /// Editing the record with the given id.
    Edit {
        /// The record being edited.
        id: String,
    },
}

/// Result of applying one field edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChangeOutcome {
    /// Fields whose values changed, the edited field included.
    pub changed: Vec<String>,
    /// A duplicate check the caller must now run via
    /// [`RecordFormController::run_duplicate_check`], if one was triggered.
    pub duplicate_check: Option<CheckRequest>,
}

/// Controller for one record form (intake, lineup, walk-in, joining).
pub struct RecordFormController {
    resource: Resource,
    bridge: Arc<dyn PersistenceBridge>,
    draft: RecordDraft,
    guard: DuplicateGuard,
    identifier_field: String,
    mode: FormMode,
    submitting: bool,
}

impl RecordFormController {
    /// Creates a controller in create mode.
    pub fn new(
        resource: Resource,
        bridge: Arc<dyn PersistenceBridge>,
        schema: Arc<FormSchema>,
        policy: CapPolicy,
        identifier_field: impl Into<String>,
    ) -> Self {
        Self {
            resource,
            bridge,
            draft: RecordDraft::new(schema),
            guard: DuplicateGuard::new(policy),
            identifier_field: identifier_field.into(),
            mode: FormMode::Create,
            submitting: false,
        }
    }

    /// The current draft.
    #[must_use]
    pub fn draft(&self) -> &RecordDraft {
        &self.draft
    }

    /// The duplicate guard's current state.
    #[must_use]
    pub fn duplicate_state(&self) -> &DuplicateState {
        self.guard.state()
    }

    /// Current mode.
    #[must_use]
    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    /// True while a save is in flight (submit affordances must be disabled).
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Loads an existing record into the draft and switches to edit mode.
    pub async fn load(&mut self, id: &str) -> Result<()> {
        let record = self.bridge.get_by_id(self.resource, id).await?;
        self.draft.load_from(&record);
        self.mode = FormMode::Edit { id: id.to_string() };
        Ok(())
    }

    /// Applies a field edit and its side effects.
    ///
    /// Editing the identifier field clears any previous duplicate result
    /// immediately and may trigger a new automatic check, returned for the
    /// caller to run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a field not in the schema.
    pub fn apply_field_change(
        &mut self,
        field: &str,
        value: impl Into<String>,
    ) -> Result<FieldChangeOutcome> {
        let value = value.into();
        let changed = self.draft.apply_field_change(field, value.clone())?;
        let duplicate_check = if field == self.identifier_field {
            self.guard.observe_input(&value)
        } else {
            None
        };
        Ok(FieldChangeOutcome {
            changed,
            duplicate_check,
        })
    }

    /// Explicit button-press duplicate check for the identifier field.
    ///
    /// Subject to the screen's [`CapPolicy`]; returns `None` when suppressed
    /// or when the identifier is not a complete 10-digit number.
    pub fn request_manual_check(&mut self) -> Option<CheckRequest> {
        let value = self.draft.get(&self.identifier_field).to_string();
        self.guard.manual_check(&value)
    }

    /// Runs a duplicate check against the bridge and settles the guard.
    ///
    /// A transport failure is captured in the guard state, not propagated;
    /// a result superseded by a newer check is discarded.
    pub async fn run_duplicate_check(&mut self, request: CheckRequest) -> &DuplicateState {
        let outcome = self.bridge.check_duplicate(&request.value).await;
        if let Err(err) = &outcome {
            warn!(error = %err, "duplicate check failed");
        }
        let committed = self.guard.settle(request.token, outcome);
        debug!(committed, "duplicate check settled");
        self.guard.state()
    }

    /// Validates the draft against its schema.
    #[must_use]
    pub fn validate(&self) -> Vec<FieldError> {
        self.draft.validate()
    }

    /// Submits the draft.
    ///
    /// Rejected while a save is already in flight, while the duplicate guard
    /// is blocking, or while validation fails. On a backend failure the
    /// draft is left intact — the backend message propagates verbatim and
    /// the user can correct and resubmit. On success the draft and guard are
    /// reset for the next record.
    pub async fn submit(&mut self) -> Result<MutationAck> {
        if self.submitting {
            return Err(Error::InvalidInput(
                "a save is already in flight".to_string(),
            ));
        }
        if let DuplicateState::Duplicate {
            locked_by,
            remaining,
        } = self.guard.state()
        {
            return Err(Error::DuplicateLocked {
                locked_by: locked_by.clone(),
                remaining: remaining.clone(),
            });
        }
        if let Some(first) = self.validate().into_iter().next() {
            return Err(Error::Validation {
                field: first.field,
                message: first.message,
            });
        }

        let payload: Map<String, Value> = self.draft.to_payload();
        self.submitting = true;
        let outcome = match &self.mode {
            FormMode::Create => self.bridge.create(self.resource, &payload).await,
            FormMode::Edit { id } => self.bridge.update(self.resource, id, &payload).await,
        };
        self.submitting = false;

        match outcome {
            Ok(ack) => {
                debug!(resource = %self.resource, "record saved");
                self.draft.reset();
                self.guard.reset();
                self.mode = FormMode::Create;
                Ok(ack)
            }
            Err(err) => {
                // Draft intact: the user corrects and resubmits.
                warn!(resource = %self.resource, error = %err, "record save failed");
                Err(err)
            }
        }
    }

    /// Discards the draft and resets all transient state.
    pub fn cancel(&mut self) {
        self.draft.reset();
        self.guard.reset();
        self.mode = FormMode::Create;
        self.submitting = false;
    }
}
