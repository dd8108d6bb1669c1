//! The in-progress form state for one record.
//!
//! A [`RecordDraft`] is a flat, ordered field→value map mutated only through
//! [`RecordDraft::apply_field_change`], which is the single entry point for
//! every cross-field side effect: contact-number mirroring, status-change
//! date resets, and the synchronous (cache-free) parts of dependency edges.
//! Option-set recomputation that needs lookup data goes through
//! [`crate::cascade::refresh_child`] instead.
//!
//! [`RecordDraft::to_payload`] produces the normalized submission body:
//! date fields serialize to canonical ISO-8601 or `null` (an unparseable
//! date is `null`, never an `"Invalid Date"` string), and `"others"`
//! sentinel values are substituted by their companion free-text content.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate};
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::cascade::{CascadeRule, OTHERS_SENTINEL};
use crate::error::{Error, Result};
use crate::field::{FieldKind, FormSchema, SideEffect};

/// A field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// The offending field.
    pub field: String,
    /// Message suitable for display next to the field.
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Mutable in-progress form state for one entity.
#[derive(Debug, Clone)]
pub struct RecordDraft {
    schema: Arc<FormSchema>,
    values: IndexMap<String, String>,
}

impl RecordDraft {
    /// Creates an empty draft seeded with the schema's fields in order.
    #[must_use]
    pub fn new(schema: Arc<FormSchema>) -> Self {
        let values = schema
            .fields
            .iter()
            .map(|spec| (spec.name.clone(), String::new()))
            .collect();
        Self { schema, values }
    }

    /// The schema this draft was built from.
    #[must_use]
    pub fn schema(&self) -> &Arc<FormSchema> {
        &self.schema
    }

    /// Returns a field's current value (`""` for unset).
    #[must_use]
    pub fn get(&self, field: &str) -> &str {
        self.values.get(field).map_or("", String::as_str)
    }

    /// Returns true when every field is empty (nothing worth persisting).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.values().all(String::is_empty)
    }

    /// The raw field→value map, in schema order.
    #[must_use]
    pub fn values(&self) -> &IndexMap<String, String> {
        &self.values
    }

    /// Restores field values from a persisted draft.
    ///
    /// Applied directly, without side effects: the persisted values already
    /// went through `apply_field_change` when they were first entered.
    pub fn restore(&mut self, values: &IndexMap<String, String>) {
        for (field, value) in values {
            if let Some(slot) = self.values.get_mut(field) {
                *slot = value.clone();
            }
        }
    }

    /// Applies a single field edit plus all its cross-field side effects.
    ///
    /// Returns the names of every field whose value changed, the edited
    /// field included, in application order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a field not present in the schema.
    pub fn apply_field_change(
        &mut self,
        field: &str,
        value: impl Into<String>,
    ) -> Result<Vec<String>> {
        if !self.values.contains_key(field) {
            return Err(Error::InvalidInput(format!(
                "unknown field '{field}'"
            )));
        }
        let value = value.into();
        let mut changed = Vec::new();
        self.set(field, value.clone(), &mut changed);

        let effects = self.schema.effects.clone();
        for effect in &effects {
            match effect {
                SideEffect::Mirror { from, to } if from == field => {
                    self.set(to, value.clone(), &mut changed);
                }
                SideEffect::RetainOnChange { .. } => {
                    for cleared in effect.cleared_fields(field, &value) {
                        let cleared = cleared.to_string();
                        self.set(&cleared, String::new(), &mut changed);
                    }
                }
                SideEffect::Mirror { .. } => {}
            }
        }

        let edges: Vec<_> = self.schema.edges_from(field).cloned().collect();
        for edge in edges {
            match &edge.rule {
                CascadeRule::Gated { gate } if !value.eq_ignore_ascii_case(gate) => {
                    self.set(&edge.child_field, String::new(), &mut changed);
                }
                CascadeRule::OthersPassthrough
                    if value.eq_ignore_ascii_case(OTHERS_SENTINEL) =>
                {
                    self.set(&edge.child_field, OTHERS_SENTINEL.to_string(), &mut changed);
                }
                _ => {}
            }
        }

        Ok(changed)
    }

    /// Validates the draft against the schema.
    ///
    /// Requiredness is evaluated from current values on every call; sentinel
    /// fields additionally require their companion free-text content.
    #[must_use]
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        for spec in &self.schema.fields {
            let value = self.get(&spec.name);
            let required = self
                .schema
                .is_required(&spec.name, |field| self.get(field).to_string());
            if required && value.is_empty() {
                errors.push(FieldError {
                    field: spec.name.clone(),
                    message: format!("{} is required", spec.label),
                });
            }
            if let Some(companion) = &spec.companion {
                if value == OTHERS_SENTINEL && self.get(companion).is_empty() {
                    errors.push(FieldError {
                        field: companion.clone(),
                        message: format!("{} requires a custom value", spec.label),
                    });
                }
            }
        }
        errors
    }

    /// Produces the normalized submission payload.
    ///
    /// - Date fields serialize to `YYYY-MM-DD` or `null`; any value that does
    ///   not parse as a date serializes to `null`.
    /// - A field holding the `"others"` sentinel submits its companion's
    ///   free-text content instead; companion fields themselves are not
    ///   emitted as separate keys.
    #[must_use]
    pub fn to_payload(&self) -> Map<String, Value> {
        let companions: Vec<&str> = self
            .schema
            .fields
            .iter()
            .filter_map(|spec| spec.companion.as_deref())
            .collect();

        let mut payload = Map::new();
        for spec in &self.schema.fields {
            if companions.contains(&spec.name.as_str()) {
                continue;
            }
            let mut value = self.get(&spec.name).to_string();
            if let Some(companion) = &spec.companion {
                if value == OTHERS_SENTINEL {
                    value = self.get(companion).to_string();
                }
            }
            let json = match spec.kind {
                FieldKind::Date => normalize_date(&value),
                _ => Value::String(value),
            };
            payload.insert(spec.name.clone(), json);
        }
        payload
    }

    /// Clears every field back to empty.
    pub fn reset(&mut self) {
        for value in self.values.values_mut() {
            value.clear();
        }
    }

    /// Overwrites the draft from a loaded record (edit mode).
    ///
    /// Keys absent from the schema are ignored; schema fields absent from the
    /// record are cleared.
    pub fn load_from(&mut self, record: &Map<String, Value>) {
        for (field, value) in &mut self.values {
            *value = match record.get(field) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                Some(Value::Bool(b)) => b.to_string(),
                _ => String::new(),
            };
        }
    }

    fn set(&mut self, field: &str, value: String, changed: &mut Vec<String>) {
        if let Some(slot) = self.values.get_mut(field) {
            if *slot != value {
                *slot = value;
                changed.push(field.to_string());
            }
        }
    }
}

/// Parses a date-field value to canonical ISO-8601, or null.
///
/// Accepts `YYYY-MM-DD` directly or an RFC 3339 timestamp (taking its date
/// part). Anything else, the empty string included, is `null` — the literal
/// string `"Invalid Date"` can never reach a payload.
fn normalize_date(value: &str) -> Value {
    if value.is_empty() {
        return Value::Null;
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Value::String(date.format("%Y-%m-%d").to_string());
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Value::String(ts.date_naive().format("%Y-%m-%d").to_string());
    }
    Value::Null
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::FieldDependency;
    use crate::field::{FieldSpec, FormSchema};
    use crate::lookup::LookupCategory;

    fn schema() -> Arc<FormSchema> {
        Arc::new(
            FormSchema::new()
                .field(FieldSpec::new("contactNumber", "Contact Number", FieldKind::Text).required())
                .field(FieldSpec::new("whatsappNumber", "WhatsApp Number", FieldKind::Text))
                .field(FieldSpec::new("callStatus", "Call Status", FieldKind::Select))
                .field(FieldSpec::new("lineupDate", "Lineup Date", FieldKind::Date))
                .field(FieldSpec::new("interviewDate", "Interview Date", FieldKind::Date))
                .field(FieldSpec::new("walkinDate", "Walkin Date", FieldKind::Date))
                .field(
                    FieldSpec::new("lineupCompany", "Company", FieldKind::Select)
                        .with_companion("customLineupCompany"),
                )
                .field(FieldSpec::new("customLineupCompany", "Custom Company", FieldKind::Text))
                .field(
                    FieldSpec::new("lineupProcess", "Process", FieldKind::Select)
                        .with_companion("customLineupProcess"),
                )
                .field(FieldSpec::new("customLineupProcess", "Custom Process", FieldKind::Text))
                .effect(SideEffect::Mirror {
                    from: "contactNumber".into(),
                    to: "whatsappNumber".into(),
                })
                .effect(SideEffect::RetainOnChange {
                    trigger: "callStatus".into(),
                    groups: vec![
                        (
                            "Lineup".into(),
                            vec!["lineupDate".into(), "interviewDate".into()],
                        ),
                        ("Walkin at Infidea".into(), vec!["walkinDate".into()]),
                    ],
                })
                .dependency(FieldDependency::others_passthrough(
                    "lineupCompany",
                    "lineupProcess",
                    LookupCategory::Processes,
                )),
        )
    }

    #[test]
    fn contact_number_mirrors_to_whatsapp() {
        let mut draft = RecordDraft::new(schema());
        draft
            .apply_field_change("contactNumber", "9876543210")
            .expect("known field");
        assert_eq!(draft.get("whatsappNumber"), "9876543210");

        // Every edit overwrites the mirror; there is no divergence tracking.
        draft
            .apply_field_change("whatsappNumber", "9000000000")
            .expect("known field");
        draft
            .apply_field_change("contactNumber", "9111111111")
            .expect("known field");
        assert_eq!(draft.get("whatsappNumber"), "9111111111");
    }

    #[test]
    fn status_change_clears_irrelevant_dates() {
        let mut draft = RecordDraft::new(schema());
        draft.apply_field_change("callStatus", "Lineup").unwrap();
        draft.apply_field_change("lineupDate", "2025-01-10").unwrap();
        draft.apply_field_change("interviewDate", "2025-01-15").unwrap();

        draft
            .apply_field_change("callStatus", "Walkin at Infidea")
            .unwrap();
        assert_eq!(draft.get("lineupDate"), "");
        assert_eq!(draft.get("interviewDate"), "");
        assert_eq!(draft.get("walkinDate"), "");

        let payload = draft.to_payload();
        assert_eq!(payload["lineupDate"], Value::Null);
        assert_eq!(payload["interviewDate"], Value::Null);
        assert_eq!(payload["walkinDate"], Value::Null);
    }

    #[test]
    fn others_company_forces_process_and_payload_substitutes() {
        let mut draft = RecordDraft::new(schema());
        draft.apply_field_change("lineupCompany", "others").unwrap();
        assert_eq!(draft.get("lineupProcess"), "others");

        draft
            .apply_field_change("customLineupProcess", "Backend Support")
            .unwrap();
        draft
            .apply_field_change("customLineupCompany", "Acme Outsourcing")
            .unwrap();

        let payload = draft.to_payload();
        assert_eq!(payload["lineupProcess"], Value::String("Backend Support".into()));
        assert_eq!(payload["lineupCompany"], Value::String("Acme Outsourcing".into()));
        assert!(!payload.contains_key("customLineupProcess"));
    }

    #[test]
    fn invalid_dates_serialize_to_null_never_a_string() {
        let mut draft = RecordDraft::new(schema());
        draft.apply_field_change("lineupDate", "not-a-date").unwrap();
        draft.apply_field_change("walkinDate", "2025-13-45").unwrap();
        draft
            .apply_field_change("interviewDate", "2025-02-01T09:30:00+05:30")
            .unwrap();

        let payload = draft.to_payload();
        assert_eq!(payload["lineupDate"], Value::Null);
        assert_eq!(payload["walkinDate"], Value::Null);
        assert_eq!(payload["interviewDate"], Value::String("2025-02-01".into()));

        let serialized = serde_json::to_string(&payload).unwrap();
        assert!(!serialized.contains("Invalid Date"));
    }

    #[test]
    fn unknown_field_is_rejected() {
        let mut draft = RecordDraft::new(schema());
        let err = draft.apply_field_change("nope", "x").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn sentinel_requires_companion_content() {
        let mut draft = RecordDraft::new(schema());
        draft.apply_field_change("contactNumber", "9876543210").unwrap();
        draft.apply_field_change("lineupCompany", "others").unwrap();

        let errors = draft.validate();
        assert!(errors.iter().any(|e| e.field == "customLineupCompany"));
        // The forced process sentinel needs its companion too.
        assert!(errors.iter().any(|e| e.field == "customLineupProcess"));

        draft
            .apply_field_change("customLineupCompany", "Acme")
            .unwrap();
        draft
            .apply_field_change("customLineupProcess", "Support")
            .unwrap();
        assert!(draft.validate().is_empty());
    }
}
