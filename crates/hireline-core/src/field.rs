//! Declarative field descriptors and form schemas.
//!
//! A form is described as data: an ordered list of [`FieldSpec`]s, the
//! dependency edges between them, and the cross-field side effects applied on
//! edit. Rendering is out of scope — the [`FieldKind`] tag is a capability
//! marker the UI layer maps to whatever widget set it uses, not a widget.

use serde::{Deserialize, Serialize};

use crate::cascade::FieldDependency;

/// Renderer capability for a field. Deliberately UI-framework agnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    /// Single-line text input.
    Text,
    /// Dropdown fed by a lookup category or static options.
    Select,
    /// Date input; serialized as ISO-8601 or null.
    Date,
    /// Multi-line text input.
    Textarea,
    /// Screen-specific widget identified by key.
    Custom(String),
}

/// When a field is required.
///
/// Requiredness is re-derived from the current draft on every validation —
/// it is a function of other fields' values, never a cached flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// Always required.
    Always,
    /// Never required.
    Never,
    /// Required only while another field holds one of the listed values.
    WhenEquals {
        /// The field whose value drives requiredness.
        field: String,
        /// Values under which this field is required.
        values: Vec<String>,
    },
}

/// Descriptor for a single form field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Stable field name (payload key).
    pub name: String,
    /// Display label.
    pub label: String,
    /// Renderer capability.
    pub kind: FieldKind,
    /// When this field is required.
    pub requirement: Requirement,
    /// Companion free-text field substituted when this field holds the
    /// `"others"` sentinel. The companion becomes required and its content,
    /// not the sentinel, is what gets submitted.
    pub companion: Option<String>,
}

impl FieldSpec {
    /// Creates an optional field of the given kind.
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            requirement: Requirement::Never,
            companion: None,
        }
    }

    /// Marks the field always required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.requirement = Requirement::Always;
        self
    }

    /// Makes the field required only while `field` holds one of `values`.
    #[must_use]
    pub fn required_when(
        mut self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.requirement = Requirement::WhenEquals {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        };
        self
    }

    /// Attaches a companion free-text field for the `"others"` sentinel.
    #[must_use]
    pub fn with_companion(mut self, companion: impl Into<String>) -> Self {
        self.companion = Some(companion.into());
        self
    }
}

/// Cross-field side effect applied inside `apply_field_change`.
#[derive(Debug, Clone)]
pub enum SideEffect {
    /// Every edit to `from` overwrites `to` with the same value.
    ///
    /// No divergence tracking: this is the observed contact→WhatsApp
    /// behavior, where the secondary number always follows the primary.
    Mirror {
        /// Source field.
        from: String,
        /// Destination field.
        to: String,
    },
    /// When `trigger` changes, clear every managed field that is not listed
    /// for the new trigger value. Only one status is active at a time, so
    /// the fields of every other status are irrelevant and reset.
    RetainOnChange {
        /// The field whose change drives the reset.
        trigger: String,
        /// Per trigger value, the managed fields retained for it.
        groups: Vec<(String, Vec<String>)>,
    },
}

impl SideEffect {
    /// Returns the managed fields cleared when `trigger` takes `new_value`.
    #[must_use]
    pub fn cleared_fields(&self, trigger: &str, new_value: &str) -> Vec<&str> {
        match self {
            Self::Mirror { .. } => Vec::new(),
            Self::RetainOnChange {
                trigger: own_trigger,
                groups,
            } => {
                if own_trigger != trigger {
                    return Vec::new();
                }
                let retained: Vec<&str> = groups
                    .iter()
                    .find(|(value, _)| value == new_value)
                    .map(|(_, fields)| fields.iter().map(String::as_str).collect())
                    .unwrap_or_default();
                groups
                    .iter()
                    .flat_map(|(_, fields)| fields.iter().map(String::as_str))
                    .filter(|field| !retained.contains(field))
                    .collect()
            }
        }
    }
}

/// A complete form description: ordered fields, dependency edges, effects.
#[derive(Debug, Clone, Default)]
pub struct FormSchema {
    /// Ordered field descriptors.
    pub fields: Vec<FieldSpec>,
    /// Dependent-field edges (state→city→locality, company→process).
    pub dependencies: Vec<FieldDependency>,
    /// Cross-field side effects.
    pub effects: Vec<SideEffect>,
}

impl FormSchema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field.
    #[must_use]
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Adds a dependency edge.
    #[must_use]
    pub fn dependency(mut self, edge: FieldDependency) -> Self {
        self.dependencies.push(edge);
        self
    }

    /// Adds a side effect.
    #[must_use]
    pub fn effect(mut self, effect: SideEffect) -> Self {
        self.effects.push(effect);
        self
    }

    /// Looks up a field descriptor by name.
    #[must_use]
    pub fn spec(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|spec| spec.name == name)
    }

    /// Returns the dependency edges driven by the given parent field.
    pub fn edges_from<'a>(
        &'a self,
        parent_field: &'a str,
    ) -> impl Iterator<Item = &'a FieldDependency> + 'a {
        self.dependencies
            .iter()
            .filter(move |edge| edge.parent_field == parent_field)
    }

    /// Evaluates a field's requiredness against the current draft values.
    #[must_use]
    pub fn is_required(&self, name: &str, value_of: impl Fn(&str) -> String) -> bool {
        let Some(spec) = self.spec(name) else {
            return false;
        };
        match &spec.requirement {
            Requirement::Always => true,
            Requirement::Never => false,
            Requirement::WhenEquals { field, values } => {
                let current = value_of(field);
                values.iter().any(|v| v == &current)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retain_on_change_clears_other_groups() {
        let effect = SideEffect::RetainOnChange {
            trigger: "callStatus".into(),
            groups: vec![
                (
                    "Lineup".into(),
                    vec!["lineupDate".into(), "interviewDate".into()],
                ),
                ("Walkin at Infidea".into(), vec!["walkinDate".into()]),
            ],
        };

        let cleared = effect.cleared_fields("callStatus", "Walkin at Infidea");
        assert_eq!(cleared, vec!["lineupDate", "interviewDate"]);

        let cleared = effect.cleared_fields("callStatus", "Lineup");
        assert_eq!(cleared, vec!["walkinDate"]);

        // Unknown status clears every managed field.
        let cleared = effect.cleared_fields("callStatus", "Not Interested");
        assert_eq!(cleared, vec!["lineupDate", "interviewDate", "walkinDate"]);

        // Other triggers are untouched.
        assert!(effect.cleared_fields("city", "Indore").is_empty());
    }

    #[test]
    fn conditional_requiredness_follows_driver_field() {
        let schema = FormSchema::new().field(
            FieldSpec::new("experience", "Experience", FieldKind::Select)
                .required_when("callStatus", ["Lineup", "Walkin at Infidea"]),
        );

        assert!(schema.is_required("experience", |field| {
            assert_eq!(field, "callStatus");
            "Lineup".to_string()
        }));
        assert!(!schema.is_required("experience", |_| "Not Interested".to_string()));
    }
}
