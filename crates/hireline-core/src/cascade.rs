//! Dependent-field resolution for cascading dropdowns.
//!
//! Two cascades recur across every record form:
//!
//! - **state → city → locality**, where the locality level is gated: it is
//!   only active when the selected city is the gate city (`"indore"`,
//!   compared case-insensitively). Any other city forces the locality to the
//!   empty string with an empty option list.
//! - **company → process**, where the sentinel `"others"` passes through: a
//!   parent of `"others"` forces the child to `"others"` instead of clearing
//!   it, so the companion free-text field takes over.
//!
//! Resolution itself is pure: given the recomputed option list and the
//! current child value it returns the next child value without any I/O.
//! Fetching the options goes through [`LookupCache`]; the [`CascadeTracker`]
//! assigns a generation token to each refresh so that a late-arriving
//! response for a superseded parent value is discarded instead of being
//! committed over the newer one.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use tracing::debug;

use crate::lookup::{LookupCache, LookupCategory, LookupKey, LookupOption};

/// Reserved option value meaning "the real value is free text in the
/// companion field". Always preserved across recomputed option sets.
pub const OTHERS_SENTINEL: &str = "others";

/// City whose selection activates the locality level.
pub const LOCALITY_GATE_CITY: &str = "indore";

/// How a dependency edge treats the child when the parent changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeRule {
    /// Keep the child if still present in the recomputed options, else clear.
    Standard,
    /// As `Standard`, but a parent of `"others"` forces the child to
    /// `"others"` rather than clearing it (company → process).
    OthersPassthrough,
    /// The edge is only active when the parent equals the gate value
    /// case-insensitively; otherwise the child is forced empty and the
    /// option list is empty (city → locality).
    Gated {
        /// The parent value that activates the edge.
        gate: String,
    },
}

/// A declarative dependency edge between two form fields.
#[derive(Debug, Clone)]
pub struct FieldDependency {
    /// The field whose value drives the child's option set.
    pub parent_field: String,
    /// The field whose options and value are recomputed.
    pub child_field: String,
    /// Lookup category serving the child's options.
    pub child_category: LookupCategory,
    /// Rule applied when the parent changes.
    pub rule: CascadeRule,
}

impl FieldDependency {
    /// Creates a standard edge.
    pub fn standard(
        parent_field: impl Into<String>,
        child_field: impl Into<String>,
        child_category: LookupCategory,
    ) -> Self {
        Self {
            parent_field: parent_field.into(),
            child_field: child_field.into(),
            child_category,
            rule: CascadeRule::Standard,
        }
    }

    /// Creates a company→process style edge with `"others"` passthrough.
    pub fn others_passthrough(
        parent_field: impl Into<String>,
        child_field: impl Into<String>,
        child_category: LookupCategory,
    ) -> Self {
        Self {
            parent_field: parent_field.into(),
            child_field: child_field.into(),
            child_category,
            rule: CascadeRule::OthersPassthrough,
        }
    }

    /// Creates a city→locality style edge gated on the given city.
    pub fn gated(
        parent_field: impl Into<String>,
        child_field: impl Into<String>,
        child_category: LookupCategory,
        gate: impl Into<String>,
    ) -> Self {
        Self {
            parent_field: parent_field.into(),
            child_field: child_field.into(),
            child_category,
            rule: CascadeRule::Gated { gate: gate.into() },
        }
    }

    /// Returns the cache key serving this edge's child options for a parent
    /// value. Keyed categories embed the parent in the key.
    #[must_use]
    pub fn lookup_key(&self, parent_value: &str) -> LookupKey {
        match self.child_category {
            LookupCategory::Cities | LookupCategory::Processes => {
                LookupKey::scoped(self.child_category, parent_value)
            }
            _ => LookupKey::plain(self.child_category),
        }
    }

    /// Returns true if the edge is active for the given parent value.
    ///
    /// Gated edges are inactive for any parent other than their gate; all
    /// other edges are inactive only for an empty parent.
    #[must_use]
    pub fn is_active(&self, parent_value: &str) -> bool {
        match &self.rule {
            CascadeRule::Gated { gate } => parent_value.eq_ignore_ascii_case(gate),
            _ => !parent_value.is_empty(),
        }
    }
}

/// Outcome of resolving an edge: the child's option set and next value.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Recomputed option set for the child field.
    pub options: Arc<[LookupOption]>,
    /// The child value after resolution (`""` when cleared).
    pub next_child: String,
}

/// Pure resolution: decides the child's next value from the recomputed
/// options, the parent value, and the current child value. Performs no I/O.
#[must_use]
pub fn resolve(
    edge: &FieldDependency,
    parent_value: &str,
    current_child: &str,
    options: Arc<[LookupOption]>,
) -> Resolution {
    match &edge.rule {
        CascadeRule::Gated { gate } if !parent_value.eq_ignore_ascii_case(gate) => Resolution {
            options: Arc::from(Vec::new()),
            next_child: String::new(),
        },
        CascadeRule::OthersPassthrough
            if parent_value.eq_ignore_ascii_case(OTHERS_SENTINEL) =>
        {
            Resolution {
                options,
                next_child: OTHERS_SENTINEL.to_string(),
            }
        }
        _ => {
            let keep = current_child == OTHERS_SENTINEL
                || options.iter().any(|option| option.value == current_child);
            Resolution {
                options,
                next_child: if keep {
                    current_child.to_string()
                } else {
                    String::new()
                },
            }
        }
    }
}

/// Generation token for one in-flight child refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeTicket {
    child_field: String,
    generation: u64,
}

/// Tracks the latest refresh generation per child field so superseded
/// responses can be discarded.
#[derive(Debug, Default)]
pub struct CascadeTracker {
    generations: Mutex<HashMap<String, u64>>,
}

impl CascadeTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Begins a refresh for a child field, superseding any prior refresh.
    pub fn begin(&self, child_field: &str) -> CascadeTicket {
        let mut generations = self.generations.lock().expect("cascade tracker poisoned");
        let generation = generations
            .entry(child_field.to_string())
            .and_modify(|g| *g += 1)
            .or_insert(1);
        CascadeTicket {
            child_field: child_field.to_string(),
            generation: *generation,
        }
    }

    /// Returns true if the ticket still represents the latest refresh.
    pub fn is_current(&self, ticket: &CascadeTicket) -> bool {
        let generations = self.generations.lock().expect("cascade tracker poisoned");
        generations.get(&ticket.child_field) == Some(&ticket.generation)
    }
}

/// Refreshes an edge's child options for a new parent value.
///
/// Returns `None` when the response arrived for a parent value that has been
/// superseded by a newer refresh of the same child field — the stale result
/// must not be committed to visible state.
pub async fn refresh_child(
    cache: &LookupCache,
    tracker: &CascadeTracker,
    edge: &FieldDependency,
    parent_value: &str,
    current_child: &str,
) -> Option<Resolution> {
    let ticket = tracker.begin(&edge.child_field);

    if !edge.is_active(parent_value) {
        // No fetch for inactive edges; the resolution is immediate.
        return tracker.is_current(&ticket).then(|| {
            resolve(edge, parent_value, current_child, Arc::from(Vec::new()))
        });
    }

    let options = cache.get(&edge.lookup_key(parent_value)).await;

    if !tracker.is_current(&ticket) {
        debug!(
            child = %edge.child_field,
            parent_value,
            "discarding stale lookup response"
        );
        return None;
    }
    Some(resolve(edge, parent_value, current_child, options))
}
