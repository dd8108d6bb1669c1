//! Duplicate-record guard for the 10-digit phone identifier.
//!
//! Every record form carries a phone-number field that doubles as the
//! candidate's identity. The guard watches edits to that field and, once the
//! value reaches exactly 10 digits, asks the backend whether an active record
//! already exists. Three outcomes matter to the UI:
//!
//! - **Locked**: another agent holds the candidate; submission is disabled
//!   and the lock holder plus remaining window are shown.
//! - **Not found**: on intake screens this is a navigation, not an error —
//!   the user is redirected to a pre-filled intake form.
//! - **Clear**: no conflict, carry on.
//!
//! The trigger is debounced by completeness rather than by timer: nothing
//! fires until the value is a complete 10-digit number, and a value already
//! checked does not re-trigger. Some screens cap automatic checks at three
//! per form session; whether an explicit button press counts against the cap
//! is a per-screen policy (see [`CapPolicy`]).

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Error;

/// Length at which a phone value is considered complete.
pub const PHONE_LENGTH: usize = 10;

/// Default automatic-check cap per form session.
pub const DEFAULT_AUTO_CAP: u32 = 3;

/// Backend answer to a duplicate probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum DuplicateCheck {
    /// No existing record conflicts with this number.
    Clear,
    /// An active record exists and is locked by another agent.
    Locked {
        /// Display name of the lock holder.
        locked_by: String,
        /// Remaining lock window, verbatim from the backend.
        remaining: String,
    },
    /// The backend has no record for this number at all.
    NotFound,
}

/// Per-screen duplicate-check policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapPolicy {
    /// Maximum automatic checks per form session; `None` is unlimited.
    pub auto_cap: Option<u32>,
    /// Whether an explicit button-press check bypasses the cap.
    pub manual_exempt: bool,
}

impl CapPolicy {
    /// Call-details screens: capped automatic checks, manual checks exempt.
    #[must_use]
    pub const fn call_details() -> Self {
        Self {
            auto_cap: Some(DEFAULT_AUTO_CAP),
            manual_exempt: true,
        }
    }

    /// Intake screens: every check, manual or automatic, counts and is capped.
    #[must_use]
    pub const fn intake() -> Self {
        Self {
            auto_cap: Some(DEFAULT_AUTO_CAP),
            manual_exempt: false,
        }
    }

    /// No cap at all.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            auto_cap: None,
            manual_exempt: true,
        }
    }
}

/// Guard state as observed by the consuming form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuplicateState {
    /// No complete value observed yet.
    Idle,
    /// Value present but not a complete 10-digit number.
    Validating,
    /// A check is in flight.
    Checking,
    /// Latest check found no conflict.
    Clear,
    /// Latest check found an active lock; submission must be disabled.
    Duplicate {
        /// Display name of the lock holder.
        locked_by: String,
        /// Remaining lock window, verbatim from the backend.
        remaining: String,
    },
    /// Latest check found no record; navigate to a pre-filled intake form.
    Redirect,
    /// Latest check failed in transport; retry is up to the user.
    CheckFailed {
        /// Description of the failure.
        message: String,
    },
}

/// A check the caller must now perform against the bridge.
///
/// The token identifies the in-flight check; pass it back to
/// [`DuplicateGuard::settle`] with the outcome. A token superseded by a newer
/// check is ignored on settle, which is how overlapping checks cancel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRequest {
    /// The complete phone value to probe.
    pub value: String,
    /// Supersession token for this check.
    pub token: u64,
}

/// Debounced duplicate validator for one form's identifier field.
#[derive(Debug)]
pub struct DuplicateGuard {
    policy: CapPolicy,
    state: DuplicateState,
    last_checked: Option<String>,
    auto_checks_used: u32,
    generation: u64,
}

impl DuplicateGuard {
    /// Creates a guard with the given per-screen policy.
    #[must_use]
    pub fn new(policy: CapPolicy) -> Self {
        Self {
            policy,
            state: DuplicateState::Idle,
            last_checked: None,
            auto_checks_used: 0,
            generation: 0,
        }
    }

    /// Current guard state.
    #[must_use]
    pub fn state(&self) -> &DuplicateState {
        &self.state
    }

    /// Returns true while the latest settled check blocks submission.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        matches!(self.state, DuplicateState::Duplicate { .. })
    }

    /// Automatic checks performed so far this session.
    #[must_use]
    pub fn auto_checks_used(&self) -> u32 {
        self.auto_checks_used
    }

    /// Observes an edit to the identifier field.
    ///
    /// Any previous result is cleared immediately. Returns a [`CheckRequest`]
    /// only when the value has just become a complete 10-digit number that
    /// differs from the last value checked and the automatic cap is not
    /// exhausted; otherwise the caller has nothing to do.
    pub fn observe_input(&mut self, value: &str) -> Option<CheckRequest> {
        if !is_complete_phone(value) {
            self.state = if value.is_empty() {
                DuplicateState::Idle
            } else {
                DuplicateState::Validating
            };
            return None;
        }

        if self.last_checked.as_deref() == Some(value) {
            // Re-entering the already-checked value does not re-trigger.
            return None;
        }

        if let Some(cap) = self.policy.auto_cap {
            if self.auto_checks_used >= cap {
                debug!(cap, "automatic duplicate check suppressed by session cap");
                self.state = DuplicateState::Validating;
                return None;
            }
        }

        self.auto_checks_used += 1;
        Some(self.start_check(value))
    }

    /// Explicit button-press check.
    ///
    /// Exempt from the session cap where the screen policy says so; on other
    /// screens it counts exactly like an automatic check. Returns `None` for
    /// incomplete values or when a non-exempt check exceeds the cap.
    pub fn manual_check(&mut self, value: &str) -> Option<CheckRequest> {
        if !is_complete_phone(value) {
            return None;
        }
        if !self.policy.manual_exempt {
            if let Some(cap) = self.policy.auto_cap {
                if self.auto_checks_used >= cap {
                    return None;
                }
            }
            self.auto_checks_used += 1;
        }
        Some(self.start_check(value))
    }

    /// Settles an in-flight check.
    ///
    /// Returns false (and changes nothing) when the token has been superseded
    /// by a newer check — the late result is discarded.
    pub fn settle(
        &mut self,
        token: u64,
        outcome: Result<DuplicateCheck, Error>,
    ) -> bool {
        if token != self.generation {
            debug!(token, current = self.generation, "ignoring superseded duplicate check");
            return false;
        }
        self.state = match outcome {
            Ok(DuplicateCheck::Clear) => DuplicateState::Clear,
            Ok(DuplicateCheck::Locked {
                locked_by,
                remaining,
            }) => DuplicateState::Duplicate {
                locked_by,
                remaining,
            },
            Ok(DuplicateCheck::NotFound) => DuplicateState::Redirect,
            Err(err) => DuplicateState::CheckFailed {
                message: err.to_string(),
            },
        };
        true
    }

    /// Resets the guard for a fresh form session (cap counter included).
    pub fn reset(&mut self) {
        self.state = DuplicateState::Idle;
        self.last_checked = None;
        self.auto_checks_used = 0;
        self.generation += 1;
    }

    fn start_check(&mut self, value: &str) -> CheckRequest {
        self.generation += 1;
        self.last_checked = Some(value.to_string());
        self.state = DuplicateState::Checking;
        CheckRequest {
            value: value.to_string(),
            token: self.generation,
        }
    }
}

/// Returns true for a complete 10-digit phone value.
#[must_use]
pub fn is_complete_phone(value: &str) -> bool {
    value.len() == PHONE_LENGTH && value.bytes().all(|b| b.is_ascii_digit())
}
