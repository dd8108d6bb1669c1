//! Draft persistence with an explicit time-to-live.
//!
//! The intake screen persists its in-progress draft on every field change so
//! a crashed or closed session can resume. The policy is explicit and
//! testable in isolation:
//!
//! - an all-empty draft is never written (saving it would clobber nothing
//!   with nothing);
//! - a stored draft expires [`DRAFT_TTL`] after it was saved; `load` discards
//!   and clears an expired draft rather than resurrecting stale data.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// How long a persisted draft stays loadable (2 hours).
pub const DRAFT_TTL: Duration = Duration::from_secs(2 * 60 * 60);

/// A persisted draft envelope: the field values plus when they were saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDraft {
    /// When the draft was written.
    pub saved_at: DateTime<Utc>,
    /// The field→value map at save time.
    pub values: IndexMap<String, String>,
}

impl StoredDraft {
    /// Wraps values with the current timestamp.
    #[must_use]
    pub fn now(values: IndexMap<String, String>) -> Self {
        Self {
            saved_at: Utc::now(),
            values,
        }
    }

    /// Returns true when the draft is older than `ttl` as of `now`.
    #[must_use]
    pub fn is_expired_at(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.saved_at);
        age > chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX)
    }

    /// Returns true when the draft is older than `ttl` right now.
    #[must_use]
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.is_expired_at(ttl, Utc::now())
    }
}

/// Draft persistence seam.
pub trait DraftStore: Send + Sync {
    /// Persists the draft. A draft whose values are all empty is not
    /// written; the call is a no-op.
    fn save(&self, values: &IndexMap<String, String>) -> Result<()>;

    /// Loads the persisted draft, if present and fresh.
    ///
    /// An expired draft is cleared and `None` is returned.
    fn load(&self) -> Result<Option<StoredDraft>>;

    /// Removes any persisted draft.
    fn clear(&self) -> Result<()>;
}

/// In-memory store, for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    ttl: Option<Duration>,
    slot: Mutex<Option<StoredDraft>>,
}

impl MemoryDraftStore {
    /// Creates a store with the default TTL.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ttl: None,
            slot: Mutex::new(None),
        }
    }

    /// Overrides the TTL (tests).
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Injects a raw envelope, bypassing the empty-draft guard (tests).
    pub fn insert_raw(&self, draft: StoredDraft) {
        *self.slot.lock().expect("draft store poisoned") = Some(draft);
    }

    fn ttl(&self) -> Duration {
        self.ttl.unwrap_or(DRAFT_TTL)
    }
}

impl DraftStore for MemoryDraftStore {
    fn save(&self, values: &IndexMap<String, String>) -> Result<()> {
        if values.values().all(String::is_empty) {
            return Ok(());
        }
        *self.slot.lock().expect("draft store poisoned") = Some(StoredDraft::now(values.clone()));
        Ok(())
    }

    fn load(&self) -> Result<Option<StoredDraft>> {
        let mut slot = self.slot.lock().expect("draft store poisoned");
        match slot.take() {
            Some(draft) if !draft.is_expired(self.ttl()) => {
                *slot = Some(draft.clone());
                Ok(Some(draft))
            }
            _ => Ok(None),
        }
    }

    fn clear(&self) -> Result<()> {
        *self.slot.lock().expect("draft store poisoned") = None;
        Ok(())
    }
}

/// JSON-file store, the host adapter for desktop/browser shells.
#[derive(Debug)]
pub struct FileDraftStore {
    path: PathBuf,
    ttl: Duration,
}

impl FileDraftStore {
    /// Creates a store at the given path with the default TTL.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ttl: DRAFT_TTL,
        }
    }

    /// Overrides the TTL.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

impl DraftStore for FileDraftStore {
    fn save(&self, values: &IndexMap<String, String>) -> Result<()> {
        if values.values().all(String::is_empty) {
            return Ok(());
        }
        let draft = StoredDraft::now(values.clone());
        let body = serde_json::to_vec_pretty(&draft)
            .map_err(|e| Error::serialization(e.to_string()))?;
        fs::write(&self.path, body).map_err(|e| {
            Error::Configuration(format!("failed writing draft {}: {e}", self.path.display()))
        })?;
        Ok(())
    }

    fn load(&self) -> Result<Option<StoredDraft>> {
        let body = match fs::read(&self.path) {
            Ok(body) => body,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(Error::Configuration(format!(
                    "failed reading draft {}: {err}",
                    self.path.display()
                )));
            }
        };
        let draft: StoredDraft = match serde_json::from_slice(&body) {
            Ok(draft) => draft,
            Err(err) => {
                // A corrupt draft file is discarded, not surfaced.
                debug!(error = %err, "discarding unreadable draft file");
                self.clear()?;
                return Ok(None);
            }
        };
        if draft.is_expired(self.ttl) {
            debug!("discarding expired draft");
            self.clear()?;
            return Ok(None);
        }
        Ok(Some(draft))
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::Configuration(format!(
                "failed clearing draft {}: {err}",
                self.path.display()
            ))),
        }
    }
}
