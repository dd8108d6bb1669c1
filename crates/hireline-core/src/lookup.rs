//! Reference-data lookup cache for dependent dropdowns.
//!
//! Lookup data (states, cities, localities, qualifications, job profiles,
//! company/process catalogs) is fetched on demand and memoized per composite
//! key. Composite keys embed the parent selection (`Cities` for a state,
//! `Processes` for a company), so an entry fetched for one parent can never
//! be served for another — the isolation is structural, not checked.
//!
//! # Coalescing
//!
//! Concurrent `get` calls for the same key while a fetch is in flight attach
//! to that fetch instead of issuing duplicate network calls. Waiters are
//! woken through a per-entry [`Notify`] once the fetch settles.
//!
//! # Failure
//!
//! A failed fetch leaves the entry in a `Failed` state: `get` serves an empty
//! option list (never an optional) and does **not** retry automatically.
//! Retry happens only on [`LookupCache::invalidate`] (manual refresh) or when
//! a parent-value change produces a fresh composite key.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Notify};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Categories of reference data served by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LookupCategory {
    /// Indian states.
    States,
    /// Cities, keyed by state.
    Cities,
    /// Localities (only meaningful for the gate city, see the cascade rules).
    Localities,
    /// Candidate qualifications.
    Qualifications,
    /// Job profiles.
    JobProfiles,
    /// Hiring companies.
    Companies,
    /// Processes, keyed by company.
    Processes,
}

impl LookupCategory {
    /// Returns the category as a stable path segment.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::States => "states",
            Self::Cities => "cities",
            Self::Localities => "localities",
            Self::Qualifications => "qualifications",
            Self::JobProfiles => "job-profiles",
            Self::Companies => "companies",
            Self::Processes => "processes",
        }
    }
}

impl fmt::Display for LookupCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Composite cache key: category plus the parent selection it was fetched for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupKey {
    /// The reference-data category.
    pub category: LookupCategory,
    /// Parent selection for keyed categories (`Cities`, `Processes`).
    pub parent: Option<String>,
}

impl LookupKey {
    /// Creates a key for an unkeyed category.
    #[must_use]
    pub fn plain(category: LookupCategory) -> Self {
        Self {
            category,
            parent: None,
        }
    }

    /// Creates a key for a category scoped to a parent selection.
    pub fn scoped(category: LookupCategory, parent: impl Into<String>) -> Self {
        Self {
            category,
            parent: Some(parent.into()),
        }
    }
}

/// A single selectable option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupOption {
    /// Stable option value submitted to the backend.
    pub value: String,
    /// Display label.
    pub label: String,
}

impl LookupOption {
    /// Creates an option whose label equals its value.
    pub fn plain(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }

    /// Creates an option with distinct value and label.
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Source of lookup data. Implemented by the persistence bridge adapter and
/// by scripted fetchers in tests.
#[async_trait]
pub trait LookupFetcher: Send + Sync {
    /// Fetches the option list for a category, optionally scoped to a parent.
    async fn fetch(
        &self,
        category: LookupCategory,
        parent: Option<&str>,
    ) -> Result<Vec<LookupOption>>;
}

/// Callback raised once per failed fetch so the UI can show a notification.
pub type LookupErrorSink = Arc<dyn Fn(&LookupKey, &Error) + Send + Sync>;

enum Slot {
    InFlight(Arc<Notify>),
    Ready(Arc<[LookupOption]>),
    Failed,
}

/// Memoizing, coalescing cache over a [`LookupFetcher`].
pub struct LookupCache {
    fetcher: Arc<dyn LookupFetcher>,
    slots: Mutex<HashMap<LookupKey, Slot>>,
    error_sink: Option<LookupErrorSink>,
}

impl LookupCache {
    /// Creates a cache over the given fetcher.
    pub fn new(fetcher: Arc<dyn LookupFetcher>) -> Self {
        Self {
            fetcher,
            slots: Mutex::new(HashMap::new()),
            error_sink: None,
        }
    }

    /// Sets the error notification sink raised once per failed fetch.
    #[must_use]
    pub fn with_error_sink(mut self, sink: LookupErrorSink) -> Self {
        self.error_sink = Some(sink);
        self
    }

    /// Returns the options for a key, fetching on first access.
    ///
    /// Never returns an optional: while a fetch is in flight the caller is
    /// suspended until it settles, and a failed entry yields an empty slice
    /// so dependent UI can render without branching on null.
    pub async fn get(&self, key: &LookupKey) -> Arc<[LookupOption]> {
        loop {
            let mut slots = self.slots.lock().await;
            match slots.get(key) {
                Some(Slot::Ready(options)) => return Arc::clone(options),
                Some(Slot::Failed) => return empty_options(),
                Some(Slot::InFlight(notify)) => {
                    let notify = Arc::clone(notify);
                    let notified = notify.notified();
                    tokio::pin!(notified);
                    // Register interest before releasing the lock so a
                    // completion between unlock and await cannot be missed.
                    notified.as_mut().enable();
                    drop(slots);
                    notified.await;
                }
                None => {
                    let notify = Arc::new(Notify::new());
                    slots.insert(key.clone(), Slot::InFlight(Arc::clone(&notify)));
                    drop(slots);
                    return self.run_fetch(key, &notify).await;
                }
            }
        }
    }

    /// Removes every entry for a category, across all parents.
    ///
    /// The next `get` for the category issues a fresh fetch. This is the only
    /// path by which a `Failed` entry becomes retryable.
    pub async fn invalidate(&self, category: LookupCategory) {
        let mut slots = self.slots.lock().await;
        slots.retain(|key, slot| {
            if key.category != category {
                return true;
            }
            // Wake any waiters attached to an in-flight fetch being dropped;
            // they will re-enter get() and start a fresh fetch.
            if let Slot::InFlight(notify) = slot {
                notify.notify_waiters();
            }
            false
        });
        debug!(category = %category, "lookup cache invalidated");
    }

    /// Number of settled (ready or failed) entries, for diagnostics.
    pub async fn settled_len(&self) -> usize {
        let slots = self.slots.lock().await;
        slots
            .values()
            .filter(|slot| !matches!(slot, Slot::InFlight(_)))
            .count()
    }

    async fn run_fetch(&self, key: &LookupKey, notify: &Arc<Notify>) -> Arc<[LookupOption]> {
        let outcome = self
            .fetcher
            .fetch(key.category, key.parent.as_deref())
            .await;

        let mut slots = self.slots.lock().await;
        // An invalidate that ran while the fetch was in flight removed our
        // slot; the result still answers this caller but must not be
        // committed over the pending refresh.
        let current = matches!(
            slots.get(key),
            Some(Slot::InFlight(pending)) if Arc::ptr_eq(pending, notify)
        );
        let options = match outcome {
            Ok(options) => {
                let options: Arc<[LookupOption]> = Arc::from(options);
                if current {
                    slots.insert(key.clone(), Slot::Ready(Arc::clone(&options)));
                }
                options
            }
            Err(err) => {
                warn!(category = %key.category, error = %err, "lookup fetch failed");
                if current {
                    if let Some(sink) = &self.error_sink {
                        sink(key, &err);
                    }
                    slots.insert(key.clone(), Slot::Failed);
                }
                empty_options()
            }
        };
        if !current {
            debug!(category = %key.category, "discarding fetch superseded by invalidate");
        }
        drop(slots);
        notify.notify_waiters();
        options
    }
}

fn empty_options() -> Arc<[LookupOption]> {
    Arc::from(Vec::new())
}
