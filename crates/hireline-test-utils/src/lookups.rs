//! Scripted lookup fetchers with controllable completion order.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use hireline_core::{Error, LookupCategory, LookupFetcher, LookupOption, Result};

type Key = (LookupCategory, Option<String>);

#[derive(Default)]
struct Inner {
    data: HashMap<Key, Vec<LookupOption>>,
    gates: HashMap<Key, Arc<Semaphore>>,
    failures: HashMap<Key, String>,
    counts: HashMap<Key, u32>,
}

/// A [`LookupFetcher`] whose responses are scripted per key.
///
/// By default every fetch completes immediately with the seeded options
/// (or empty). A key can be *held*: fetches for it block until
/// [`ScriptedLookups::release`] opens the gate, which is how tests control
/// the completion order of overlapping requests (stale-response scenarios).
#[derive(Default)]
pub struct ScriptedLookups {
    inner: Mutex<Inner>,
}

impl ScriptedLookups {
    /// Creates an empty fetcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the options for a key.
    pub fn seed(&self, category: LookupCategory, parent: Option<&str>, options: Vec<LookupOption>) {
        self.lock().data.insert(key(category, parent), options);
    }

    /// Makes fetches for a key fail with a network error.
    pub fn fail(&self, category: LookupCategory, parent: Option<&str>, message: &str) {
        self.lock()
            .failures
            .insert(key(category, parent), message.to_string());
    }

    /// Clears a previously-configured failure for a key.
    pub fn heal(&self, category: LookupCategory, parent: Option<&str>) {
        self.lock().failures.remove(&key(category, parent));
    }

    /// Holds fetches for a key until [`Self::release`] is called.
    pub fn hold(&self, category: LookupCategory, parent: Option<&str>) {
        self.lock()
            .gates
            .insert(key(category, parent), Arc::new(Semaphore::new(0)));
    }

    /// Opens the gate for a held key; all pending and future fetches proceed.
    pub fn release(&self, category: LookupCategory, parent: Option<&str>) {
        if let Some(gate) = self.lock().gates.get(&key(category, parent)) {
            gate.add_permits(Semaphore::MAX_PERMITS / 2);
        }
    }

    /// Number of fetches issued for a key.
    pub fn fetches(&self, category: LookupCategory, parent: Option<&str>) -> u32 {
        self.lock()
            .counts
            .get(&key(category, parent))
            .copied()
            .unwrap_or(0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("scripted lookups poisoned")
    }
}

fn key(category: LookupCategory, parent: Option<&str>) -> Key {
    (category, parent.map(str::to_string))
}

#[async_trait]
impl LookupFetcher for ScriptedLookups {
    async fn fetch(
        &self,
        category: LookupCategory,
        parent: Option<&str>,
    ) -> Result<Vec<LookupOption>> {
        let key = key(category, parent);
        let gate = {
            let mut inner = self.lock();
            *inner.counts.entry(key.clone()).or_insert(0) += 1;
            inner.gates.get(&key).cloned()
        };
        if let Some(gate) = gate {
            let permit = gate.acquire().await.expect("gate never closed");
            permit.forget();
        }
        let inner = self.lock();
        if let Some(message) = inner.failures.get(&key) {
            return Err(Error::network(message.clone()));
        }
        Ok(inner.data.get(&key).cloned().unwrap_or_default())
    }
}
