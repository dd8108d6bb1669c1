//! In-memory persistence bridge with operation recording.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value};

use hireline_core::{
    BulkDetail, BulkOutcome, DuplicateCheck, Error, LookupCategory, LookupOption, MutationAck,
    PageRequest, PagedResult, PersistenceBridge, RecordSummary, Resource, Result,
};

/// A failure queued for injection into a backend operation.
#[derive(Debug, Clone)]
enum InjectedFailure {
    /// HTTP-status-shaped failure.
    Status(u16, String),
    /// Transport failure.
    Network(String),
}

impl InjectedFailure {
    fn into_error(self) -> Error {
        match self {
            Self::Status(status, message) => Error::from_status(status, message),
            Self::Network(message) => Error::network(message),
        }
    }
}

#[derive(Default)]
struct Inner {
    rows: HashMap<Resource, Vec<RecordSummary>>,
    by_id: HashMap<(Resource, String), Map<String, Value>>,
    duplicates: HashMap<String, DuplicateCheck>,
    lookups: HashMap<(LookupCategory, Option<String>), Vec<LookupOption>>,
    calls: HashMap<String, u32>,
    failures: HashMap<String, Vec<InjectedFailure>>,
    next_id: u32,
}

impl Inner {
    fn record_call(&mut self, op: &str) {
        *self.calls.entry(op.to_string()).or_insert(0) += 1;
    }

    fn take_failure(&mut self, op: &str) -> Option<InjectedFailure> {
        let queue = self.failures.get_mut(op)?;
        if queue.is_empty() {
            None
        } else {
            Some(queue.remove(0))
        }
    }
}

/// In-memory [`PersistenceBridge`] for tests.
///
/// Seed list rows, by-id records, duplicate outcomes, and lookup data; every
/// operation is counted, and failures can be queued per operation name
/// (`"list_paged"`, `"create"`, `"check_duplicate"`, …) to be consumed one
/// call at a time.
#[derive(Default)]
pub struct MemoryBackend {
    inner: Mutex<Inner>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the full server-side row set for a resource.
    pub fn seed_rows(&self, resource: Resource, rows: Vec<RecordSummary>) {
        self.lock().rows.insert(resource, rows);
    }

    /// Seeds a record served by `get_by_id`.
    pub fn seed_record(&self, resource: Resource, id: &str, record: Map<String, Value>) {
        self.lock().by_id.insert((resource, id.to_string()), record);
    }

    /// Seeds the duplicate-check outcome for a phone number.
    ///
    /// Unseeded numbers report [`DuplicateCheck::Clear`].
    pub fn seed_duplicate(&self, phone: &str, check: DuplicateCheck) {
        self.lock().duplicates.insert(phone.to_string(), check);
    }

    /// Seeds a lookup category's options.
    pub fn seed_lookup(
        &self,
        category: LookupCategory,
        parent: Option<&str>,
        options: Vec<LookupOption>,
    ) {
        self.lock()
            .lookups
            .insert((category, parent.map(str::to_string)), options);
    }

    /// Queues an HTTP-status-shaped failure for the next call to `op`.
    pub fn fail_with(&self, op: &str, status: u16, message: &str) {
        self.lock()
            .failures
            .entry(op.to_string())
            .or_default()
            .push(InjectedFailure::Status(status, message.to_string()));
    }

    /// Queues a transport failure for the next call to `op`.
    pub fn fail_network(&self, op: &str, message: &str) {
        self.lock()
            .failures
            .entry(op.to_string())
            .or_default()
            .push(InjectedFailure::Network(message.to_string()));
    }

    /// Number of calls made to `op` so far.
    pub fn calls(&self, op: &str) -> u32 {
        self.lock().calls.get(op).copied().unwrap_or(0)
    }

    /// The record stored for an id, if any (post-create/update inspection).
    pub fn stored(&self, resource: Resource, id: &str) -> Option<Map<String, Value>> {
        self.lock().by_id.get(&(resource, id.to_string())).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("memory backend poisoned")
    }

    fn begin(&self, op: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.record_call(op);
        match inner.take_failure(op) {
            Some(failure) => Err(failure.into_error()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PersistenceBridge for MemoryBackend {
    async fn list_paged(&self, resource: Resource, request: &PageRequest) -> Result<PagedResult> {
        self.begin("list_paged")?;
        let inner = self.lock();
        let all = inner.rows.get(&resource).cloned().unwrap_or_default();

        let search = request.search.to_ascii_lowercase();
        let matching: Vec<RecordSummary> = all
            .into_iter()
            .filter(|row| {
                search.is_empty()
                    || row.fields.values().any(|value| {
                        value
                            .as_str()
                            .is_some_and(|s| s.to_ascii_lowercase().contains(&search))
                    })
            })
            .collect();

        let total_count = matching.len() as u64;
        let page_size = request.page_size.max(1) as usize;
        let total_pages = matching.len().div_ceil(page_size) as u32;
        let start = (request.page.saturating_sub(1) as usize) * page_size;
        let items = matching.into_iter().skip(start).take(page_size).collect();

        Ok(PagedResult {
            items,
            total_count,
            total_pages,
        })
    }

    async fn get_by_id(&self, resource: Resource, id: &str) -> Result<Map<String, Value>> {
        self.begin("get_by_id")?;
        self.lock()
            .by_id
            .get(&(resource, id.to_string()))
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("{resource}/{id}")))
    }

    async fn create(
        &self,
        resource: Resource,
        payload: &Map<String, Value>,
    ) -> Result<MutationAck> {
        self.begin("create")?;
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = format!("{}-{}", resource, inner.next_id);
        inner
            .by_id
            .insert((resource, id.clone()), payload.clone());
        let mut record = payload.clone();
        record.insert("id".to_string(), Value::String(id));
        Ok(MutationAck {
            message: "Record created".to_string(),
            record: Some(record),
        })
    }

    async fn update(
        &self,
        resource: Resource,
        id: &str,
        payload: &Map<String, Value>,
    ) -> Result<MutationAck> {
        self.begin("update")?;
        let mut inner = self.lock();
        let key = (resource, id.to_string());
        if !inner.by_id.contains_key(&key) {
            return Err(Error::NotFound(format!("{resource}/{id}")));
        }
        inner.by_id.insert(key, payload.clone());
        Ok(MutationAck {
            message: "Record updated".to_string(),
            record: None,
        })
    }

    async fn check_duplicate(&self, phone: &str) -> Result<DuplicateCheck> {
        self.begin("check_duplicate")?;
        Ok(self
            .lock()
            .duplicates
            .get(phone)
            .cloned()
            .unwrap_or(DuplicateCheck::Clear))
    }

    async fn check_duplicate_by_field(
        &self,
        resource: Resource,
        field: &str,
        value: &str,
    ) -> Result<bool> {
        self.begin("check_duplicate_by_field")?;
        let inner = self.lock();
        Ok(inner
            .rows
            .get(&resource)
            .is_some_and(|rows| rows.iter().any(|row| row.field(field) == Some(value))))
    }

    async fn bulk_create(
        &self,
        resource: Resource,
        records: &[Map<String, Value>],
    ) -> Result<BulkOutcome> {
        self.begin("bulk_create")?;
        let mut inner = self.lock();
        let mut details = Vec::with_capacity(records.len());
        let mut successful = 0;
        for (index, record) in records.iter().enumerate() {
            let has_contact = record
                .get("contactNumber")
                .and_then(Value::as_str)
                .is_some_and(|s| !s.is_empty());
            let index = index as u32;
            if has_contact {
                inner.next_id += 1;
                let id = format!("{}-{}", resource, inner.next_id);
                inner.by_id.insert((resource, id), record.clone());
                successful += 1;
                details.push(BulkDetail {
                    index,
                    ok: true,
                    message: "created".to_string(),
                });
            } else {
                details.push(BulkDetail {
                    index,
                    ok: false,
                    message: "contact number is required".to_string(),
                });
            }
        }
        let total = records.len() as u32;
        Ok(BulkOutcome {
            successful,
            failed: total - successful,
            total,
            details,
        })
    }

    async fn lookup(
        &self,
        category: LookupCategory,
        parent: Option<&str>,
    ) -> Result<Vec<LookupOption>> {
        self.begin("lookup")?;
        Ok(self
            .lock()
            .lookups
            .get(&(category, parent.map(str::to_string)))
            .cloned()
            .unwrap_or_default())
    }
}
