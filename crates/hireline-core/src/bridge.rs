//! The persistence bridge: the only seam to the backend.
//!
//! [`PersistenceBridge`] is an async trait with one method per backend
//! operation. Implementations perform no retries — retry policy, if any,
//! belongs to the caller — and surface failures as the structured
//! [`crate::error::Error`] taxonomy so the UI can dispatch on the kind
//! (`NotFound`, `Locked`, `ValidationFailed`, `Server`, `Network`).
//!
//! The production implementation lives in the `hireline-client` crate; tests
//! use the in-memory backend from `hireline-test-utils`.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::dupcheck::DuplicateCheck;
use crate::error::Result;
use crate::lookup::{LookupCategory, LookupFetcher, LookupOption};

/// Backend resources addressed by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resource {
    /// Candidate call records (intake + call-details list).
    CallDetails,
    /// Scheduled interview lineups.
    Lineups,
    /// Walk-in visits.
    Walkins,
    /// Employment-start records.
    Joinings,
    /// Leave requests.
    Leaves,
    /// Employee profiles.
    Employees,
}

impl Resource {
    /// Returns the resource as a stable path segment.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CallDetails => "call-details",
            Self::Lineups => "lineups",
            Self::Walkins => "walkins",
            Self::Joinings => "joinings",
            Self::Leaves => "leaves",
            Self::Employees => "employees",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The server-handled subset of a table query: page, size, free-text search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    /// 1-based page index.
    pub page: u32,
    /// Records per page.
    pub page_size: u32,
    /// Free-text search, empty for none.
    pub search: String,
}

impl PageRequest {
    /// First page with the given size and no search.
    #[must_use]
    pub fn first(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size,
            search: String::new(),
        }
    }
}

/// One row of a paged list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSummary {
    /// Backend-owned record identity.
    pub id: String,
    /// Flat column values.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl RecordSummary {
    /// Creates a summary with the given id and no fields.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    /// Builder-style field insertion.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), Value::String(value.into()));
        self
    }

    /// Returns a column's string value, if present.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// Parses a column as an ISO date, if present and well-formed.
    #[must_use]
    pub fn date_field(&self, name: &str) -> Option<NaiveDate> {
        self.field(name)
            .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
    }
}

/// One page of results for a [`PageRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult {
    /// The page's records.
    pub items: Vec<RecordSummary>,
    /// Server-side total across all pages (pre-column-filter).
    pub total_count: u64,
    /// Server-side page count.
    pub total_pages: u32,
}

/// Acknowledgement for a create/update mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationAck {
    /// Backend message, surfaced verbatim.
    pub message: String,
    /// The created/updated record, when the backend returns it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<Map<String, Value>>,
}

/// Per-record detail of a bulk create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDetail {
    /// Index of the record in the submitted batch.
    pub index: u32,
    /// Whether this record was created.
    pub ok: bool,
    /// Backend message for this record.
    pub message: String,
}

/// Outcome of a bulk create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOutcome {
    /// Records created.
    pub successful: u32,
    /// Records rejected.
    pub failed: u32,
    /// Records submitted.
    pub total: u32,
    /// Per-record details.
    pub details: Vec<BulkDetail>,
}

/// Thin async interface to the backend CRUD/list endpoints.
#[async_trait]
pub trait PersistenceBridge: Send + Sync {
    /// Fetches one page of a resource list.
    async fn list_paged(&self, resource: Resource, request: &PageRequest) -> Result<PagedResult>;

    /// Fetches a single record by id.
    async fn get_by_id(&self, resource: Resource, id: &str) -> Result<Map<String, Value>>;

    /// Creates a record.
    async fn create(&self, resource: Resource, payload: &Map<String, Value>)
        -> Result<MutationAck>;

    /// Updates a record.
    async fn update(
        &self,
        resource: Resource,
        id: &str,
        payload: &Map<String, Value>,
    ) -> Result<MutationAck>;

    /// Probes for an existing locked/active record by phone number.
    async fn check_duplicate(&self, phone: &str) -> Result<DuplicateCheck>;

    /// Probes for an existing record by an arbitrary field.
    async fn check_duplicate_by_field(
        &self,
        resource: Resource,
        field: &str,
        value: &str,
    ) -> Result<bool>;

    /// Creates a batch of records in one call.
    async fn bulk_create(
        &self,
        resource: Resource,
        records: &[Map<String, Value>],
    ) -> Result<BulkOutcome>;

    /// Fetches a lookup category's options, optionally scoped to a parent.
    async fn lookup(
        &self,
        category: LookupCategory,
        parent: Option<&str>,
    ) -> Result<Vec<LookupOption>>;
}

/// Adapts a [`PersistenceBridge`] to the [`LookupFetcher`] seam used by the
/// lookup cache.
pub struct BridgeLookupFetcher {
    bridge: Arc<dyn PersistenceBridge>,
}

impl BridgeLookupFetcher {
    /// Wraps a bridge.
    #[must_use]
    pub fn new(bridge: Arc<dyn PersistenceBridge>) -> Self {
        Self { bridge }
    }
}

#[async_trait]
impl LookupFetcher for BridgeLookupFetcher {
    async fn fetch(
        &self,
        category: LookupCategory,
        parent: Option<&str>,
    ) -> Result<Vec<LookupOption>> {
        self.bridge.lookup(category, parent).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_summary_field_access() {
        let row = RecordSummary::new("cd-1")
            .with_field("callStatus", "Lineup")
            .with_field("lineupDate", "2025-01-10")
            .with_field("walkinDate", "not-a-date");

        assert_eq!(row.field("callStatus"), Some("Lineup"));
        assert_eq!(
            row.date_field("lineupDate"),
            NaiveDate::from_ymd_opt(2025, 1, 10)
        );
        assert_eq!(row.date_field("walkinDate"), None);
        assert_eq!(row.field("missing"), None);
    }

    #[test]
    fn resource_path_segments() {
        assert_eq!(Resource::CallDetails.as_str(), "call-details");
        assert_eq!(Resource::Joinings.to_string(), "joinings");
    }
}
