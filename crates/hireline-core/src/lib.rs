//! # hireline-core
//!
//! Client-side data and control flow for the Hireline recruitment
//! back-office: the caches, resolvers, and controllers that sit between UI
//! forms/tables and the backend REST API.
//!
//! This crate performs no network I/O itself. Everything that touches the
//! backend goes through the [`bridge::PersistenceBridge`] trait, implemented
//! by `hireline-client` in production and by `hireline-test-utils` in tests.
//!
//! - **Lookup cache**: memoized, coalescing reference data for dependent
//!   dropdowns ([`lookup`]).
//! - **Cascades**: state→city→locality and company→process resolution with
//!   stale-response discard ([`cascade`]).
//! - **Duplicate guard**: the debounced 10-digit phone probe with per-screen
//!   cap policies ([`dupcheck`]).
//! - **Forms**: declarative field schemas, the record draft, and the form
//!   controller ([`field`], [`draft`], [`form`]).
//! - **Tables**: the shared paging/search/filter/sort/selection controller
//!   ([`table`]).
//! - **Draft persistence**: the 2-hour-TTL draft store ([`draft_store`]).

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod bridge;
pub mod cascade;
pub mod draft;
pub mod draft_store;
pub mod dupcheck;
pub mod error;
pub mod field;
pub mod form;
pub mod lookup;
pub mod observability;
pub mod table;
pub mod theme;

pub use bridge::{
    BridgeLookupFetcher, BulkDetail, BulkOutcome, MutationAck, PageRequest, PagedResult,
    PersistenceBridge, RecordSummary, Resource,
};
pub use cascade::{
    refresh_child, resolve, CascadeRule, CascadeTicket, CascadeTracker, FieldDependency,
    Resolution, LOCALITY_GATE_CITY, OTHERS_SENTINEL,
};
pub use draft::{FieldError, RecordDraft};
pub use draft_store::{DraftStore, FileDraftStore, MemoryDraftStore, StoredDraft, DRAFT_TTL};
pub use dupcheck::{
    is_complete_phone, CapPolicy, CheckRequest, DuplicateCheck, DuplicateGuard, DuplicateState,
    PHONE_LENGTH,
};
pub use error::{Error, ErrorKind, Result};
pub use field::{FieldKind, FieldSpec, FormSchema, Requirement, SideEffect};
pub use form::{FieldChangeOutcome, FormMode, RecordFormController};
pub use lookup::{LookupCache, LookupCategory, LookupFetcher, LookupKey, LookupOption};
pub use table::{
    CountMode, DateGranularity, DateRange, SortDirection, TableConfig, TableQueryController,
    TableQueryState,
};
pub use theme::{Theme, ThemeStore};
