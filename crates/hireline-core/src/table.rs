//! Generic table query controller for list screens.
//!
//! Every list page (call details, lineups, walk-ins, joinings) shares the
//! same behavior: server-side pagination and free-text search, client-side
//! multi-select column filters and date-range narrowing over the fetched
//! page, a flip-on-repeat sort toggle, and row selection keyed by record
//! identity. This module is the single parametrized implementation of that
//! pattern; screens differ only in their [`TableConfig`].
//!
//! # Count semantics
//!
//! Column filters narrow the page *after* server paging, so "total records"
//! is ambiguous. Each screen declares a [`CountMode`]: server-paged screens
//! report the server's pre-filter total, pure client-paginated screens
//! report the post-filter length. The mode is explicit so counts are always
//! consistent with it.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bridge::{PageRequest, PersistenceBridge, RecordSummary, Resource};
use crate::error::Result;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortDirection {
    /// Ascending order.
    Ascending,
    /// Descending order.
    Descending,
}

impl SortDirection {
    /// Returns the opposite direction.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// Granularity at which a date range is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateGranularity {
    /// Exact-day bounds.
    Day,
    /// Bounds truncated to calendar months.
    Month,
    /// Bounds truncated to calendar years.
    Year,
}

/// An inclusive date-range filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    /// Range start, inclusive.
    pub start: NaiveDate,
    /// Range end, inclusive.
    pub end: NaiveDate,
    /// Comparison granularity.
    pub granularity: DateGranularity,
}

impl DateRange {
    /// Returns true when `date` falls within the range at its granularity.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        let (date, start, end) = match self.granularity {
            DateGranularity::Day => (date, self.start, self.end),
            DateGranularity::Month => (
                truncate_to_month(date),
                truncate_to_month(self.start),
                truncate_to_month(self.end),
            ),
            DateGranularity::Year => (
                truncate_to_year(date),
                truncate_to_year(self.start),
                truncate_to_year(self.end),
            ),
        };
        date >= start && date <= end
    }
}

fn truncate_to_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn truncate_to_year(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date)
}

/// How the displayed total is computed for a screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountMode {
    /// Report the server's total across all pages (pre-column-filter).
    ServerTotal,
    /// Report the post-filter length of the fetched list (pure
    /// client-paginated screens).
    FilteredLength,
}

/// The full query state for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQueryState {
    /// 1-based page index.
    pub page: u32,
    /// Records per page.
    pub page_size: u32,
    /// Active sort, if any.
    pub sort: Option<(String, SortDirection)>,
    /// Free-text search sent to the server.
    pub search: String,
    /// Per-column selected filter values (all active columns must match).
    pub column_filters: BTreeMap<String, BTreeSet<String>>,
    /// Active date range over the screen's designated date column.
    pub date_range: Option<DateRange>,
}

impl TableQueryState {
    /// Default state for the given page size.
    #[must_use]
    pub fn with_page_size(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size,
            sort: None,
            search: String::new(),
            column_filters: BTreeMap::new(),
            date_range: None,
        }
    }

    fn page_request(&self) -> PageRequest {
        PageRequest {
            page: self.page,
            page_size: self.page_size,
            search: self.search.clone(),
        }
    }
}

/// Per-screen configuration.
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Records per page.
    pub page_size: u32,
    /// Count semantics for the screen.
    pub count_mode: CountMode,
    /// Column the date-range filter applies to, if the screen has one.
    pub date_column: Option<String>,
}

impl TableConfig {
    /// Server-paged screen with the given page size and no date column.
    #[must_use]
    pub fn server_paged(page_size: u32) -> Self {
        Self {
            page_size,
            count_mode: CountMode::ServerTotal,
            date_column: None,
        }
    }

    /// Pure client-paginated screen.
    #[must_use]
    pub fn client_paged(page_size: u32) -> Self {
        Self {
            page_size,
            count_mode: CountMode::FilteredLength,
            date_column: None,
        }
    }

    /// Sets the designated date column.
    #[must_use]
    pub fn with_date_column(mut self, column: impl Into<String>) -> Self {
        self.date_column = Some(column.into());
        self
    }
}

/// Paging, sort, search, filter, and selection state for one list screen.
pub struct TableQueryController {
    resource: Resource,
    bridge: Arc<dyn PersistenceBridge>,
    config: TableConfig,
    state: TableQueryState,
    fetched: Vec<RecordSummary>,
    server_total: u64,
    server_pages: u32,
    selection: BTreeSet<String>,
    refresh_key: u64,
}

impl TableQueryController {
    /// Creates a controller with default state and no data yet; call
    /// [`Self::refresh`] to load the first page.
    pub fn new(
        resource: Resource,
        bridge: Arc<dyn PersistenceBridge>,
        config: TableConfig,
    ) -> Self {
        let state = TableQueryState::with_page_size(config.page_size);
        Self {
            resource,
            bridge,
            config,
            state,
            fetched: Vec::new(),
            server_total: 0,
            server_pages: 0,
            selection: BTreeSet::new(),
            refresh_key: 0,
        }
    }

    /// Current query state.
    #[must_use]
    pub fn state(&self) -> &TableQueryState {
        &self.state
    }

    /// Monotonic counter incremented on every server fetch.
    #[must_use]
    pub fn refresh_key(&self) -> u64 {
        self.refresh_key
    }

    /// Re-fetches the current page from the server.
    pub async fn refresh(&mut self) -> Result<()> {
        let request = self.state.page_request();
        let result = self.bridge.list_paged(self.resource, &request).await?;
        debug!(
            resource = %self.resource,
            page = request.page,
            items = result.items.len(),
            total = result.total_count,
            "table page fetched"
        );
        self.fetched = result.items;
        self.server_total = result.total_count;
        self.server_pages = result.total_pages;
        self.refresh_key += 1;
        Ok(())
    }

    /// Moves to a page and re-fetches.
    pub async fn set_page(&mut self, page: u32) -> Result<()> {
        self.state.page = page.max(1);
        self.refresh().await
    }

    /// Sets the free-text search, resets to page 1, clears the selection,
    /// and re-fetches.
    pub async fn set_search(&mut self, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        if self.state.search == text {
            return Ok(());
        }
        self.state.search = text;
        self.state.page = 1;
        self.selection.clear();
        self.refresh().await
    }

    /// Toggles the sort: same field flips direction, a new field starts
    /// ascending. Sorting is applied over the fetched page; no re-fetch.
    pub fn set_sort(&mut self, field: impl Into<String>) {
        let field = field.into();
        self.state.sort = match self.state.sort.take() {
            Some((current, direction)) if current == field => {
                Some((current, direction.flipped()))
            }
            _ => Some((field, SortDirection::Ascending)),
        };
    }

    /// Toggles a column filter value, resets to page 1, and clears the
    /// selection. Re-fetches only when the page actually moved (filters are
    /// applied client-side over the fetched page).
    pub async fn toggle_column_filter(
        &mut self,
        column: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<()> {
        let column = column.into();
        let value = value.into();
        let values = self.state.column_filters.entry(column.clone()).or_default();
        if !values.remove(&value) {
            values.insert(value);
        }
        if values.is_empty() {
            self.state.column_filters.remove(&column);
        }
        self.selection.clear();
        self.after_filter_change().await
    }

    /// Sets the date range, resets to page 1, and clears the selection.
    pub async fn set_date_range(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
        granularity: DateGranularity,
    ) -> Result<()> {
        self.state.date_range = Some(DateRange {
            start,
            end,
            granularity,
        });
        self.selection.clear();
        self.after_filter_change().await
    }

    /// Clears the date range, resets to page 1, and clears the selection.
    pub async fn clear_date_range(&mut self) -> Result<()> {
        if self.state.date_range.take().is_none() {
            return Ok(());
        }
        self.selection.clear();
        self.after_filter_change().await
    }

    /// Restores every query field to its default in one atomic update and
    /// triggers exactly one re-fetch.
    pub async fn reset(&mut self) -> Result<()> {
        self.state = TableQueryState::with_page_size(self.config.page_size);
        self.selection.clear();
        self.refresh().await
    }

    /// The currently displayed rows: the fetched page narrowed by column
    /// filters and date range, then sorted.
    #[must_use]
    pub fn current_page(&self) -> Vec<&RecordSummary> {
        let mut rows: Vec<&RecordSummary> = self
            .fetched
            .iter()
            .filter(|row| self.matches_filters(row))
            .collect();
        if let Some((field, direction)) = &self.state.sort {
            rows.sort_by(|a, b| {
                let ordering = compare_field(a, b, field);
                match direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }
        rows
    }

    /// The total shown to the user, per the screen's [`CountMode`].
    #[must_use]
    pub fn displayed_total(&self) -> u64 {
        match self.config.count_mode {
            CountMode::ServerTotal => self.server_total,
            CountMode::FilteredLength => self.current_page().len() as u64,
        }
    }

    /// Server-side page count.
    #[must_use]
    pub fn total_pages(&self) -> u32 {
        self.server_pages
    }

    /// Toggles a row's selection by record identity.
    pub fn toggle_select(&mut self, id: &str) {
        if !self.selection.remove(id) {
            self.selection.insert(id.to_string());
        }
    }

    /// Selects every currently-visible row (the post-filter page only,
    /// never the full server-side result set).
    pub fn select_all_visible(&mut self) {
        let ids: Vec<String> = self
            .current_page()
            .iter()
            .map(|row| row.id.clone())
            .collect();
        self.selection.extend(ids);
    }

    /// Clears the selection.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// The selected record identities.
    #[must_use]
    pub fn selection(&self) -> &BTreeSet<String> {
        &self.selection
    }

    async fn after_filter_change(&mut self) -> Result<()> {
        if self.state.page != 1 {
            self.state.page = 1;
            return self.refresh().await;
        }
        Ok(())
    }

    fn matches_filters(&self, row: &RecordSummary) -> bool {
        for (column, values) in &self.state.column_filters {
            let Some(actual) = row.field(column) else {
                return false;
            };
            // Exact string equality, case-insensitive. Not substring match.
            if !values.iter().any(|v| v.eq_ignore_ascii_case(actual)) {
                return false;
            }
        }
        if let (Some(range), Some(column)) =
            (&self.state.date_range, self.config.date_column.as_deref())
        {
            match row.date_field(column) {
                Some(date) if range.contains(date) => {}
                _ => return false,
            }
        }
        true
    }
}

fn compare_field(a: &RecordSummary, b: &RecordSummary, field: &str) -> Ordering {
    a.field(field).unwrap_or("").cmp(b.field(field).unwrap_or(""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_direction_flips() {
        assert_eq!(
            SortDirection::Ascending.flipped(),
            SortDirection::Descending
        );
    }

    #[test]
    fn date_range_granularities() {
        let range = DateRange {
            start: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 3, 20).unwrap(),
            granularity: DateGranularity::Day,
        };
        assert!(range.contains(NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2025, 1, 14).unwrap()));

        let monthly = DateRange {
            granularity: DateGranularity::Month,
            ..range.clone()
        };
        // Jan 2 is outside day bounds but inside the January month bucket.
        assert!(monthly.contains(NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()));
        assert!(!monthly.contains(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()));

        let yearly = DateRange {
            granularity: DateGranularity::Year,
            ..range
        };
        assert!(yearly.contains(NaiveDate::from_ymd_opt(2025, 12, 25).unwrap()));
        assert!(!yearly.contains(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()));
    }
}
