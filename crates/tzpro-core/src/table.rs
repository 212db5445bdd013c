//! Cursor-based pagination over the `/tables/{name}` endpoints.
//!
//! A [`TableQuery`] requests pages of at most `limit` rows. Every row
//! carries a monotonically increasing `row_id`; the id of the last row of
//! a page becomes the `cursor` of the next request, so the server returns
//! only rows strictly after it. Iteration stops once a page comes back
//! shorter than the page size.

use std::marker::PhantomData;

use futures::stream::{self, Stream};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::brief;
use crate::client::Client;
use crate::error::CoreError;
use crate::policy::{self, FieldPolicy};
use crate::query::{FilterMode, Order, Query};

pub const DEFAULT_PAGE_SIZE: u32 = 500;

const ROW_ID: &str = "row_id";

/// A row type served by a table endpoint.
pub trait TableRow: DeserializeOwned + Send + 'static {
    /// Table name, used as `/tables/{TABLE}`.
    const TABLE: &'static str;

    /// Wire fields in column order, with their serialization policy.
    const FIELDS: &'static [FieldPolicy];

    /// Pagination key of this row.
    fn row_id(&self) -> u64;
}

/// Cursor of a fetched list: the `row_id` of its last row, or 0 when empty.
pub trait RowList {
    fn cursor(&self) -> u64;
}

impl<T: TableRow> RowList for [T] {
    fn cursor(&self) -> u64 {
        self.last().map_or(0, TableRow::row_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// No request issued yet, or restarted from a cursor.
    Ready,
    /// A request is in flight. A query left in this state by a dropped
    /// future behaves like `Ready`.
    Fetching,
    /// The last page was full; more rows may follow.
    HasPage,
    /// The last page was short or empty. Terminal.
    Exhausted,
}

/// Lazy, restartable, forward-only sequence of table pages.
///
/// Advancing requires `&mut self`, so a query has a single owner; clone the
/// [`Client`] instead of sharing a query between tasks.
pub struct TableQuery<T> {
    client: Client,
    table: String,
    query: Query,
    columns: Vec<String>,
    page_size: u32,
    cursor: Option<u64>,
    state: CursorState,
    _row: PhantomData<fn() -> T>,
}

impl<T: TableRow> TableQuery<T> {
    pub(crate) fn new(client: Client) -> Self {
        Self {
            client,
            table: T::TABLE.to_owned(),
            query: Query::new(),
            columns: policy::table_columns(T::FIELDS)
                .into_iter()
                .map(str::to_owned)
                .collect(),
            page_size: DEFAULT_PAGE_SIZE,
            cursor: None,
            state: CursorState::Ready,
            _row: PhantomData,
        }
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Rows per page. Zero is rejected when the first page is requested.
    pub fn with_limit(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Restart iteration after `cursor`, e.g. one saved from a previous run.
    pub fn with_cursor(mut self, cursor: u64) -> Self {
        self.cursor = Some(cursor);
        self.state = CursorState::Ready;
        self
    }

    /// Request only these columns. `row_id` is always added.
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.columns = columns.into_iter().map(|c| c.as_ref().to_owned()).collect();
        self
    }

    pub fn with_filter(mut self, column: &str, mode: FilterMode, value: impl ToString) -> Self {
        self.query = self.query.with_filter(column, mode, value);
        self
    }

    pub fn with_filter_list<I, S>(mut self, column: &str, mode: FilterMode, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.query = self.query.with_filter_list(column, mode, values);
        self
    }

    pub fn with_order(mut self, order: Order) -> Self {
        self.query = self.query.with_order(order);
        self
    }

    pub fn with_desc(self) -> Self {
        self.with_order(Order::Desc)
    }

    /// Any other server-side parameter (`verbose`, `prim`, ...).
    pub fn with_param(mut self, key: &str, value: impl ToString) -> Self {
        self.query.set(key, value);
        self
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// `row_id` of the last row seen, if any.
    pub fn cursor(&self) -> Option<u64> {
        self.cursor
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    fn request_columns(&self) -> Vec<String> {
        let mut columns = self.columns.clone();
        if !columns.iter().any(|c| c == ROW_ID) {
            columns.push(ROW_ID.to_owned());
        }
        columns
    }

    /// Path of the next page request.
    pub fn url(&self) -> String {
        let mut query = self
            .query
            .clone()
            .with_columns(self.request_columns())
            .with_limit(self.page_size);
        if let Some(cursor) = self.cursor {
            query.set("cursor", cursor);
        }
        query.render(&format!("/tables/{}", self.table))
    }

    // ========================================================================
    // Execution
    // ========================================================================

    fn check_page_size(&self) -> Result<(), CoreError> {
        if self.page_size == 0 {
            return Err(CoreError::Config(format!(
                "table `{}`: page size must be at least 1",
                self.table
            )));
        }
        Ok(())
    }

    async fn fetch(&self) -> Result<Vec<T>, CoreError> {
        let path = self.url();
        let body = self.client.get_raw(&path).await?;
        brief::decode_rows(&body, &self.request_columns(), T::FIELDS)
            .map_err(|e| CoreError::decode(&path, e))
    }

    /// Fetch one page at the current cursor without advancing.
    pub async fn run(&self) -> Result<Vec<T>, CoreError> {
        self.check_page_size()?;
        self.fetch().await
    }

    /// Fetch the next page, or `None` once the table is exhausted.
    ///
    /// On error the cursor and state are left as they were, so the call can
    /// simply be retried.
    pub async fn next_page(&mut self) -> Result<Option<Vec<T>>, CoreError> {
        if self.state == CursorState::Exhausted {
            return Ok(None);
        }
        self.check_page_size()?;

        let previous = match self.state {
            CursorState::Fetching => CursorState::Ready,
            other => other,
        };
        self.state = CursorState::Fetching;
        let rows = match self.fetch().await {
            Ok(rows) => rows,
            Err(err) => {
                self.state = previous;
                return Err(err);
            }
        };

        if let Some(last) = rows.last() {
            self.cursor = Some(last.row_id());
        }
        self.state = if rows.len() < self.page_size as usize {
            CursorState::Exhausted
        } else {
            CursorState::HasPage
        };
        debug!(
            table = %self.table,
            rows = rows.len(),
            cursor = ?self.cursor,
            state = ?self.state,
            "table page"
        );

        Ok((!rows.is_empty()).then_some(rows))
    }

    /// Drain every remaining page into one vector.
    pub async fn collect_all(mut self) -> Result<Vec<T>, CoreError> {
        let mut all = Vec::new();
        while let Some(rows) = self.next_page().await? {
            all.extend(rows);
        }
        Ok(all)
    }

    /// Pages as a `Stream`; the stream ends after the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<Vec<T>, CoreError>> {
        stream::try_unfold(self, |mut query| async move {
            Ok::<_, CoreError>(query.next_page().await?.map(|rows| (rows, query)))
        })
    }
}
