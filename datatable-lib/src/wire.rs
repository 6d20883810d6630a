//! Request and response bodies exchanged with the table endpoint.

use serde::Deserialize;
use serde::Serialize;

use crate::column::Row;
use crate::error::ApiError;
use crate::error::Error;
use crate::pagination::PageRequest;
use crate::sort::SortSpec;

/// Body POSTed to the endpoint for one page of rows.
///
/// ```json
/// {
///   "_table": "users",
///   "_start": 20,
///   "_length": 10,
///   "_sort": { "_column": "id", "_direction": "asc" },
///   "_searchClause": "",
///   "_columns": ["id", "name"]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRequest {
    /// Table identifier.
    #[serde(rename = "_table")]
    pub table: String,
    /// Offset of the first row.
    #[serde(rename = "_start")]
    pub start: usize,
    /// Number of rows requested.
    #[serde(rename = "_length")]
    pub length: usize,
    /// Active sort.
    #[serde(rename = "_sort")]
    pub sort: SortSpec,
    /// Free-text filter, empty for none.
    #[serde(rename = "_searchClause")]
    pub search_clause: String,
    /// Deduplicated field accessors.
    #[serde(rename = "_columns")]
    pub columns: Vec<String>,
}

impl TableRequest {
    /// Builds the request for `page` of the sorted, filtered view.
    ///
    /// Fails when the page size is zero, the offset does not fit in a
    /// `usize`, or the table identifier is empty.
    pub fn build(
        table: &str,
        page: PageRequest,
        sort: &SortSpec,
        filter: &str,
        fields: &[String],
    ) -> Result<Self, Error> {
        if table.is_empty() {
            return Err(Error::invalid_request("table identifier is empty"));
        }
        if page.page_size == 0 {
            return Err(Error::invalid_request("page size must be positive"));
        }
        let start = page.offset().ok_or_else(|| {
            Error::invalid_request(format!(
                "offset overflows for page {} of size {}",
                page.page_index, page.page_size
            ))
        })?;

        Ok(Self {
            table: table.to_string(),
            start,
            length: page.page_size,
            sort: sort.clone(),
            search_clause: filter.to_string(),
            columns: fields.to_vec(),
        })
    }
}

/// Body returned by the endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TableResponse {
    /// Rows of the requested page.
    pub data: Vec<Row>,
    /// Total rows matching the filter.
    pub records_total: u64,
}

impl TableResponse {
    /// Parses a response body, treating any other shape as a parse error.
    pub fn from_body(body: &str) -> Result<Self, ApiError> {
        serde_json::from_str(body).map_err(|e| ApiError::parse_with_body(e.to_string(), body))
    }
}

/// One fetched page of rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TablePage {
    /// Rows in server order.
    pub rows: Vec<Row>,
    /// Total rows matching the filter across all pages.
    pub records_total: u64,
}

impl TablePage {
    /// Creates a page.
    pub fn new(rows: Vec<Row>, records_total: u64) -> Self {
        Self { rows, records_total }
    }
}

impl From<TableResponse> for TablePage {
    fn from(response: TableResponse) -> Self {
        Self {
            rows: response.data,
            records_total: response.records_total,
        }
    }
}

/// Number of pages needed to show `records_total` rows, `page_size` at a time.
pub fn page_count(records_total: u64, page_size: usize) -> u64 {
    if page_size == 0 {
        return 0;
    }
    records_total.div_ceil(page_size as u64)
}
