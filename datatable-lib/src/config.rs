//! Table configuration supplied by the embedding application.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::column::ColumnSpec;
use crate::filter::FilterPolicy;
use crate::pagination::DEFAULT_PAGE_SIZE;
use crate::pagination::DEFAULT_PAGE_SIZE_OPTIONS;
use crate::sort::SortSpec;

/// Callback run when the user asks to create a new record.
pub type NewAction = Arc<dyn Fn() + Send + Sync>;

/// Configuration for a server-paginated table.
///
/// Everything except the "new" action can be loaded from JSON:
///
/// ```
/// use datatable_lib::DataTableConfig;
///
/// let config: DataTableConfig = serde_json::from_str(r#"{
///     "url": "https://example.com/api/table",
///     "table": "users",
///     "columns": [
///         { "header": "Id", "accessor": "id" },
///         { "header": "Name", "accessor": "name" }
///     ],
///     "page_size": 25
/// }"#).unwrap();
///
/// assert_eq!(config.page_size, 25);
/// assert!(config.new_button_click.is_none());
/// ```
#[derive(Clone, Deserialize)]
pub struct DataTableConfig {
    /// Column definitions, immutable once the table is mounted.
    pub columns: Vec<ColumnSpec>,
    /// Endpoint URL.
    pub url: String,
    /// Table identifier sent with every request.
    pub table: String,
    /// Create-record action; no "New" affordance is offered when absent.
    #[serde(skip)]
    pub new_button_click: Option<NewAction>,
    /// Initial rows per page.
    ///
    /// Default: 10
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Rows-per-page choices.
    ///
    /// Default: 5, 10, 25
    #[serde(default = "default_page_size_options")]
    pub page_size_options: Vec<usize>,
    /// Sort used before the user clicks a header.
    ///
    /// Default: `id` ascending
    #[serde(default)]
    pub default_sort: SortSpec,
    /// When filter edits are reported.
    #[serde(default)]
    pub filter_policy: FilterPolicy,
    /// Per-request timeout for the HTTP transport.
    #[serde(default, with = "optional_secs")]
    pub request_timeout: Option<Duration>,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_page_size_options() -> Vec<usize> {
    DEFAULT_PAGE_SIZE_OPTIONS.to_vec()
}

mod optional_secs {
    use std::time::Duration;

    use serde::Deserialize;
    use serde::Deserializer;
    use serde::de::Error;

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Option::<f64>::deserialize(d)?
            .map(|secs| Duration::try_from_secs_f64(secs).map_err(D::Error::custom))
            .transpose()
    }
}

impl DataTableConfig {
    /// Creates a config with default paging, sort and filter behavior.
    pub fn new(url: impl Into<String>, table: impl Into<String>, columns: Vec<ColumnSpec>) -> Self {
        Self {
            columns,
            url: url.into(),
            table: table.into(),
            new_button_click: None,
            page_size: DEFAULT_PAGE_SIZE,
            page_size_options: default_page_size_options(),
            default_sort: SortSpec::default(),
            filter_policy: FilterPolicy::default(),
            request_timeout: None,
        }
    }

    /// Sets the create-record action.
    pub fn with_new_button_click<F>(mut self, action: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.new_button_click = Some(Arc::new(action));
        self
    }

    /// Sets the initial page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the rows-per-page choices.
    pub fn with_page_size_options(mut self, options: impl Into<Vec<usize>>) -> Self {
        self.page_size_options = options.into();
        self
    }

    /// Sets the initial sort.
    pub fn with_default_sort(mut self, sort: SortSpec) -> Self {
        self.default_sort = sort;
        self
    }

    /// Sets the filter reporting policy.
    pub fn with_filter_policy(mut self, policy: FilterPolicy) -> Self {
        self.filter_policy = policy;
        self
    }

    /// Sets the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

impl std::fmt::Debug for DataTableConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataTableConfig")
            .field("columns", &self.columns)
            .field("url", &self.url)
            .field("table", &self.table)
            .field("new_button_click", &self.new_button_click.is_some())
            .field("page_size", &self.page_size)
            .field("page_size_options", &self.page_size_options)
            .field("default_sort", &self.default_sort)
            .field("filter_policy", &self.filter_policy)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
