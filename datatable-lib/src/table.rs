//! The table component: controller plus its two input adapters.

use crate::config::DataTableConfig;
use crate::config::NewAction;
use crate::controller::FetchHandle;
use crate::controller::TableController;
use crate::error::Error;
use crate::filter::FilterInput;
use crate::pagination::PaginationControl;
use crate::pagination::PaginationView;
use crate::sort::SortIndicator;
use crate::transport::HttpTransport;
use crate::transport::Transport;

/// A header cell ready to draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCell {
    /// Header text.
    pub header: String,
    /// Column accessor.
    pub accessor: String,
    /// Sort marker for this column.
    pub indicator: SortIndicator,
}

impl HeaderCell {
    /// Header text followed by the sort marker.
    pub fn label(&self) -> String {
        format!("{}{}", self.header, self.indicator.symbol())
    }
}

/// A server-paginated table wired to its filter and pagination inputs.
///
/// Edits to [`filter`](Self::filter) and clicks on
/// [`pagination`](Self::pagination) go straight to the controller; the
/// rendering layer reads [`TableController::display`] or subscribes to it.
///
/// # Example
///
/// ```ignore
/// let config = DataTableConfig::new(url, "users", columns)
///     .with_new_button_click(|| println!("create user"));
/// let table = DataTable::connect(config)?;
/// table.mount();
///
/// table.filter().set_text("ada");
/// table.pagination().change_rows_per_page(25);
/// ```
pub struct DataTable<T> {
    controller: TableController<T>,
    filter: FilterInput,
    pagination: PaginationControl,
    new_button_click: Option<NewAction>,
}

impl DataTable<HttpTransport> {
    /// Creates a table that talks to `config.url` over HTTP.
    pub fn connect(config: DataTableConfig) -> Result<Self, Error> {
        let mut builder = HttpTransport::builder().url(config.url.clone());
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let transport = builder.build()?;
        Ok(Self::new(config, transport))
    }
}

impl<T: Transport + 'static> DataTable<T> {
    /// Creates a table using `transport`.
    pub fn new(config: DataTableConfig, transport: T) -> Self {
        let controller = TableController::new(&config, transport);

        let filter = {
            let controller = controller.clone();
            FilterInput::new(config.filter_policy, move |text| {
                controller.set_filter(text);
            })
        };

        let pagination = {
            let controller = controller.clone();
            PaginationControl::new(config.page_size_options.clone(), move |change| {
                controller.apply(change);
            })
        };

        Self {
            controller,
            filter,
            pagination,
            new_button_click: config.new_button_click,
        }
    }

    /// Issues the initial fetch.
    pub fn mount(&self) -> Option<FetchHandle> {
        self.controller.mount()
    }

    /// Handles a click on the header at `index`.
    pub fn click_header(&self, index: usize) -> Option<FetchHandle> {
        let column = self.controller.columns().get(index)?;
        self.controller.toggle_sort(column)
    }
}

impl<T> DataTable<T> {
    /// The sync controller.
    pub fn controller(&self) -> &TableController<T> {
        &self.controller
    }

    /// The search input.
    pub fn filter(&self) -> &FilterInput {
        &self.filter
    }

    /// The pagination controls.
    pub fn pagination(&self) -> &PaginationControl {
        &self.pagination
    }

    /// Current pagination footer.
    pub fn pagination_view(&self) -> PaginationView {
        PaginationView::new(
            self.controller.page_request(),
            self.controller.display().total_records,
        )
    }

    /// Header cells in column order.
    pub fn header_cells(&self) -> Vec<HeaderCell> {
        let sort = self.controller.sort();
        self.controller
            .columns()
            .iter()
            .map(|column| HeaderCell {
                header: column.header.clone(),
                accessor: column.accessor.clone(),
                indicator: sort.indicator(column),
            })
            .collect()
    }

    /// Returns `true` if a "New" action is offered.
    pub fn has_new_button(&self) -> bool {
        self.new_button_click.is_some()
    }

    /// Runs the "New" action. Returns `false` when none is configured.
    pub fn click_new(&self) -> bool {
        match &self.new_button_click {
            Some(action) => {
                action();
                true
            }
            None => false,
        }
    }
}

impl<T> std::fmt::Debug for DataTable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataTable")
            .field("controller", &self.controller)
            .field("filter", &self.filter)
            .field("pagination", &self.pagination)
            .field("new_button", &self.has_new_button())
            .finish()
    }
}
