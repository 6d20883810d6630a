//! Table sync controller.
//!
//! Owns the page, sort and filter of the current view and keeps the
//! published [`DisplayState`] in step with the server. Every state change
//! issues exactly one fetch; each fetch is stamped with an epoch, and only a
//! resolution whose epoch is still current may touch the display.

use std::sync::Arc;
use std::sync::Mutex;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::column::ColumnSpec;
use crate::column::Row;
use crate::column::field_list;
use crate::config::DataTableConfig;
use crate::error::Error;
use crate::pagination::PageChange;
use crate::pagination::PageRequest;
use crate::sort::SortIndicator;
use crate::sort::SortSpec;
use crate::transport::Transport;
use crate::wire::TablePage;
use crate::wire::TableRequest;
use crate::wire::page_count;

/// Handle to a spawned fetch. Awaiting it waits until the result has been
/// applied or discarded; dropping it leaves the fetch running.
pub type FetchHandle = JoinHandle<()>;

/// Snapshot the rendering layer draws from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayState {
    /// Rows of the current page in server order.
    pub rows: Vec<Row>,
    /// Total rows matching the filter.
    pub total_records: u64,
    /// Pages available at the page size of the fetch that produced this.
    pub page_count: u64,
    /// A fetch is outstanding.
    pub loading: bool,
    /// Why the latest fetch failed, if it did. Cleared by the next success.
    pub error: Option<String>,
}

#[derive(Debug)]
struct SyncState {
    page: PageRequest,
    sort: SortSpec,
    filter: String,
    /// Epoch of the most recently issued fetch.
    epoch: u64,
}

struct ControllerInner<T> {
    table: String,
    columns: Vec<ColumnSpec>,
    fields: Vec<String>,
    transport: T,
    state: Mutex<SyncState>,
    display: watch::Sender<DisplayState>,
}

/// Keeps a server-paginated view and its displayed rows consistent.
///
/// Cheap to clone (uses `Arc` internally); clones drive the same table.
/// Fetches are spawned on the ambient tokio runtime.
///
/// # Example
///
/// ```ignore
/// let controller = TableController::new(&config, transport);
/// controller.mount();
///
/// let mut display = controller.subscribe();
/// controller.set_filter("ada");
/// let state = display.wait_for(|d| !d.loading).await?;
/// println!("{} matching rows", state.total_records);
/// ```
pub struct TableController<T> {
    inner: Arc<ControllerInner<T>>,
}

impl<T> Clone for TableController<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Transport + 'static> TableController<T> {
    /// Creates a controller for `config`. Nothing is fetched until
    /// [`mount`](Self::mount) or another transition.
    pub fn new(config: &DataTableConfig, transport: T) -> Self {
        let (display, _) = watch::channel(DisplayState::default());
        Self {
            inner: Arc::new(ControllerInner {
                table: config.table.clone(),
                fields: field_list(&config.columns),
                columns: config.columns.clone(),
                transport,
                state: Mutex::new(SyncState {
                    page: PageRequest::new(0, config.page_size),
                    sort: config.default_sort.clone(),
                    filter: String::new(),
                    epoch: 0,
                }),
                display,
            }),
        }
    }

    /// Issues the initial fetch.
    pub fn mount(&self) -> Option<FetchHandle> {
        self.refresh()
    }

    /// Re-fetches the current view unconditionally.
    pub fn refresh(&self) -> Option<FetchHandle> {
        self.transition(|_| true)
    }

    /// Applies new filter text.
    ///
    /// A different value also resets the page index to 0 in the same
    /// transition. The same value again is a no-op.
    pub fn set_filter(&self, text: &str) -> Option<FetchHandle> {
        self.transition(|state| {
            if state.filter == text {
                return false;
            }
            state.filter = text.to_string();
            state.page.page_index = 0;
            true
        })
    }

    /// Handles a click on `column`'s header.
    ///
    /// Non-sortable columns leave the sort alone and fetch nothing.
    pub fn toggle_sort(&self, column: &ColumnSpec) -> Option<FetchHandle> {
        self.transition(|state| match state.sort.toggled(column) {
            Some(sort) => {
                state.sort = sort;
                true
            }
            None => false,
        })
    }

    /// Moves to `page_index`.
    pub fn go_to_page(&self, page_index: usize) -> Option<FetchHandle> {
        self.transition(|state| {
            if state.page.page_index == page_index {
                return false;
            }
            state.page.page_index = page_index;
            true
        })
    }

    /// Sets the page size and returns to the first page in one transition.
    pub fn set_page_size(&self, page_size: usize) -> Option<FetchHandle> {
        if page_size == 0 {
            log::warn!("Ignoring page size 0 for table '{}'", self.inner.table);
            return None;
        }
        self.transition(|state| {
            let next = PageRequest::new(0, page_size);
            if state.page == next {
                return false;
            }
            state.page = next;
            true
        })
    }

    /// Applies a change reported by the pagination controls.
    pub fn apply(&self, change: PageChange) -> Option<FetchHandle> {
        match change {
            PageChange::Index(page_index) => self.go_to_page(page_index),
            PageChange::Size(page_size) => self.set_page_size(page_size),
        }
    }

    /// Runs `update` against the sync state and, if it reports a change,
    /// starts the fetch for the new state.
    fn transition(&self, update: impl FnOnce(&mut SyncState) -> bool) -> Option<FetchHandle> {
        let (epoch, page_size, request) = {
            let Ok(mut state) = self.inner.state.lock() else {
                log::error!("Sync state for table '{}' is poisoned", self.inner.table);
                return None;
            };
            if !update(&mut state) {
                return None;
            }

            state.epoch += 1;
            let request = TableRequest::build(
                &self.inner.table,
                state.page,
                &state.sort,
                &state.filter,
                &self.inner.fields,
            );
            (state.epoch, state.page.page_size, request)
        };

        let request = match request {
            Ok(request) => request,
            Err(e) => {
                log::error!("Fetch {} for table '{}' not sent: {}", epoch, self.inner.table, e);
                self.publish(epoch, |d| {
                    d.loading = false;
                    d.error = Some(e.to_string());
                });
                return None;
            }
        };
        self.publish(epoch, |d| d.loading = true);

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            self.resolve(epoch, page_size, Err(Error::NoRuntime));
            return None;
        };

        log::debug!(
            "Fetch {} for table '{}': start={} length={} sort={} {} filter={:?}",
            epoch,
            request.table,
            request.start,
            request.length,
            request.sort.column,
            request.sort.direction,
            request.search_clause,
        );

        let controller = self.clone();
        Some(runtime.spawn(async move {
            let result = controller.inner.transport.fetch(&request).await;
            controller.resolve(epoch, page_size, result);
        }))
    }

    /// Applies the outcome of fetch `epoch` if no newer fetch was issued.
    fn resolve(&self, epoch: u64, page_size: usize, result: Result<TablePage, Error>) {
        let applied = match result {
            Ok(page) => {
                let page_count = page_count(page.records_total, page_size);
                self.publish(epoch, move |d| {
                    *d = DisplayState {
                        rows: page.rows,
                        total_records: page.records_total,
                        page_count,
                        loading: false,
                        error: None,
                    };
                })
            }
            Err(e) => {
                log::error!("Fetch {} for table '{}' failed: {}", epoch, self.inner.table, e);
                self.publish(epoch, |d| {
                    d.loading = false;
                    d.error = Some(e.to_string());
                })
            }
        };

        if !applied {
            log::debug!("Discarding fetch {} for table '{}'", epoch, self.inner.table);
        }
    }

    /// Runs `update` on the display if `epoch` is still the latest fetch.
    ///
    /// The epoch is read under the watch lock, so the check and the write
    /// are one step. The state lock is only ever taken inside the watch
    /// lock, never the other way round.
    fn publish(&self, epoch: u64, update: impl FnOnce(&mut DisplayState)) -> bool {
        self.inner.display.send_if_modified(|display| {
            let current = match self.inner.state.lock() {
                Ok(state) => state.epoch,
                Err(_) => return false,
            };
            if current != epoch {
                return false;
            }
            update(display);
            true
        })
    }
}

impl<T> TableController<T> {
    /// Returns the current display snapshot.
    pub fn display(&self) -> DisplayState {
        self.inner.display.borrow().clone()
    }

    /// Subscribes to display updates.
    ///
    /// Drop any `borrow()` guard before calling a method that changes the
    /// view; publishing needs the write side of the same channel.
    pub fn subscribe(&self) -> watch::Receiver<DisplayState> {
        self.inner.display.subscribe()
    }

    /// Returns the requested page.
    pub fn page_request(&self) -> PageRequest {
        self.inner
            .state
            .lock()
            .map(|s| s.page)
            .unwrap_or_default()
    }

    /// Returns the active sort.
    pub fn sort(&self) -> SortSpec {
        self.inner
            .state
            .lock()
            .map(|s| s.sort.clone())
            .unwrap_or_default()
    }

    /// Returns the active filter text.
    pub fn filter_text(&self) -> String {
        self.inner
            .state
            .lock()
            .map(|s| s.filter.clone())
            .unwrap_or_default()
    }

    /// Returns the epoch of the most recently issued fetch.
    pub fn epoch(&self) -> u64 {
        self.inner.state.lock().map(|s| s.epoch).unwrap_or(0)
    }

    /// Returns the header marker for `column`.
    pub fn sort_indicator(&self, column: &ColumnSpec) -> SortIndicator {
        self.sort().indicator(column)
    }

    /// Returns the table identifier.
    pub fn table(&self) -> &str {
        &self.inner.table
    }

    /// Returns the column definitions.
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.inner.columns
    }

    /// Returns the field list sent with every request.
    pub fn fields(&self) -> &[String] {
        &self.inner.fields
    }
}

impl<T> std::fmt::Debug for TableController<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableController")
            .field("table", &self.inner.table)
            .field("fields", &self.inner.fields)
            .field("state", &self.inner.state)
            .finish_non_exhaustive()
    }
}
