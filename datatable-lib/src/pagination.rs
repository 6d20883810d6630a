//! Page index/size state and the pagination control adapter.

use std::sync::Arc;

use crate::wire::page_count;

/// Rows-per-page choices offered by default.
pub const DEFAULT_PAGE_SIZE_OPTIONS: [usize; 3] = [5, 10, 25];

/// Page size used before the user picks one.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Which page of the current view is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    /// Zero-based page index.
    pub page_index: usize,
    /// Rows per page.
    pub page_size: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_SIZE)
    }
}

impl PageRequest {
    /// Creates a page request.
    pub fn new(page_index: usize, page_size: usize) -> Self {
        Self {
            page_index,
            page_size,
        }
    }

    /// Returns the offset of the first row, or `None` on overflow.
    pub fn offset(&self) -> Option<usize> {
        self.page_index.checked_mul(self.page_size)
    }
}

/// A change requested through the pagination controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageChange {
    /// Go to the given page index.
    Index(usize),
    /// Show this many rows per page, starting over at the first page.
    Size(usize),
}

type PageCallback = Arc<dyn Fn(PageChange) + Send + Sync>;

/// Translates page-control interaction into [`PageChange`] notifications.
///
/// Holds no page state of its own. Navigation helpers take the current
/// [`PaginationView`] and report the page they lead to.
#[derive(Clone)]
pub struct PaginationControl {
    options: Vec<usize>,
    on_change: PageCallback,
}

impl PaginationControl {
    /// Creates a control reporting to `on_change`.
    pub fn new<F>(options: Vec<usize>, on_change: F) -> Self
    where
        F: Fn(PageChange) + Send + Sync + 'static,
    {
        Self {
            options,
            on_change: Arc::new(on_change),
        }
    }

    /// Rows-per-page choices.
    pub fn rows_per_page_options(&self) -> &[usize] {
        &self.options
    }

    /// Reports a page index change.
    pub fn change_page(&self, page_index: usize) {
        (self.on_change)(PageChange::Index(page_index));
    }

    /// Reports a rows-per-page change. A size of zero is ignored.
    pub fn change_rows_per_page(&self, page_size: usize) {
        if page_size == 0 {
            log::warn!("Ignoring rows-per-page change to 0");
            return;
        }
        (self.on_change)(PageChange::Size(page_size));
    }

    /// Goes to the first page.
    pub fn first_page(&self, view: &PaginationView) {
        if view.has_previous() {
            self.change_page(0);
        }
    }

    /// Goes to the previous page.
    pub fn previous_page(&self, view: &PaginationView) {
        if view.has_previous() {
            self.change_page(view.page - 1);
        }
    }

    /// Goes to the next page.
    pub fn next_page(&self, view: &PaginationView) {
        if view.has_next() {
            self.change_page(view.page + 1);
        }
    }

    /// Goes to the last page.
    pub fn last_page(&self, view: &PaginationView) {
        if view.has_next() {
            self.change_page(view.last_page());
        }
    }
}

impl std::fmt::Debug for PaginationControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginationControl")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// What the pagination footer shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationView {
    /// Total rows matching the filter.
    pub count: u64,
    /// Current zero-based page.
    pub page: usize,
    /// Rows per page.
    pub rows_per_page: usize,
    /// Number of pages.
    pub page_count: u64,
}

impl PaginationView {
    /// Builds the view for `page` given the last known total.
    pub fn new(page: PageRequest, count: u64) -> Self {
        Self {
            count,
            page: page.page_index,
            rows_per_page: page.page_size,
            page_count: page_count(count, page.page_size),
        }
    }

    /// Index of the last page, zero when there are no rows.
    pub fn last_page(&self) -> usize {
        self.page_count.saturating_sub(1) as usize
    }

    /// Returns `true` if a page before the current one exists.
    pub fn has_previous(&self) -> bool {
        self.page > 0
    }

    /// Returns `true` if a page after the current one exists.
    pub fn has_next(&self) -> bool {
        (self.page as u64) + 1 < self.page_count
    }

    /// Label such as `"11–20 of 42"`.
    pub fn displayed_rows(&self) -> String {
        if self.count == 0 {
            return "0–0 of 0".to_string();
        }
        let from = (self.page as u64) * (self.rows_per_page as u64) + 1;
        let to = (from + self.rows_per_page as u64 - 1).min(self.count);
        format!("{}–{} of {}", from, to, self.count)
    }
}
