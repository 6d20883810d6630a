//! Fetch sequencing tests for the table controller.
//!
//! The scripted transport parks every request until the test answers it, so
//! responses can be delivered in any order.

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use datatable_lib::ColumnSpec;
use datatable_lib::DataTable;
use datatable_lib::DataTableConfig;
use datatable_lib::Direction;
use datatable_lib::Row;
use datatable_lib::SortSpec;
use datatable_lib::TableController;
use datatable_lib::error::ApiError;
use datatable_lib::error::Error;
use datatable_lib::pagination::PageChange;
use datatable_lib::sort::SortIndicator;
use datatable_lib::transport::Transport;
use datatable_lib::wire::TablePage;
use datatable_lib::wire::TableRequest;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::sync::oneshot;

// =============================================================================
// Scripted transport
// =============================================================================

struct Call {
    request: TableRequest,
    reply: oneshot::Sender<Result<TablePage, Error>>,
}

impl Call {
    fn respond(self, page: TablePage) {
        let _ = self.reply.send(Ok(page));
    }

    fn fail(self, err: Error) {
        let _ = self.reply.send(Err(err));
    }
}

struct Scripted {
    calls: mpsc::UnboundedSender<Call>,
}

impl Scripted {
    fn new() -> (Self, mpsc::UnboundedReceiver<Call>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { calls: tx }, rx)
    }
}

#[async_trait]
impl Transport for Scripted {
    async fn fetch(&self, request: &TableRequest) -> Result<TablePage, Error> {
        let (reply, answer) = oneshot::channel();
        let call = Call {
            request: request.clone(),
            reply,
        };
        if self.calls.send(call).is_err() {
            return Err(ApiError::http(503, "test finished").into());
        }
        answer
            .await
            .unwrap_or_else(|_| Err(ApiError::http(503, "reply dropped").into()))
    }
}

fn columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new("Id", "id"),
        ColumnSpec::new("Name", "name"),
        ColumnSpec::new("Full name", "name"),
        ColumnSpec::new("Email", "email"),
        ColumnSpec::actions(),
    ]
}

fn config() -> DataTableConfig {
    DataTableConfig::new("http://localhost/api/table", "users", columns())
}

fn rows(tag: &str, count: usize) -> Vec<Row> {
    (0..count)
        .map(|i| serde_json::from_value(json!({ "id": i, "name": format!("{tag}-{i}") })).unwrap())
        .collect()
}

fn page(tag: &str, count: usize, total: u64) -> TablePage {
    TablePage::new(rows(tag, count), total)
}

// =============================================================================
// Initial fetch
// =============================================================================

#[tokio::test]
async fn test_mount_sends_initial_request_and_applies_response() {
    let (transport, mut calls) = Scripted::new();
    let controller = TableController::new(&config(), transport);

    let handle = controller.mount().expect("fetch should start");
    assert!(controller.display().loading);

    let call = calls.recv().await.unwrap();
    assert_eq!(
        serde_json::to_value(&call.request).unwrap(),
        json!({
            "_table": "users",
            "_start": 0,
            "_length": 10,
            "_sort": { "_column": "id", "_direction": "asc" },
            "_searchClause": "",
            "_columns": ["id", "name", "email", "actions"],
        })
    );

    call.respond(page("first", 10, 42));
    handle.await.unwrap();

    let display = controller.display();
    assert_eq!(display.rows.len(), 10);
    assert_eq!(display.total_records, 42);
    assert_eq!(display.page_count, 5);
    assert!(!display.loading);
}

// =============================================================================
// Stale-result suppression
// =============================================================================

#[tokio::test]
async fn test_only_last_issued_fetch_is_applied() {
    let (transport, mut calls) = Scripted::new();
    let controller = TableController::new(&config(), transport);

    let first = controller.mount().unwrap();
    let second = controller.go_to_page(1).unwrap();
    let third = controller.set_filter("ab").unwrap();

    let c1 = calls.recv().await.unwrap();
    let c2 = calls.recv().await.unwrap();
    let c3 = calls.recv().await.unwrap();
    assert_eq!(c2.request.start, 10);
    assert_eq!(c3.request.search_clause, "ab");

    c3.respond(page("third", 3, 3));
    third.await.unwrap();
    let applied = controller.display();
    assert_eq!(applied.rows[0].cell_text("name"), "third-0");
    assert!(!applied.loading);

    c1.respond(page("first", 10, 42));
    first.await.unwrap();
    c2.respond(page("second", 10, 42));
    second.await.unwrap();

    assert_eq!(controller.display(), applied);
}

#[tokio::test]
async fn test_staleness_holds_for_every_resolution_order() {
    let orders: [[usize; 3]; 6] = [
        [0, 1, 2],
        [0, 2, 1],
        [1, 0, 2],
        [1, 2, 0],
        [2, 0, 1],
        [2, 1, 0],
    ];

    for order in orders {
        let (transport, mut calls) = Scripted::new();
        let controller = TableController::new(&config(), transport);

        let mut handles = vec![
            controller.mount().unwrap(),
            controller.set_filter("a").unwrap(),
            controller.set_filter("ab").unwrap(),
        ];
        let mut pending = Vec::new();
        for _ in 0..3 {
            pending.push(Some(calls.recv().await.unwrap()));
        }

        for index in order {
            let call = pending[index].take().unwrap();
            call.respond(page(&format!("fetch{index}"), 1, index as u64 + 1));
        }
        for handle in handles.drain(..) {
            handle.await.unwrap();
        }

        let display = controller.display();
        assert_eq!(display.rows[0].cell_text("name"), "fetch2-0", "order {order:?}");
        assert_eq!(display.total_records, 3, "order {order:?}");
        assert!(!display.loading, "order {order:?}");
    }
}

#[tokio::test]
async fn test_stale_response_leaves_loading_for_newer_fetch() {
    let (transport, mut calls) = Scripted::new();
    let controller = TableController::new(&config(), transport);

    let first = controller.mount().unwrap();
    let second = controller.go_to_page(2).unwrap();
    let c1 = calls.recv().await.unwrap();
    let c2 = calls.recv().await.unwrap();

    c1.respond(page("first", 10, 42));
    first.await.unwrap();
    let display = controller.display();
    assert!(display.loading);
    assert!(display.rows.is_empty());

    c2.respond(page("second", 10, 42));
    second.await.unwrap();
    assert!(!controller.display().loading);
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_failure_keeps_rows_and_clears_loading() {
    let (transport, mut calls) = Scripted::new();
    let controller = TableController::new(&config(), transport);

    let handle = controller.mount().unwrap();
    calls.recv().await.unwrap().respond(page("first", 10, 42));
    handle.await.unwrap();

    let handle = controller.go_to_page(1).unwrap();
    calls
        .recv()
        .await
        .unwrap()
        .fail(ApiError::http(500, "boom").into());
    handle.await.unwrap();

    let display = controller.display();
    assert_eq!(display.rows[0].cell_text("name"), "first-0");
    assert_eq!(display.total_records, 42);
    assert!(!display.loading);
    assert!(display.error.as_deref().unwrap().contains("500"));

    let handle = controller.go_to_page(2).unwrap();
    calls.recv().await.unwrap().respond(page("third", 10, 42));
    handle.await.unwrap();
    assert_eq!(controller.display().error, None);
}

#[tokio::test]
async fn test_stale_failure_is_ignored() {
    let (transport, mut calls) = Scripted::new();
    let controller = TableController::new(&config(), transport);

    let first = controller.mount().unwrap();
    let second = controller.set_filter("x").unwrap();
    let c1 = calls.recv().await.unwrap();
    let c2 = calls.recv().await.unwrap();

    c1.fail(ApiError::parse("unexpected body").into());
    first.await.unwrap();
    assert!(controller.display().loading);

    c2.respond(page("second", 2, 2));
    second.await.unwrap();
    let display = controller.display();
    assert_eq!(display.total_records, 2);
    assert_eq!(display.error, None);
}

#[tokio::test]
async fn test_current_failure_then_stale_success_reports_error() {
    let (transport, mut calls) = Scripted::new();
    let controller = TableController::new(&config(), transport);

    let first = controller.mount().unwrap();
    let second = controller.set_filter("x").unwrap();
    let c1 = calls.recv().await.unwrap();
    let c2 = calls.recv().await.unwrap();

    c2.fail(ApiError::http(502, "bad gateway").into());
    second.await.unwrap();
    c1.respond(page("first", 10, 42));
    first.await.unwrap();

    let display = controller.display();
    assert!(display.rows.is_empty());
    assert!(!display.loading);
    assert!(display.error.is_some());
}

#[tokio::test]
async fn test_construction_failure_sends_nothing() {
    let (transport, mut calls) = Scripted::new();
    let config = config().with_page_size(0);
    let controller = TableController::new(&config, transport);

    assert!(controller.mount().is_none());
    assert!(!controller.display().loading);
    assert!(calls.try_recv().is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_accessors_while_holding_display_borrow() {
    let (transport, mut calls) = Scripted::new();
    let controller = TableController::new(&config(), transport);
    let display = controller.subscribe();

    let handle = controller.mount().unwrap();
    let call = calls.recv().await.unwrap();

    {
        let seen = display.borrow();
        assert!(seen.loading);
        call.respond(page("first", 10, 42));
        // Give the worker time to reach the publish step.
        std::thread::sleep(std::time::Duration::from_millis(50));
        assert_eq!(controller.page_request().page_index, 0);
        assert_eq!(controller.sort(), SortSpec::default());
        assert_eq!(controller.epoch(), 1);
    }

    handle.await.unwrap();
    assert_eq!(controller.display().total_records, 42);
}

// =============================================================================
// Sort
// =============================================================================

#[tokio::test]
async fn test_sort_toggle_sequence() {
    let (transport, mut calls) = Scripted::new();
    let controller = TableController::new(&config(), transport);
    let id = ColumnSpec::new("Id", "id");
    let name = ColumnSpec::new("Name", "name");

    controller.toggle_sort(&id).unwrap();
    assert_eq!(controller.sort(), SortSpec::desc("id"));
    assert_eq!(controller.sort_indicator(&id), SortIndicator::Descending);

    controller.toggle_sort(&id).unwrap();
    assert_eq!(controller.sort(), SortSpec::asc("id"));

    controller.toggle_sort(&name).unwrap();
    assert_eq!(controller.sort(), SortSpec::asc("name"));
    assert_eq!(controller.sort_indicator(&id), SortIndicator::None);

    let sent: Vec<SortSpec> = [
        calls.recv().await.unwrap(),
        calls.recv().await.unwrap(),
        calls.recv().await.unwrap(),
    ]
    .into_iter()
    .map(|call| call.request.sort)
    .collect();
    assert_eq!(
        sent,
        vec![SortSpec::desc("id"), SortSpec::asc("id"), SortSpec::asc("name")]
    );
}

#[tokio::test]
async fn test_non_sortable_column_is_inert() {
    let (transport, mut calls) = Scripted::new();
    let controller = TableController::new(&config(), transport);

    assert!(controller.toggle_sort(&ColumnSpec::actions()).is_none());
    assert_eq!(controller.sort(), SortSpec::default());
    assert_eq!(controller.epoch(), 0);
    assert!(calls.try_recv().is_err());
}

// =============================================================================
// Filter and page-size resets
// =============================================================================

#[tokio::test]
async fn test_filter_change_resets_page_in_one_fetch() {
    let (transport, mut calls) = Scripted::new();
    let controller = TableController::new(&config().with_page_size(25), transport);

    controller.go_to_page(3).unwrap();
    assert_eq!(calls.recv().await.unwrap().request.start, 75);

    controller.set_filter("abc").unwrap();
    let call = calls.recv().await.unwrap();
    assert_eq!(call.request.start, 0);
    assert_eq!(call.request.search_clause, "abc");
    assert_eq!(controller.page_request().page_index, 0);
    assert_eq!(controller.epoch(), 2);
}

#[tokio::test]
async fn test_same_filter_is_not_a_change() {
    let (transport, mut calls) = Scripted::new();
    let controller = TableController::new(&config(), transport);

    controller.go_to_page(2).unwrap();
    calls.recv().await.unwrap();
    controller.set_filter("abc").unwrap();
    calls.recv().await.unwrap();
    controller.go_to_page(1).unwrap();
    calls.recv().await.unwrap();

    assert!(controller.set_filter("abc").is_none());
    assert_eq!(controller.page_request().page_index, 1);
    assert_eq!(controller.epoch(), 3);
}

#[tokio::test]
async fn test_page_size_change_resets_page_in_one_fetch() {
    let (transport, mut calls) = Scripted::new();
    let controller = TableController::new(&config(), transport);

    controller.apply(PageChange::Index(4)).unwrap();
    assert_eq!(calls.recv().await.unwrap().request.start, 40);

    controller.apply(PageChange::Size(25)).unwrap();
    let call = calls.recv().await.unwrap();
    assert_eq!((call.request.start, call.request.length), (0, 25));
    assert_eq!(controller.epoch(), 2);
    assert!(calls.try_recv().is_err());
}

// =============================================================================
// Component wiring
// =============================================================================

#[tokio::test]
async fn test_table_wires_inputs_to_controller() {
    let (transport, mut calls) = Scripted::new();
    let table = DataTable::new(config(), transport);
    let mut display = table.controller().subscribe();

    table.mount().unwrap();
    calls.recv().await.unwrap().respond(page("first", 10, 42));
    display.wait_for(|d| !d.loading).await.unwrap();

    let view = table.pagination_view();
    table.pagination().next_page(&view);
    let call = calls.recv().await.unwrap();
    assert_eq!(call.request.start, 10);
    call.respond(page("second", 10, 42));
    display.wait_for(|d| !d.loading).await.unwrap();
    assert_eq!(table.pagination_view().displayed_rows(), "11–20 of 42");

    table.filter().set_text("ada");
    let call = calls.recv().await.unwrap();
    assert_eq!((call.request.start, call.request.search_clause.as_str()), (0, "ada"));
    call.respond(page("ada", 1, 1));
    display.wait_for(|d| !d.loading).await.unwrap();

    let state = table.controller().display();
    assert_eq!(state.page_count, 1);
    assert_eq!(state.rows[0].cell_text("name"), "ada-0");
}

#[tokio::test]
async fn test_header_clicks() {
    let (transport, mut calls) = Scripted::new();
    let table = DataTable::new(config(), transport);

    table.click_header(1).unwrap();
    calls.recv().await.unwrap();
    assert!(table.click_header(4).is_none());
    assert!(table.click_header(99).is_none());

    let labels: Vec<String> = table.header_cells().iter().map(|h| h.label()).collect();
    assert_eq!(
        labels,
        vec!["Id", "Name 🔼", "Full name 🔼", "Email", "Actions"]
    );
    assert_eq!(table.controller().sort().direction, Direction::Asc);
}

#[test]
fn test_new_button() {
    let (transport, _calls) = Scripted::new();
    let table = DataTable::new(config(), transport);
    assert!(!table.has_new_button());
    assert!(!table.click_new());

    let clicks = Arc::new(AtomicUsize::new(0));
    let counter = clicks.clone();
    let (transport, _calls) = Scripted::new();
    let table = DataTable::new(
        config().with_new_button_click(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
        transport,
    );
    assert!(table.has_new_button());
    assert!(table.click_new());
    assert_eq!(clicks.load(Ordering::SeqCst), 1);
}
