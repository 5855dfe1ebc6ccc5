//! Update-loop tests that drive the table the way the runtime does:
//! key messages in, commands out, fetch results fed back in.

use super::fetch::{FetchResultMsg, RefreshMsg};
use super::*;
use crate::actions::{outcome_cmd, ActionOutcomeMsg, BulkAction, RowAction, StatusAction, StatusPayload, StatusUpdater};
use crate::datasource::{
    DataSource, DataSourceError, FilterMap, PageEnvelope, PageRequest, Row,
};
use crate::key;
use crate::notification::Severity;
use crate::options::{OptionCache, OptionLoader, SelectOption};
use crate::prefs::{LayoutStore, MemoryLayoutStore};
use crate::table::{ColumnDef, FilterDescriptor, Mode, Model};
use async_trait::async_trait;
use bubbletea_rs::{KeyMsg, Msg};
use crossterm::event::{KeyCode, KeyModifiers};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

fn row(value: Value) -> Row {
    value.as_object().cloned().expect("object row")
}

fn key_msg(code: KeyCode) -> Msg {
    Box::new(KeyMsg {
        key: code,
        modifiers: KeyModifiers::NONE,
    })
}

fn press(table: &mut Model, code: KeyCode) -> Option<bubbletea_rs::Cmd> {
    table.update(&key_msg(code))
}

fn type_str(table: &mut Model, text: &str) {
    for ch in text.chars() {
        press(table, KeyCode::Char(ch));
    }
}

/// Serves pages of invoices and records every request it sees.
struct RecordingSource {
    requests: Mutex<Vec<PageRequest>>,
    total_pages: usize,
    fail: bool,
}

impl RecordingSource {
    fn pages(total_pages: usize) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            total_pages,
            fail: false,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            total_pages: 1,
            fail: true,
        })
    }

    fn last_request(&self) -> PageRequest {
        self.requests.lock().unwrap().last().cloned().expect("request")
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl DataSource for RecordingSource {
    async fn list(&self, req: &PageRequest) -> Result<PageEnvelope, DataSourceError> {
        self.requests.lock().unwrap().push(req.clone());
        if self.fail {
            return Err(DataSourceError::Backend("Failed to fetch data".to_string()));
        }
        let rows = (0..req.per_page.min(3))
            .map(|i| {
                row(json!({
                    "id": (req.page - 1) * req.per_page + i + 1,
                    "number": format!("INV-{}{}", req.page, i),
                    "status": if i % 2 == 0 { "1" } else { "0" },
                }))
            })
            .collect::<Vec<Row>>();
        Ok(PageEnvelope {
            total_records: (self.total_pages * rows.len()) as u64,
            current_page: req.page,
            total_pages: self.total_pages,
            per_page: req.per_page,
            rows,
        })
    }
}

fn invoice_columns() -> Vec<ColumnDef> {
    vec![
        ColumnDef::new("number", "Invoice #"),
        ColumnDef::new("status", "Status"),
    ]
}

fn envelope(page: usize, total_pages: usize, rows: Vec<Row>) -> PageEnvelope {
    PageEnvelope {
        total_records: rows.len() as u64,
        current_page: page,
        total_pages,
        per_page: 10,
        rows,
    }
}

/// Awaits `cmd` the way the runtime would: batches are unpacked into
/// their member commands, spinner ticks are dropped so the chain ends,
/// and everything else is fed back through `update`.
async fn settle(table: &mut Model, cmd: bubbletea_rs::Cmd) {
    let mut queue = vec![cmd];
    while let Some(pending) = queue.pop() {
        let Some(msg) = pending.await else { continue };
        match msg.downcast::<bubbletea_rs::event::BatchCmdMsg>() {
            Ok(batch) => queue.extend(batch.0),
            Err(msg) => {
                if msg.downcast_ref::<crate::spinner::TickMsg>().is_none() {
                    table.update(&msg);
                }
            }
        }
    }
}

#[tokio::test]
async fn test_init_loads_first_page() {
    let source = RecordingSource::pages(4);
    let mut table = Model::new(source.clone(), invoice_columns());

    let cmd = table.init();
    assert!(table.is_loading());
    settle(&mut table, cmd).await;

    assert!(!table.is_loading());
    assert_eq!(table.current_page(), 1);
    assert_eq!(table.total_pages(), 4);
    assert_eq!(table.rows().len(), 3);
    assert_eq!(source.last_request().page, 1);
}

#[tokio::test]
async fn test_next_page_key_replays_strategy() {
    let source = RecordingSource::pages(3);
    let mut table = Model::new(source.clone(), invoice_columns());
    let cmd = table.init();
    settle(&mut table, cmd).await;

    let cmd = press(&mut table, KeyCode::Right).expect("page fetch");
    settle(&mut table, cmd).await;

    assert_eq!(table.current_page(), 2);
    assert_eq!(source.last_request().page, 2);
}

#[tokio::test]
async fn test_prev_page_on_first_page_is_a_no_op() {
    let source = RecordingSource::pages(3);
    let mut table = Model::new(source.clone(), invoice_columns());
    let cmd = table.init();
    settle(&mut table, cmd).await;

    assert!(press(&mut table, KeyCode::Left).is_none());
    assert_eq!(source.request_count(), 1);
}

#[tokio::test]
async fn test_selection_does_not_survive_page_change() {
    let source = RecordingSource::pages(2);
    let mut table = Model::new(source, invoice_columns());
    let cmd = table.init();
    settle(&mut table, cmd).await;

    press(&mut table, KeyCode::Char(' '));
    assert_eq!(table.selected().len(), 1);

    let cmd = press(&mut table, KeyCode::Right).expect("page fetch");
    settle(&mut table, cmd).await;
    assert!(table.selected().is_empty());
}

#[test]
fn test_stale_fetch_result_is_discarded() {
    let mut table = Model::new(RecordingSource::pages(2), invoice_columns());
    let _cmd = table.load(1);
    let stale_token = table.fetch_seq;
    let _cmd = table.load(2);

    let fresh = envelope(2, 2, vec![row(json!({"number": "INV-20"}))]);
    table.update(&(Box::new(FetchResultMsg {
        token: table.fetch_seq,
        result: Ok(fresh),
    }) as Msg));

    // The slow page-1 response lands after page 2 was applied.
    let stale = envelope(1, 2, vec![row(json!({"number": "INV-10"}))]);
    table.update(&(Box::new(FetchResultMsg {
        token: stale_token,
        result: Ok(stale),
    }) as Msg));

    assert_eq!(table.current_page(), 2);
    assert_eq!(table.rows()[0]["number"], json!("INV-20"));
}

#[test]
fn test_stale_failure_cannot_clobber_fresh_rows() {
    let mut table = Model::new(RecordingSource::pages(1), invoice_columns());
    let _cmd = table.load(1);
    let stale_token = table.fetch_seq;
    let _cmd = table.refresh();

    table.update(&(Box::new(FetchResultMsg {
        token: table.fetch_seq,
        result: Ok(envelope(1, 1, vec![row(json!({"number": "INV-1"}))])),
    }) as Msg));
    table.update(&(Box::new(FetchResultMsg {
        token: stale_token,
        result: Err(DataSourceError::Transport("timed out".to_string())),
    }) as Msg));

    assert_eq!(table.rows().len(), 1);
    assert!(!table.notices().is_visible());
}

#[tokio::test]
async fn test_failed_fetch_resets_to_empty_page_one() {
    let source = RecordingSource::failing();
    let mut table = Model::new(source, invoice_columns());

    let cmd = table.init();
    settle(&mut table, cmd).await;

    assert!(!table.is_loading());
    assert!(table.rows().is_empty());
    assert_eq!(table.current_page(), 1);
    assert_eq!(table.total_pages(), 1);
    assert_eq!(table.notices().severity(), Some(Severity::Error));
    assert_eq!(table.notices().message(), Some("Failed to fetch data"));
}

#[test]
fn test_pagination_bounds_hold_for_inconsistent_metadata() {
    let mut table = Model::new(RecordingSource::pages(1), invoice_columns());
    let _cmd = table.load(1);

    // Backend claims page 9 of 2 and returns more rows than per_page.
    let rows: Vec<Row> = (0..5).map(|i| row(json!({"id": i}))).collect();
    table.update(&(Box::new(FetchResultMsg {
        token: table.fetch_seq,
        result: Ok(PageEnvelope {
            total_records: 5,
            current_page: 9,
            total_pages: 2,
            per_page: 3,
            rows,
        }),
    }) as Msg));

    assert_eq!(table.current_page(), 2);
    assert_eq!(table.total_pages(), 2);
    assert!(table.rows().len() <= table.page_size());
}

#[tokio::test]
async fn test_search_mode_round_trip() {
    let source = RecordingSource::pages(1);
    let mut table = Model::new(source.clone(), invoice_columns());
    let cmd = table.init();
    settle(&mut table, cmd).await;

    press(&mut table, KeyCode::Char('/'));
    assert_eq!(table.mode(), Mode::Search);

    type_str(&mut table, "acme");
    let cmd = press(&mut table, KeyCode::Enter).expect("search fetch");
    assert_eq!(table.mode(), Mode::Normal);
    settle(&mut table, cmd).await;

    assert_eq!(source.last_request().params.get("search"), Some("acme"));
}

#[tokio::test]
async fn test_search_column_scopes_the_term() {
    let source = RecordingSource::pages(1);
    let mut table =
        Model::new(source.clone(), invoice_columns()).with_search_column("customer_name");
    let cmd = table.init();
    settle(&mut table, cmd).await;

    press(&mut table, KeyCode::Char('/'));
    type_str(&mut table, "acme");
    let cmd = press(&mut table, KeyCode::Enter).expect("search fetch");
    settle(&mut table, cmd).await;

    let req = source.last_request();
    assert_eq!(req.params.get("search_column"), Some("customer_name"));
}

#[tokio::test]
async fn test_cancelled_search_leaves_strategy_alone() {
    let source = RecordingSource::pages(1);
    let mut table = Model::new(source.clone(), invoice_columns());
    let cmd = table.init();
    settle(&mut table, cmd).await;

    press(&mut table, KeyCode::Char('/'));
    type_str(&mut table, "acm");
    assert!(press(&mut table, KeyCode::Esc).is_none());
    assert_eq!(table.mode(), Mode::Normal);
    assert_eq!(source.request_count(), 1);
}

#[tokio::test]
async fn test_search_replayed_when_paging() {
    let source = RecordingSource::pages(3);
    let mut table = Model::new(source.clone(), invoice_columns());
    let cmd = table.init();
    settle(&mut table, cmd).await;

    press(&mut table, KeyCode::Char('/'));
    type_str(&mut table, "acme");
    let cmd = press(&mut table, KeyCode::Enter).expect("search fetch");
    settle(&mut table, cmd).await;

    let cmd = press(&mut table, KeyCode::Right).expect("page fetch");
    settle(&mut table, cmd).await;

    let req = source.last_request();
    assert_eq!(req.page, 2);
    assert_eq!(req.params.get("search"), Some("acme"));
}

#[tokio::test]
async fn test_filter_toggle_applies_and_clears() {
    let source = RecordingSource::pages(1);
    let columns = vec![
        ColumnDef::new("number", "Invoice #"),
        ColumnDef::new("warehouse", "Warehouse").with_filter(FilterDescriptor::with_options(
            vec![
                SelectOption::new("3", "Central"),
                SelectOption::new("5", "North"),
            ],
        )),
    ];
    let mut table = Model::new(source.clone(), columns);
    let cmd = table.init();
    settle(&mut table, cmd).await;

    press(&mut table, KeyCode::Char('f'));
    assert_eq!(table.mode(), Mode::Filter);

    // First accept selects "3"; the fetch carries it.
    let cmd = press(&mut table, KeyCode::Enter).expect("filtered fetch");
    settle(&mut table, cmd).await;
    assert_eq!(source.last_request().params.get("warehouse"), Some("3"));

    // Accepting the same option again clears the filter entirely.
    let cmd = press(&mut table, KeyCode::Enter).expect("list fetch");
    settle(&mut table, cmd).await;
    let req = source.last_request();
    assert!(!req.params.contains_key("warehouse"));
}

#[tokio::test]
async fn test_filter_mode_unavailable_without_filterable_columns() {
    let mut table = Model::new(RecordingSource::pages(1), invoice_columns());
    let cmd = table.init();
    settle(&mut table, cmd).await;

    assert!(press(&mut table, KeyCode::Char('f')).is_none());
    assert_eq!(table.mode(), Mode::Normal);
    assert_eq!(table.notices().message(), Some("No filters available"));
}

struct StaticLoader;

#[async_trait]
impl OptionLoader for StaticLoader {
    async fn load(&self, _entity: &str) -> Result<Vec<SelectOption>, DataSourceError> {
        Ok(vec![SelectOption::new("3", "Central")])
    }
}

#[tokio::test]
async fn test_entering_filter_mode_loads_cached_options() {
    let source = RecordingSource::pages(1);
    let cache = OptionCache::new(Arc::new(StaticLoader));
    let columns = vec![ColumnDef::new("warehouse", "Warehouse")
        .with_filter(FilterDescriptor::from_cache("warehouses"))];
    let mut table = Model::new(source, columns).with_option_cache(cache.clone());
    let cmd = table.init();
    settle(&mut table, cmd).await;

    let cmd = press(&mut table, KeyCode::Char('f')).expect("option load");
    let msg = cmd.await.expect("options message");
    table.update(&msg);

    assert!(cache.is_loaded("warehouses"));
    let options = table.active_filter_options();
    assert_eq!(options.len(), 1);
    assert_eq!(options[0].label, "Central");
}

#[tokio::test]
async fn test_refresh_msg_with_new_key_refetches_once() {
    let source = RecordingSource::pages(1);
    let mut table = Model::new(source.clone(), invoice_columns());
    let cmd = table.init();
    settle(&mut table, cmd).await;

    let cmd = table
        .update(&(Box::new(RefreshMsg { key: 7 }) as Msg))
        .expect("refresh fetch");
    settle(&mut table, cmd).await;
    assert_eq!(source.request_count(), 2);

    // Delivering the same generation again does nothing.
    assert!(table.update(&(Box::new(RefreshMsg { key: 7 }) as Msg)).is_none());
    assert_eq!(source.request_count(), 2);
}

#[tokio::test]
async fn test_internal_refresh_does_not_consume_external_generation() {
    let source = RecordingSource::pages(1);
    let mut table = Model::new(source.clone(), invoice_columns());
    let cmd = table.init();
    settle(&mut table, cmd).await;

    // A manual refresh must not advance the external generation counter.
    let cmd = press(&mut table, KeyCode::Char('r')).expect("refresh fetch");
    settle(&mut table, cmd).await;
    assert_eq!(source.request_count(), 2);

    // The embedder's first bump (0 -> 1) still lands afterwards.
    let cmd = table
        .update(&(Box::new(RefreshMsg { key: 1 }) as Msg))
        .expect("external refresh fetch");
    settle(&mut table, cmd).await;
    assert_eq!(source.request_count(), 3);
}

#[tokio::test]
async fn test_action_outcome_with_refresh_refetches_once() {
    let source = RecordingSource::pages(1);
    let mut table = Model::new(source.clone(), invoice_columns());
    let cmd = table.init();
    settle(&mut table, cmd).await;

    let outcome = ActionOutcomeMsg::success("3 invoices updated");
    let cmd = table.update(&(Box::new(outcome) as Msg)).expect("re-fetch");
    settle(&mut table, cmd).await;

    assert_eq!(source.request_count(), 2);
    assert_eq!(table.notices().message(), Some("3 invoices updated"));
    assert_eq!(table.notices().severity(), Some(Severity::Success));
}

#[tokio::test]
async fn test_failed_outcome_notifies_without_refetch() {
    let source = RecordingSource::pages(1);
    let mut table = Model::new(source.clone(), invoice_columns());
    let cmd = table.init();
    settle(&mut table, cmd).await;

    let outcome = ActionOutcomeMsg::failure("No invoices selected");
    assert!(table.update(&(Box::new(outcome) as Msg)).is_none());
    assert_eq!(source.request_count(), 1);
    assert_eq!(table.notices().severity(), Some(Severity::Error));
}

#[tokio::test]
async fn test_row_action_receives_hovered_row() {
    let seen = Arc::new(Mutex::new(Vec::<String>::new()));
    let seen_by_action = seen.clone();
    let action = RowAction::new(
        key::new_binding(vec![key::with_keys_str(&["v"]), key::with_help("v", "view")]),
        move |row| {
            let number = row["number"].as_str().unwrap_or("").to_string();
            seen_by_action.lock().unwrap().push(number);
            None
        },
    );
    let mut table =
        Model::new(RecordingSource::pages(1), invoice_columns()).with_row_action(action);
    let cmd = table.init();
    settle(&mut table, cmd).await;

    press(&mut table, KeyCode::Down);
    press(&mut table, KeyCode::Char('v'));
    assert_eq!(seen.lock().unwrap().as_slice(), ["INV-11".to_string()]);
}

struct CountingUpdater {
    payloads: Mutex<Vec<StatusPayload>>,
}

#[async_trait]
impl StatusUpdater for CountingUpdater {
    async fn update_status(&self, payload: &StatusPayload) -> Result<(), DataSourceError> {
        self.payloads.lock().unwrap().push(payload.clone());
        Ok(())
    }
}

#[tokio::test]
async fn test_bulk_status_flow_updates_and_refreshes() {
    let source = RecordingSource::pages(1);
    let updater = Arc::new(CountingUpdater {
        payloads: Mutex::new(Vec::new()),
    });
    let deactivate = StatusAction::new(updater.clone(), 0)
        .with_success_message("Invoices deactivated")
        .into_bulk_action(key::new_binding(vec![
            key::with_keys_str(&["d"]),
            key::with_help("d", "deactivate"),
        ]));
    let mut table =
        Model::new(source.clone(), invoice_columns()).with_bulk_action(deactivate);
    let cmd = table.init();
    settle(&mut table, cmd).await;

    // Row 0 has status "1", so deactivate is visible for it.
    press(&mut table, KeyCode::Char(' '));
    let cmd = press(&mut table, KeyCode::Char('d')).expect("status cmd");
    let msg = cmd.await.expect("outcome");
    let cmd = table.update(&msg).expect("refresh fetch");
    settle(&mut table, cmd).await;

    let payloads = updater.payloads.lock().unwrap();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].status, 0);
    assert_eq!(payloads[0].ids.len(), 1);
    drop(payloads);

    assert_eq!(source.request_count(), 2);
    assert_eq!(table.notices().message(), Some("Invoices deactivated"));
}

#[tokio::test]
async fn test_hidden_bulk_action_does_not_fire() {
    let updater = Arc::new(CountingUpdater {
        payloads: Mutex::new(Vec::new()),
    });
    // Activate targets status 1; row 0 already has it.
    let activate = StatusAction::new(updater.clone(), 1).into_bulk_action(key::new_binding(
        vec![key::with_keys_str(&["a"]), key::with_help("a", "activate")],
    ));
    let mut table =
        Model::new(RecordingSource::pages(1), invoice_columns()).with_bulk_action(activate);
    let cmd = table.init();
    settle(&mut table, cmd).await;

    press(&mut table, KeyCode::Char(' '));
    assert!(press(&mut table, KeyCode::Char('a')).is_none());
    assert!(updater.payloads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_select_all_and_clear() {
    let mut table = Model::new(RecordingSource::pages(1), invoice_columns());
    let cmd = table.init();
    settle(&mut table, cmd).await;

    table.update(&(Box::new(KeyMsg {
        key: KeyCode::Char('a'),
        modifiers: KeyModifiers::CONTROL,
    }) as Msg));
    assert_eq!(table.selected().len(), table.rows().len());

    press(&mut table, KeyCode::Esc);
    assert!(table.selected().is_empty());
}

#[tokio::test]
async fn test_view_renders_rows_and_pagination() {
    let source = RecordingSource::pages(4);
    let mut table = Model::new(source, invoice_columns());
    let cmd = table.init();
    settle(&mut table, cmd).await;

    let view = lipgloss_extras::lipgloss::strip_ansi(&table.view());
    assert!(view.contains("Invoice #"));
    assert!(view.contains("INV-10"));
    assert!(view.contains("1/4"));
}

#[tokio::test]
async fn test_digit_key_toggles_column_visibility() {
    let source = RecordingSource::pages(1);
    let mut table = Model::new(source, invoice_columns());
    let cmd = table.init();
    settle(&mut table, cmd).await;

    press(&mut table, KeyCode::Char('2'));
    let view = lipgloss_extras::lipgloss::strip_ansi(&table.view());
    assert!(view.contains("Invoice #"));
    assert!(!view.contains("Status"));

    press(&mut table, KeyCode::Char('2'));
    let view = lipgloss_extras::lipgloss::strip_ansi(&table.view());
    assert!(view.contains("Status"));

    // Digits past the last column are ignored.
    press(&mut table, KeyCode::Char('9'));
    let view = lipgloss_extras::lipgloss::strip_ansi(&table.view());
    assert!(view.contains("Invoice #"));
    assert!(view.contains("Status"));
}

#[tokio::test]
async fn test_column_layout_round_trips_through_store() {
    let store: Arc<dyn LayoutStore> = Arc::new(MemoryLayoutStore::new());
    let source = RecordingSource::pages(1);

    let mut table = Model::new(source.clone(), invoice_columns())
        .with_layout_store(store.clone(), "invoices");
    let cmd = table.init();
    settle(&mut table, cmd).await;

    press(&mut table, KeyCode::Char('2'));
    let saved = store.load("invoices").expect("persisted layout");
    assert_eq!(saved.visible, vec!["number".to_string()]);

    // A second table built with the same key restores the saved layout.
    let mut restored = Model::new(source, invoice_columns())
        .with_layout_store(store, "invoices");
    let cmd = restored.init();
    settle(&mut restored, cmd).await;

    let view = lipgloss_extras::lipgloss::strip_ansi(&restored.view());
    assert!(view.contains("Invoice #"));
    assert!(!view.contains("Status"));
}

#[tokio::test]
async fn test_view_shows_empty_message() {
    struct EmptySource;

    #[async_trait]
    impl DataSource for EmptySource {
        async fn list(&self, _req: &PageRequest) -> Result<PageEnvelope, DataSourceError> {
            Ok(PageEnvelope::default())
        }
    }

    let mut table = Model::new(Arc::new(EmptySource), invoice_columns())
        .with_empty_message("No invoices found");
    let cmd = table.init();
    settle(&mut table, cmd).await;

    let view = lipgloss_extras::lipgloss::strip_ansi(&table.view());
    assert!(view.contains("No invoices found"));
}

#[tokio::test]
async fn test_unrecognized_messages_are_ignored() {
    let mut table = Model::new(RecordingSource::pages(1), invoice_columns());
    let cmd = table.init();
    settle(&mut table, cmd).await;

    assert!(table.update(&(Box::new("unrelated") as Msg)).is_none());
    assert_eq!(table.rows().len(), 3);
}

#[tokio::test]
async fn test_apply_filter_map_falls_back_to_list_when_empty() {
    let source = RecordingSource::pages(1);
    let mut table = Model::new(source.clone(), invoice_columns());
    let cmd = table.init();
    settle(&mut table, cmd).await;

    let cmd = table.apply_filter_map(FilterMap::new());
    settle(&mut table, cmd).await;
    assert_eq!(table.current_params().len(), 0);
}

#[tokio::test]
async fn test_custom_bulk_action_abort_path() {
    // A bulk action can abort by reporting an outcome without touching
    // the backend; the table shows it and does not re-fetch.
    let source = RecordingSource::pages(1);
    let abort = BulkAction::new(
        key::new_binding(vec![key::with_keys_str(&["x"]), key::with_help("x", "export")]),
        |_rows, selected| {
            if selected.is_empty() {
                return Some(outcome_cmd(ActionOutcomeMsg::failure("No invoices selected")));
            }
            None
        },
    );
    let mut table = Model::new(source.clone(), invoice_columns()).with_bulk_action(abort);
    let cmd = table.init();
    settle(&mut table, cmd).await;

    let cmd = press(&mut table, KeyCode::Char('x')).expect("abort outcome");
    let msg = cmd.await.expect("outcome");
    assert!(table.update(&msg).is_none());
    assert_eq!(table.notices().message(), Some("No invoices selected"));
    assert_eq!(source.request_count(), 1);
}
