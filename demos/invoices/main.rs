//! Scripted walkthrough of the invoice table.
//!
//! Drives the table without a terminal runtime: key messages go in, the
//! resulting commands are awaited by hand, and each frame is printed. The
//! backend is an in-memory invoice store behind the same `DataSource` /
//! `StatusUpdater` / `Exporter` traits a real REST client would implement.

use async_trait::async_trait;
use bubbletea_datatable::prelude::*;
use bubbletea_datatable::{key, SpinnerTickMsg};
use bubbletea_rs::{Cmd, KeyMsg, Msg};
use crossterm::event::{KeyCode, KeyModifiers};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

const PER_PAGE: usize = 5;

/// In-memory invoice store shared by the list, status, and export traits.
struct InvoiceStore {
    invoices: Mutex<Vec<Value>>,
}

impl InvoiceStore {
    fn seeded() -> Arc<Self> {
        let warehouses = ["3", "5"];
        let customers = [
            "Acme Traders",
            "Blue Ridge Mart",
            "Castle Goods",
            "Delta Foods",
            "Evergreen Supply",
        ];
        let invoices = (1..=17)
            .map(|i| {
                json!({
                    "id": i,
                    "invoice_number": format!("INV-{:04}", i),
                    "customer_name": customers[i % customers.len()],
                    "warehouse": warehouses[i % warehouses.len()],
                    "grand_total": 250.0 + (i as f64) * 13.5,
                    "status": if i % 3 == 0 { "0" } else { "1" },
                })
            })
            .collect();
        Arc::new(Self {
            invoices: Mutex::new(invoices),
        })
    }

    fn matching(&self, req: &PageRequest) -> Vec<Value> {
        let warehouse = req.params.get("warehouse").map(str::to_string);
        let search = req.params.get("search").map(str::to_lowercase);
        self.invoices
            .lock()
            .unwrap()
            .iter()
            .filter(|inv| {
                warehouse
                    .as_deref()
                    .is_none_or(|w| inv["warehouse"] == json!(w))
            })
            .filter(|inv| {
                search.as_deref().is_none_or(|term| {
                    inv["customer_name"]
                        .as_str()
                        .unwrap_or("")
                        .to_lowercase()
                        .contains(term)
                })
            })
            .cloned()
            .collect()
    }
}

#[async_trait]
impl DataSource for InvoiceStore {
    async fn list(&self, req: &PageRequest) -> Result<PageEnvelope, DataSourceError> {
        let matching = self.matching(req);
        let total = matching.len();
        let total_pages = total.div_ceil(req.per_page).max(1);
        let page = req.page.min(total_pages);
        let rows: Vec<Row> = matching
            .into_iter()
            .skip((page - 1) * req.per_page)
            .take(req.per_page)
            .filter_map(|v| v.as_object().cloned())
            .collect();
        Ok(PageEnvelope {
            rows,
            total_records: total as u64,
            current_page: page,
            total_pages,
            per_page: req.per_page,
        })
    }
}

#[async_trait]
impl StatusUpdater for InvoiceStore {
    async fn update_status(&self, payload: &StatusPayload) -> Result<(), DataSourceError> {
        let mut invoices = self.invoices.lock().unwrap();
        for invoice in invoices.iter_mut() {
            let id = invoice["id"].as_i64().unwrap_or(0);
            if payload.ids.contains(&EntityId::Number(id)) {
                invoice["status"] = json!(payload.status.to_string());
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Exporter for InvoiceStore {
    async fn export(&self, req: &ExportRequest) -> Result<Value, DataSourceError> {
        let format = req.format.as_str();
        Ok(json!({
            "download_url": format!("https://files.example.com/exports/invoices.{format}")
        }))
    }
}

struct StaticOptions;

#[async_trait]
impl OptionLoader for StaticOptions {
    async fn load(&self, entity: &str) -> Result<Vec<SelectOption>, DataSourceError> {
        match entity {
            "warehouses" => Ok(vec![
                SelectOption::new("3", "Central Warehouse"),
                SelectOption::new("5", "North Annex"),
            ]),
            other => Err(DataSourceError::Backend(format!(
                "unknown option entity: {other}"
            ))),
        }
    }
}

/// Prints the exported URL instead of fetching it.
struct PrintSink;

#[async_trait]
impl DownloadSink for PrintSink {
    async fn download(&self, url: &str) -> Result<(), DataSourceError> {
        println!("  (downloading {url})");
        Ok(())
    }
}

fn key_msg(code: KeyCode) -> Msg {
    Box::new(KeyMsg {
        key: code,
        modifiers: KeyModifiers::NONE,
    })
}

/// Awaits a command chain until it ends, unpacking batches and dropping
/// spinner ticks so the animation chain terminates.
async fn pump(table: &mut Table, cmd: Option<Cmd>) {
    let mut queue: Vec<Cmd> = cmd.into_iter().collect();
    while let Some(pending) = queue.pop() {
        let Some(msg) = pending.await else { continue };
        match msg.downcast::<bubbletea_rs::event::BatchCmdMsg>() {
            Ok(batch) => queue.extend(batch.0),
            Err(msg) => {
                if msg.downcast_ref::<SpinnerTickMsg>().is_none() {
                    queue.extend(table.update(&msg));
                }
            }
        }
    }
}

async fn press(table: &mut Table, code: KeyCode) {
    let cmd = table.update(&key_msg(code));
    pump(table, cmd).await;
}

async fn type_str(table: &mut Table, text: &str) {
    for ch in text.chars() {
        press(table, KeyCode::Char(ch)).await;
    }
}

fn frame(title: &str, table: &Table) {
    println!("\n=== {title} ===");
    println!("{}", table.view());
}

#[tokio::main]
async fn main() {
    let store = InvoiceStore::seeded();
    let cache = OptionCache::new(Arc::new(StaticOptions));
    let layouts: Arc<dyn LayoutStore> = Arc::new(MemoryLayoutStore::new());

    let deactivate = StatusAction::new(store.clone(), 0)
        .with_resolver(IdResolver::new().with_domain_field("invoice_id"))
        .with_success_message("Invoices deactivated")
        .with_empty_message("No invoices selected")
        .into_bulk_action(key::new_binding(vec![
            key::with_keys_str(&["d"]),
            key::with_help("d", "deactivate"),
        ]));

    let export = ExportAction::new(store.clone(), Arc::new(PrintSink), ExportFormat::Csv)
        .with_success_message("Invoice export downloaded");

    let mut table = Table::new(
        store.clone(),
        vec![
            ColumnDef::new("invoice_number", "Invoice #"),
            ColumnDef::new("customer_name", "Customer"),
            ColumnDef::new("warehouse", "Warehouse")
                .with_filter(FilterDescriptor::from_cache("warehouses")),
            ColumnDef::new("grand_total", "Total").with_render(|row| {
                row.get("grand_total")
                    .and_then(Value::as_f64)
                    .map(|total| format!("${total:.2}"))
            }),
            ColumnDef::new("status", "Status").with_render(|row| {
                row.get("status").and_then(Value::as_str).map(|s| {
                    if s == "1" { "Active" } else { "Inactive" }.to_string()
                })
            }),
        ],
    )
    .with_per_page(PER_PAGE)
    .with_search_column("customer_name")
    .with_bulk_action(deactivate)
    .with_export(export)
    .with_option_cache(cache)
    .with_layout_store(layouts, "invoices");

    // Initial load.
    let cmd = table.init();
    pump(&mut table, Some(cmd)).await;
    frame("Page 1", &table);

    // Page forward.
    press(&mut table, KeyCode::Right).await;
    frame("Page 2", &table);

    // Filter by warehouse: open the panel (options load through the
    // cache), pick the first entry.
    press(&mut table, KeyCode::Char('f')).await;
    press(&mut table, KeyCode::Enter).await;
    press(&mut table, KeyCode::Esc).await;
    frame("Filtered to Central Warehouse", &table);

    // Search the customer column; search is its own strategy, so it
    // supersedes the warehouse filter until cleared.
    press(&mut table, KeyCode::Char('/')).await;
    type_str(&mut table, "acme").await;
    press(&mut table, KeyCode::Enter).await;
    frame("Search: acme", &table);

    // Back to the plain list (blank search resets).
    press(&mut table, KeyCode::Char('/')).await;
    press(&mut table, KeyCode::Enter).await;

    // Select the first two rows and deactivate them; the success outcome
    // triggers exactly one refresh.
    press(&mut table, KeyCode::Char(' ')).await;
    press(&mut table, KeyCode::Down).await;
    press(&mut table, KeyCode::Char(' ')).await;
    press(&mut table, KeyCode::Char('d')).await;
    frame("After bulk deactivate", &table);

    // Export the current view as CSV.
    press(&mut table, KeyCode::Char('e')).await;
    frame("After export", &table);
}
