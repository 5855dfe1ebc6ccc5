//! Row and bulk action dispatch.
//!
//! Pages wire key bindings to callbacks here: row actions receive the row
//! under the cursor, bulk actions receive the current page's rows plus the
//! selected indices and resolve the affected entities themselves. A
//! [`StatusAction`] packages the common activate/deactivate flow: resolve
//! identifiers, send `{ids, status}`, then report an
//! [`ActionOutcomeMsg`] that tells the table whether to re-fetch.

use crate::datasource::{DataSourceError, Row};
use crate::ident::{EntityId, IdResolver};
use crate::key::Binding;
use crate::notification::Severity;
use async_trait::async_trait;
use bubbletea_rs::{Cmd, Msg};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

type RowHandler = Arc<dyn Fn(&Row) -> Option<Cmd> + Send + Sync>;
type BulkHandler = Arc<dyn Fn(&[Row], &HashSet<usize>) -> Option<Cmd> + Send + Sync>;
type ShowWhen = Arc<dyn Fn(&[Row], &HashSet<usize>) -> bool + Send + Sync>;

/// Reported when an action finishes, aborts, or fails.
///
/// The table shows `message` at the given severity and, when `refresh` is
/// set, re-runs its last fetch exactly once.
#[derive(Debug, Clone)]
pub struct ActionOutcomeMsg {
    /// Text for the notification line.
    pub message: String,
    /// Notification severity.
    pub severity: Severity,
    /// Whether the table should re-fetch its current view.
    pub refresh: bool,
}

impl ActionOutcomeMsg {
    /// A successful outcome that triggers a re-fetch.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Success,
            refresh: true,
        }
    }

    /// A successful outcome that leaves the current view valid, e.g. an
    /// export; no re-fetch.
    pub fn completed(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Success,
            refresh: false,
        }
    }

    /// A failed or aborted outcome; no re-fetch.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Error,
            refresh: false,
        }
    }
}

/// Wraps an outcome in a command that delivers it on the next tick.
pub fn outcome_cmd(outcome: ActionOutcomeMsg) -> Cmd {
    Box::pin(async move { Some(Box::new(outcome) as Msg) })
}

/// A keyed action operating on the row under the cursor.
#[derive(Clone)]
pub struct RowAction {
    /// The key binding that triggers this action.
    pub binding: Binding,
    handler: RowHandler,
}

impl RowAction {
    /// Creates a row action from a binding and a callback.
    pub fn new(
        binding: Binding,
        handler: impl Fn(&Row) -> Option<Cmd> + Send + Sync + 'static,
    ) -> Self {
        Self {
            binding,
            handler: Arc::new(handler),
        }
    }

    /// Invokes the callback with `row`.
    pub fn dispatch(&self, row: &Row) -> Option<Cmd> {
        (self.handler)(row)
    }
}

impl fmt::Debug for RowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowAction")
            .field("binding", &self.binding)
            .finish()
    }
}

/// A keyed action operating on the current selection.
#[derive(Clone)]
pub struct BulkAction {
    /// The key binding that triggers this action.
    pub binding: Binding,
    handler: BulkHandler,
    show_when: Option<ShowWhen>,
}

impl BulkAction {
    /// Creates a bulk action from a binding and a callback.
    ///
    /// The callback receives all rows of the current page and the set of
    /// selected indices into that page.
    pub fn new(
        binding: Binding,
        handler: impl Fn(&[Row], &HashSet<usize>) -> Option<Cmd> + Send + Sync + 'static,
    ) -> Self {
        Self {
            binding,
            handler: Arc::new(handler),
            show_when: None,
        }
    }

    /// Restricts visibility to selection states where `predicate` holds
    /// (builder pattern).
    pub fn with_show_when(
        mut self,
        predicate: impl Fn(&[Row], &HashSet<usize>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.show_when = Some(Arc::new(predicate));
        self
    }

    /// Whether the action applies to the current selection.
    pub fn visible(&self, rows: &[Row], selected: &HashSet<usize>) -> bool {
        match &self.show_when {
            Some(predicate) => predicate(rows, selected),
            None => true,
        }
    }

    /// Invokes the callback with the current page state.
    pub fn dispatch(&self, rows: &[Row], selected: &HashSet<usize>) -> Option<Cmd> {
        (self.handler)(rows, selected)
    }
}

impl fmt::Debug for BulkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BulkAction")
            .field("binding", &self.binding)
            .field("has_show_when", &self.show_when.is_some())
            .finish()
    }
}

/// The `{ids, status}` payload sent to a status-update endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusPayload {
    /// The resolved identifiers of the affected rows.
    pub ids: Vec<EntityId>,
    /// The target status code.
    pub status: i64,
}

impl StatusPayload {
    /// Serializes the payload for transmission.
    pub fn to_json(&self) -> Value {
        json!({
            "ids": self.ids.iter().map(EntityId::to_json).collect::<Vec<_>>(),
            "status": self.status,
        })
    }
}

/// Sends status updates to the backend.
#[async_trait]
pub trait StatusUpdater: Send + Sync {
    /// Applies `payload.status` to every row in `payload.ids`.
    async fn update_status(&self, payload: &StatusPayload) -> Result<(), DataSourceError>;
}

/// Builder for the activate/deactivate bulk flow.
///
/// The produced action resolves identifiers for the selection, sends one
/// `{ids, status}` request, and reports the outcome. An empty or
/// unresolvable selection aborts before any request is made. Visibility
/// follows the selection: the action shows only while at least one
/// selected row is not already in the target status.
///
/// # Examples
///
/// ```rust,no_run
/// use bubbletea_datatable::actions::{StatusAction, StatusPayload, StatusUpdater};
/// use bubbletea_datatable::datasource::DataSourceError;
/// use bubbletea_datatable::key;
/// use async_trait::async_trait;
/// use std::sync::Arc;
///
/// struct InvoiceApi;
///
/// #[async_trait]
/// impl StatusUpdater for InvoiceApi {
///     async fn update_status(&self, _payload: &StatusPayload) -> Result<(), DataSourceError> {
///         Ok(())
///     }
/// }
///
/// let activate = StatusAction::new(Arc::new(InvoiceApi), 1)
///     .with_success_message("Invoices activated")
///     .with_empty_message("No invoices selected")
///     .into_bulk_action(key::new_binding(vec![
///         key::with_keys_str(&["a"]),
///         key::with_help("a", "activate"),
///     ]));
/// ```
pub struct StatusAction {
    updater: Arc<dyn StatusUpdater>,
    resolver: IdResolver,
    status: i64,
    status_field: String,
    success_message: String,
    empty_message: String,
}

impl StatusAction {
    /// Creates a status action targeting `status`.
    pub fn new(updater: Arc<dyn StatusUpdater>, status: i64) -> Self {
        Self {
            updater,
            resolver: IdResolver::new(),
            status,
            status_field: "status".to_string(),
            success_message: "Status updated".to_string(),
            empty_message: "No rows selected".to_string(),
        }
    }

    /// Sets the identifier resolver (builder pattern).
    pub fn with_resolver(mut self, resolver: IdResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Sets the row field holding the current status (builder pattern).
    pub fn with_status_field(mut self, field: impl Into<String>) -> Self {
        self.status_field = field.into();
        self
    }

    /// Sets the success notification text (builder pattern).
    pub fn with_success_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = message.into();
        self
    }

    /// Sets the empty-selection notification text (builder pattern).
    pub fn with_empty_message(mut self, message: impl Into<String>) -> Self {
        self.empty_message = message.into();
        self
    }

    /// Finalizes into a [`BulkAction`] triggered by `binding`.
    pub fn into_bulk_action(self, binding: Binding) -> BulkAction {
        let Self {
            updater,
            resolver,
            status,
            status_field,
            success_message,
            empty_message,
        } = self;

        let visibility_field = status_field.clone();
        let show_when = move |rows: &[Row], selected: &HashSet<usize>| {
            selected
                .iter()
                .filter_map(|i| rows.get(*i))
                .any(|row| match row_status(row, &visibility_field) {
                    Some(current) => current != status.to_string(),
                    None => true,
                })
        };

        let handler = move |rows: &[Row], selected: &HashSet<usize>| -> Option<Cmd> {
            if selected.is_empty() {
                return Some(outcome_cmd(ActionOutcomeMsg::failure(&empty_message)));
            }
            let ids = match resolver.resolve_selected(rows, selected) {
                Ok(ids) => ids,
                Err(err) => {
                    return Some(outcome_cmd(ActionOutcomeMsg::failure(err.to_string())));
                }
            };
            if ids.is_empty() {
                return Some(outcome_cmd(ActionOutcomeMsg::failure(&empty_message)));
            }
            let payload = StatusPayload { ids, status };
            let updater = updater.clone();
            let success = success_message.clone();
            Some(Box::pin(async move {
                let outcome = match updater.update_status(&payload).await {
                    Ok(()) => ActionOutcomeMsg::success(success),
                    Err(err) => ActionOutcomeMsg::failure(err.to_string()),
                };
                Some(Box::new(outcome) as Msg)
            }))
        };

        BulkAction::new(binding, handler).with_show_when(show_when)
    }
}

fn row_status(row: &Row, field: &str) -> Option<String> {
    match row.get(field) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key;
    use serde_json::json;
    use std::sync::Mutex;

    fn binding() -> Binding {
        key::new_binding(vec![key::with_keys_str(&["a"])])
    }

    fn row(value: Value) -> Row {
        value.as_object().cloned().expect("object row")
    }

    fn status_rows() -> Vec<Row> {
        vec![
            row(json!({"id": 1, "status": "1"})),
            row(json!({"id": 2, "status": "0"})),
            row(json!({"id": 3, "status": "1"})),
        ]
    }

    struct RecordingUpdater {
        payloads: Mutex<Vec<StatusPayload>>,
        fail_with: Option<String>,
    }

    impl RecordingUpdater {
        fn ok() -> Arc<Self> {
            Arc::new(Self {
                payloads: Mutex::new(Vec::new()),
                fail_with: None,
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                payloads: Mutex::new(Vec::new()),
                fail_with: Some(message.to_string()),
            })
        }

        fn calls(&self) -> usize {
            self.payloads.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl StatusUpdater for RecordingUpdater {
        async fn update_status(&self, payload: &StatusPayload) -> Result<(), DataSourceError> {
            self.payloads.lock().unwrap().push(payload.clone());
            match &self.fail_with {
                Some(message) => Err(DataSourceError::Backend(message.clone())),
                None => Ok(()),
            }
        }
    }

    async fn outcome_of(cmd: Cmd) -> ActionOutcomeMsg {
        let msg = cmd.await.expect("outcome message");
        msg.downcast_ref::<ActionOutcomeMsg>()
            .expect("ActionOutcomeMsg")
            .clone()
    }

    #[test]
    fn test_activate_visible_only_with_inactive_selection() {
        let activate = StatusAction::new(RecordingUpdater::ok(), 1).into_bulk_action(binding());
        let deactivate = StatusAction::new(RecordingUpdater::ok(), 0).into_bulk_action(binding());
        let rows = status_rows();

        // Row 0 is active: deactivate applies, activate does not.
        let selected: HashSet<usize> = [0].into_iter().collect();
        assert!(!activate.visible(&rows, &selected));
        assert!(deactivate.visible(&rows, &selected));

        // Row 1 is inactive: the other way around.
        let selected: HashSet<usize> = [1].into_iter().collect();
        assert!(activate.visible(&rows, &selected));
        assert!(!deactivate.visible(&rows, &selected));
    }

    #[test]
    fn test_hidden_with_empty_selection() {
        let activate = StatusAction::new(RecordingUpdater::ok(), 1).into_bulk_action(binding());
        assert!(!activate.visible(&status_rows(), &HashSet::new()));
    }

    #[test]
    fn test_action_without_show_when_is_always_visible() {
        let action = BulkAction::new(binding(), |_, _| None);
        assert!(action.visible(&[], &HashSet::new()));
    }

    #[tokio::test]
    async fn test_status_round_trip_payload() {
        let updater = RecordingUpdater::ok();
        let action = StatusAction::new(updater.clone(), 2)
            .with_success_message("Invoices updated")
            .into_bulk_action(binding());
        let rows = status_rows();
        let selected: HashSet<usize> = [0, 2].into_iter().collect();

        let cmd = action.dispatch(&rows, &selected).expect("cmd");
        let outcome = outcome_of(cmd).await;

        let payloads = updater.payloads.lock().unwrap();
        assert_eq!(payloads.len(), 1);
        assert_eq!(
            payloads[0].ids,
            vec![EntityId::Number(1), EntityId::Number(3)]
        );
        assert_eq!(payloads[0].status, 2);
        drop(payloads);

        assert!(outcome.refresh);
        assert_eq!(outcome.severity, Severity::Success);
        assert_eq!(outcome.message, "Invoices updated");
    }

    #[tokio::test]
    async fn test_empty_selection_aborts_without_request() {
        let updater = RecordingUpdater::ok();
        let action = StatusAction::new(updater.clone(), 1)
            .with_empty_message("No invoices selected")
            .into_bulk_action(binding());

        let cmd = action.dispatch(&status_rows(), &HashSet::new()).expect("cmd");
        let outcome = outcome_of(cmd).await;

        assert_eq!(updater.calls(), 0);
        assert!(!outcome.refresh);
        assert_eq!(outcome.message, "No invoices selected");
    }

    #[tokio::test]
    async fn test_unresolvable_row_aborts_without_request() {
        let updater = RecordingUpdater::ok();
        let action = StatusAction::new(updater.clone(), 1).into_bulk_action(binding());
        let rows = vec![row(json!({"status": "0", "customer": "Acme"}))];
        let selected: HashSet<usize> = [0].into_iter().collect();

        let cmd = action.dispatch(&rows, &selected).expect("cmd");
        let outcome = outcome_of(cmd).await;

        assert_eq!(updater.calls(), 0);
        assert!(!outcome.refresh);
        assert_eq!(outcome.severity, Severity::Error);
    }

    #[tokio::test]
    async fn test_backend_failure_reports_message_without_refresh() {
        let updater = RecordingUpdater::failing("Invoices are locked");
        let action = StatusAction::new(updater.clone(), 1).into_bulk_action(binding());
        let rows = status_rows();
        let selected: HashSet<usize> = [1].into_iter().collect();

        let cmd = action.dispatch(&rows, &selected).expect("cmd");
        let outcome = outcome_of(cmd).await;

        assert_eq!(updater.calls(), 1);
        assert!(!outcome.refresh);
        assert_eq!(outcome.message, "Invoices are locked");
    }

    #[tokio::test]
    async fn test_row_action_receives_row() {
        let action = RowAction::new(binding(), |row| {
            let id = row.get("id").and_then(Value::as_i64).unwrap_or(0);
            Some(outcome_cmd(ActionOutcomeMsg::success(format!(
                "viewed {}",
                id
            ))))
        });
        let cmd = action.dispatch(&row(json!({"id": 7}))).expect("cmd");
        let outcome = outcome_of(cmd).await;
        assert_eq!(outcome.message, "viewed 7");
    }

    #[test]
    fn test_status_payload_json_shape() {
        let payload = StatusPayload {
            ids: vec![EntityId::Text("abc".to_string()), EntityId::Number(2)],
            status: 1,
        };
        assert_eq!(
            payload.to_json(),
            json!({"ids": ["abc", 2], "status": 1})
        );
    }
}
