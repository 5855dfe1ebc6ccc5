//! Export triggers and download handling.
//!
//! An export asks the backend to generate a file for the current filtered
//! view and hands the returned URL to a [`DownloadSink`]. The backend
//! response names the URL inconsistently (`download_url` or `url`,
//! sometimes nested under `data`), so extraction goes through one
//! documented fallback chain. A response with no URL is a failure; nothing
//! is retried.

use crate::actions::ActionOutcomeMsg;
use crate::datasource::{DataSourceError, QueryParams};
use async_trait::async_trait;
use bubbletea_rs::{Cmd, Msg};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Shown when an export response carries no usable URL.
pub const MISSING_URL_ERROR: &str = "Failed to get download file";

/// File formats accepted by export endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values.
    Csv,
    /// Excel workbook.
    Xlsx,
    /// PDF document.
    Pdf,
}

impl ExportFormat {
    /// The wire value for the `format` parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
            Self::Pdf => "pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An export request: the format plus the filters of the current view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    /// The requested file format.
    pub format: ExportFormat,
    /// Filter parameters describing what to export.
    pub params: QueryParams,
}

impl ExportRequest {
    /// Creates a request with no filters.
    pub fn new(format: ExportFormat) -> Self {
        Self {
            format,
            params: QueryParams::new(),
        }
    }

    /// Sets the filter parameters (builder pattern).
    pub fn with_params(mut self, params: QueryParams) -> Self {
        self.params = params;
        self
    }

    /// Builds the outgoing parameter set, `{format, ...filters}`.
    pub fn query(&self) -> QueryParams {
        let mut query = QueryParams::new();
        query.insert("format", self.format.as_str());
        for (key, value) in self.params.iter() {
            query.insert(key, value);
        }
        query
    }
}

/// Asks the backend to generate an export file.
///
/// Returns the raw response body; URL extraction happens on this side via
/// [`extract_download_url`].
#[async_trait]
pub trait Exporter: Send + Sync {
    /// Requests file generation for `req`.
    async fn export(&self, req: &ExportRequest) -> Result<Value, DataSourceError>;
}

/// Receives the generated file URL.
///
/// Implementations decide what a download means in their context: opening
/// the URL, streaming it to disk, or copying it for the user.
#[async_trait]
pub trait DownloadSink: Send + Sync {
    /// Retrieves or hands off the file at `url`.
    async fn download(&self, url: &str) -> Result<(), DataSourceError>;
}

/// Extracts the download URL from an export response body.
///
/// Checked in order: `download_url`, `url`, `data.download_url`,
/// `data.url`. Empty strings count as missing.
pub fn extract_download_url(body: &Value) -> Option<String> {
    for pointer in ["/download_url", "/url", "/data/download_url", "/data/url"] {
        if let Some(url) = body
            .pointer(pointer)
            .and_then(Value::as_str)
            .filter(|u| !u.is_empty())
        {
            return Some(url.to_string());
        }
    }
    None
}

/// A configured export flow: request generation, extract the URL, hand it
/// to the sink, report the outcome.
///
/// # Examples
///
/// ```rust,no_run
/// use bubbletea_datatable::export::{
///     DownloadSink, ExportAction, ExportFormat, Exporter, ExportRequest,
/// };
/// use bubbletea_datatable::datasource::{DataSourceError, QueryParams};
/// use async_trait::async_trait;
/// use serde_json::{json, Value};
/// use std::sync::Arc;
///
/// struct InvoiceApi;
///
/// #[async_trait]
/// impl Exporter for InvoiceApi {
///     async fn export(&self, _req: &ExportRequest) -> Result<Value, DataSourceError> {
///         Ok(json!({"download_url": "https://files.example/invoices.csv"}))
///     }
/// }
///
/// struct SaveToDisk;
///
/// #[async_trait]
/// impl DownloadSink for SaveToDisk {
///     async fn download(&self, _url: &str) -> Result<(), DataSourceError> {
///         Ok(())
///     }
/// }
///
/// let action = ExportAction::new(Arc::new(InvoiceApi), Arc::new(SaveToDisk), ExportFormat::Csv);
/// let _cmd = action.command(&QueryParams::new());
/// ```
pub struct ExportAction {
    exporter: Arc<dyn Exporter>,
    sink: Arc<dyn DownloadSink>,
    format: ExportFormat,
    success_message: String,
}

impl ExportAction {
    /// Creates an export action for `format`.
    pub fn new(
        exporter: Arc<dyn Exporter>,
        sink: Arc<dyn DownloadSink>,
        format: ExportFormat,
    ) -> Self {
        Self {
            exporter,
            sink,
            format,
            success_message: "Download started".to_string(),
        }
    }

    /// Sets the success notification text (builder pattern).
    pub fn with_success_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = message.into();
        self
    }

    /// The format this action exports.
    pub fn format(&self) -> ExportFormat {
        self.format
    }

    /// Runs the export with the given view filters.
    ///
    /// The command resolves to an [`ActionOutcomeMsg`]; export outcomes
    /// never trigger a re-fetch.
    pub fn command(&self, params: &QueryParams) -> Cmd {
        let req = ExportRequest::new(self.format).with_params(params.clone());
        let exporter = self.exporter.clone();
        let sink = self.sink.clone();
        let success = self.success_message.clone();
        Box::pin(async move {
            let outcome = run_export(exporter, sink, req, success).await;
            Some(Box::new(outcome) as Msg)
        })
    }
}

impl fmt::Debug for ExportAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportAction")
            .field("format", &self.format)
            .finish()
    }
}

async fn run_export(
    exporter: Arc<dyn Exporter>,
    sink: Arc<dyn DownloadSink>,
    req: ExportRequest,
    success_message: String,
) -> ActionOutcomeMsg {
    let body = match exporter.export(&req).await {
        Ok(body) => body,
        Err(err) => return ActionOutcomeMsg::failure(err.to_string()),
    };
    let url = match extract_download_url(&body) {
        Some(url) => url,
        None => return ActionOutcomeMsg::failure(MISSING_URL_ERROR),
    };
    match sink.download(&url).await {
        Ok(()) => ActionOutcomeMsg::completed(success_message),
        Err(err) => ActionOutcomeMsg::failure(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::Severity;
    use serde_json::json;
    use std::sync::Mutex;

    struct StubExporter {
        body: Result<Value, DataSourceError>,
        requests: Mutex<Vec<ExportRequest>>,
    }

    impl StubExporter {
        fn returning(body: Value) -> Arc<Self> {
            Arc::new(Self {
                body: Ok(body),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                body: Err(DataSourceError::Backend(message.to_string())),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Exporter for StubExporter {
        async fn export(&self, req: &ExportRequest) -> Result<Value, DataSourceError> {
            self.requests.lock().unwrap().push(req.clone());
            self.body.clone()
        }
    }

    struct RecordingSink {
        urls: Mutex<Vec<String>>,
    }

    impl RecordingSink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                urls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl DownloadSink for RecordingSink {
        async fn download(&self, url: &str) -> Result<(), DataSourceError> {
            self.urls.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    async fn outcome_of(cmd: Cmd) -> ActionOutcomeMsg {
        let msg = cmd.await.expect("outcome message");
        msg.downcast_ref::<ActionOutcomeMsg>()
            .expect("ActionOutcomeMsg")
            .clone()
    }

    #[test]
    fn test_url_fallback_chain() {
        assert_eq!(
            extract_download_url(&json!({"download_url": "https://x/a.csv"})),
            Some("https://x/a.csv".to_string())
        );
        assert_eq!(
            extract_download_url(&json!({"url": "https://x/b.csv"})),
            Some("https://x/b.csv".to_string())
        );
        assert_eq!(
            extract_download_url(&json!({"data": {"download_url": "https://x/c.csv"}})),
            Some("https://x/c.csv".to_string())
        );
        assert_eq!(
            extract_download_url(&json!({"download_url": "x", "url": "y"})),
            Some("x".to_string())
        );
    }

    #[test]
    fn test_empty_url_counts_as_missing() {
        assert_eq!(extract_download_url(&json!({"download_url": ""})), None);
        assert_eq!(extract_download_url(&json!({"success": true})), None);
    }

    #[test]
    fn test_request_query_includes_format_and_filters() {
        let mut params = QueryParams::new();
        params.insert("warehouse", "3");
        params.insert("from_date", "");
        let query = ExportRequest::new(ExportFormat::Xlsx)
            .with_params(params)
            .query();
        assert_eq!(query.get("format"), Some("xlsx"));
        assert_eq!(query.get("warehouse"), Some("3"));
        assert!(!query.contains_key("from_date"));
    }

    #[test]
    fn test_format_wire_values() {
        assert_eq!(ExportFormat::Csv.to_string(), "csv");
        assert_eq!(ExportFormat::Xlsx.to_string(), "xlsx");
        assert_eq!(ExportFormat::Pdf.to_string(), "pdf");
    }

    #[tokio::test]
    async fn test_successful_export_downloads_url() {
        let exporter = StubExporter::returning(json!({"download_url": "https://x/inv.csv"}));
        let sink = RecordingSink::new();
        let action = ExportAction::new(exporter.clone(), sink.clone(), ExportFormat::Csv);

        let mut params = QueryParams::new();
        params.insert("warehouse", "3");
        let outcome = outcome_of(action.command(&params)).await;

        assert_eq!(
            sink.urls.lock().unwrap().as_slice(),
            ["https://x/inv.csv".to_string()]
        );
        assert_eq!(outcome.severity, Severity::Success);
        assert!(!outcome.refresh);

        let requests = exporter.requests.lock().unwrap();
        assert_eq!(requests[0].query().get("warehouse"), Some("3"));
    }

    #[tokio::test]
    async fn test_response_without_url_fails_without_download() {
        let exporter = StubExporter::returning(json!({"success": true}));
        let sink = RecordingSink::new();
        let action = ExportAction::new(exporter, sink.clone(), ExportFormat::Csv);

        let outcome = outcome_of(action.command(&QueryParams::new())).await;

        assert!(sink.urls.lock().unwrap().is_empty());
        assert_eq!(outcome.message, MISSING_URL_ERROR);
        assert_eq!(outcome.severity, Severity::Error);
    }

    #[tokio::test]
    async fn test_backend_failure_surfaces_message() {
        let exporter = StubExporter::failing("Export quota exceeded");
        let sink = RecordingSink::new();
        let action = ExportAction::new(exporter, sink.clone(), ExportFormat::Pdf);

        let outcome = outcome_of(action.command(&QueryParams::new())).await;

        assert!(sink.urls.lock().unwrap().is_empty());
        assert_eq!(outcome.message, "Export quota exceeded");
    }
}
