use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::StatusCode;
use shared::{
    domain::{ChartType, SelectedFile, Severity},
    protocol::{
        ClearResponse, GenerateChartRequest, GenerateChartResponse, GenerateReportRequest,
        GenerateReportResponse, StatusReply, UploadResponse, CLEAR_PATH, GENERATE_CHART_PATH,
        GENERATE_REPORT_PATH, UPLOAD_FIELD, UPLOAD_PATH,
    },
};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use url::Url;

pub mod commands;
pub mod error;
pub mod page;
pub mod progress;
pub mod transport;

pub use commands::{dispatch, execute, CommandError, ControllerCommand};
pub use error::{ValidationError, Workflow, WorkflowError};
pub use page::{Alert, ChartHandle, ChartImage, PageSnapshot, ProgressIndicator};
pub use transport::FetchedResource;

use page::PageState;
use progress::ProgressTracker;
use transport::HttpTransport;

const CHART_GENERATED_MESSAGE: &str = "Chart generated successfully.";
const REPORT_GENERATED_MESSAGE: &str = "Report generated successfully.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    FileSelected(Option<String>),
    MessageChanged(Option<Alert>),
    ProgressChanged(ProgressIndicator),
    ActionsRevealed,
    ChartAppended(ChartImage),
    ChartsCleared { removed: usize },
    Navigate(String),
}

/// Workflow surface exposed to hosts and page bindings.
#[async_trait]
pub trait ClientHandle: Send + Sync {
    fn select_file(&self, file: Option<SelectedFile>);
    async fn upload(&self) -> Result<String, WorkflowError>;
    async fn generate_chart(&self, chart_type: ChartType) -> Result<String, WorkflowError>;
    async fn clear_chart(&self) -> Result<(), WorkflowError>;
    async fn download_report(&self) -> Result<String, WorkflowError>;
    fn snapshot(&self) -> PageSnapshot;
    fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent>;
}

#[derive(Default)]
struct ControllerState {
    page: PageState,
    chart_urls: Vec<String>,
}

fn lock_state(state: &Mutex<ControllerState>) -> MutexGuard<'_, ControllerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Upload/chart controller. Owns the page model and the chart URL list for
/// the lifetime of the session.
pub struct ChartDeskClient {
    transport: HttpTransport,
    inner: Arc<Mutex<ControllerState>>,
    events: broadcast::Sender<ClientEvent>,
}

impl ChartDeskClient {
    pub fn new(server_url: Url) -> Arc<Self> {
        let (events, _) = broadcast::channel(1024);
        Arc::new(Self {
            transport: HttpTransport::new(server_url),
            inner: Arc::new(Mutex::new(ControllerState::default())),
            events,
        })
    }

    pub fn server_url(&self) -> &Url {
        self.transport.base_url()
    }

    pub fn chart_urls(&self) -> Vec<String> {
        self.state().chart_urls.clone()
    }

    /// Puts a rendered chart on the page canvas; a successful clear tears it
    /// down.
    pub fn attach_chart(&self, chart: ChartHandle) {
        self.state().page.attach_chart(chart);
    }

    /// Retrieves a server resource such as the document behind a report URL.
    pub async fn fetch(&self, location: &str) -> anyhow::Result<FetchedResource> {
        self.transport.fetch(location).await
    }

    fn state(&self) -> MutexGuard<'_, ControllerState> {
        lock_state(&self.inner)
    }

    fn emit(&self, event: ClientEvent) {
        let _ = self.events.send(event);
    }

    fn show(&self, text: &str, severity: Severity) {
        let alert = {
            let mut state = self.state();
            state.page.display_message(text, severity);
            state.page.message().alert.clone()
        };
        self.emit(ClientEvent::MessageChanged(alert));
    }

    /// Reflects a failed workflow on the page and hands the error back.
    fn reject(&self, err: WorkflowError) -> WorkflowError {
        match &err {
            WorkflowError::Validation(_) => {}
            WorkflowError::ServerReported { workflow, message } => {
                warn!(workflow = %workflow, message = %message, "server reported failure");
            }
            WorkflowError::Transport { workflow, source } => {
                error!(workflow = %workflow, error = %format!("{source:#}"), "request failed");
            }
        }
        self.show(&err.user_message(), err.severity());
        err
    }

    fn hide_progress(&self) {
        let progress = {
            let mut state = self.state();
            state.page.hide_progress();
            state.page.progress()
        };
        self.emit(ClientEvent::ProgressChanged(progress));
    }

    pub async fn upload(&self) -> Result<String, WorkflowError> {
        let file = self.state().page.selected_file().cloned();
        let Some(file) = file else {
            return Err(self.reject(ValidationError::NoFileToUpload.into()));
        };

        let progress = {
            let mut state = self.state();
            state.page.show_progress();
            state.page.clear_message();
            state.page.progress()
        };
        self.emit(ClientEvent::ProgressChanged(progress));
        self.emit(ClientEvent::MessageChanged(None));

        let inner = self.inner.clone();
        let events = self.events.clone();
        let mut tracker = ProgressTracker::default();
        let on_progress = move |sent: u64, total: u64| {
            let Some(percent) = tracker.advance(sent, total) else {
                return;
            };
            let progress = {
                let mut state = lock_state(&inner);
                state.page.set_progress(percent);
                state.page.progress()
            };
            debug!(percent, "upload progress");
            let _ = events.send(ClientEvent::ProgressChanged(progress));
        };

        let result = self
            .transport
            .post_multipart_with_progress(UPLOAD_PATH, UPLOAD_FIELD, &file, on_progress)
            .await;
        self.hide_progress();

        let response =
            result.map_err(|e| self.reject(WorkflowError::transport(Workflow::Upload, e)))?;
        let reply: UploadResponse = serde_json::from_str(&response.body).map_err(|e| {
            self.reject(WorkflowError::transport(
                Workflow::Upload,
                anyhow!(
                    "invalid /{UPLOAD_PATH} response body (HTTP {}): {e}",
                    response.status
                ),
            ))
        })?;

        if response.status != StatusCode::OK {
            return Err(self.reject(WorkflowError::ServerReported {
                workflow: Workflow::Upload,
                message: reply.message,
            }));
        }

        info!(file = %file.name, bytes = file.len(), "upload accepted");
        self.show(&reply.message, Severity::Success);
        self.state().page.reveal_actions();
        self.emit(ClientEvent::ActionsRevealed);
        Ok(reply.message)
    }

    pub async fn generate_chart(&self, chart_type: ChartType) -> Result<String, WorkflowError> {
        let filename = self.state().page.selected_file_name().map(str::to_string);
        let Some(filename) = filename else {
            return Err(self.reject(ValidationError::NoFileSelected.into()));
        };

        let request = GenerateChartRequest {
            chart_type: chart_type.clone(),
            filename,
        };
        let reply: GenerateChartResponse = self
            .transport
            .post_json(GENERATE_CHART_PATH, &request)
            .await
            .map_err(|e| self.reject(WorkflowError::transport(Workflow::GenerateChart, e)))?;

        if !reply.is_success() {
            return Err(self.reject(WorkflowError::ServerReported {
                workflow: Workflow::GenerateChart,
                message: reply.failure_message(),
            }));
        }
        let Some(chart_url) = reply.chart_url else {
            return Err(self.reject(WorkflowError::transport(
                Workflow::GenerateChart,
                anyhow!("success reply without chart_url"),
            )));
        };

        let image = ChartImage::for_chart(&chart_url, chart_type.as_str());
        let alert = {
            let mut state = self.state();
            state
                .page
                .display_message(CHART_GENERATED_MESSAGE, Severity::Success);
            state.page.append_chart_image(image.clone());
            state.chart_urls.push(chart_url.clone());
            state.page.message().alert.clone()
        };
        info!(chart_type = %chart_type, chart_url = %chart_url, "chart generated");
        self.emit(ClientEvent::MessageChanged(alert));
        self.emit(ClientEvent::ChartAppended(image));
        Ok(chart_url)
    }

    pub async fn clear_chart(&self) -> Result<(), WorkflowError> {
        let reply: ClearResponse = self
            .transport
            .post_empty(CLEAR_PATH)
            .await
            .map_err(|e| self.reject(WorkflowError::transport(Workflow::Clear, e)))?;

        if !reply.is_success() {
            return Err(self.reject(WorkflowError::ServerReported {
                workflow: Workflow::Clear,
                message: reply.failure_message(),
            }));
        }

        let (alert, removed, destroyed) = {
            let mut state = self.state();
            state.chart_urls.clear();
            let removed = state.page.remove_chart_images();
            state
                .page
                .display_message(reply.message.as_deref().unwrap_or_default(), Severity::Success);
            let destroyed = state.page.destroy_chart();
            (state.page.message().alert.clone(), removed, destroyed)
        };
        if let Some(chart) = destroyed {
            debug!(chart = %chart.label, "destroyed canvas chart");
        }
        info!(removed, "charts cleared");
        self.emit(ClientEvent::MessageChanged(alert));
        self.emit(ClientEvent::ChartsCleared { removed });
        Ok(())
    }

    pub async fn download_report(&self) -> Result<String, WorkflowError> {
        let (charts, filename) = {
            let state = self.state();
            (
                state.chart_urls.clone(),
                state.page.selected_file_name().map(str::to_string),
            )
        };
        if charts.is_empty() {
            return Err(self.reject(ValidationError::NoCharts.into()));
        }
        let Some(filename) = filename else {
            return Err(self.reject(ValidationError::NoFileSelected.into()));
        };

        let request = GenerateReportRequest { filename, charts };
        let reply: GenerateReportResponse = self
            .transport
            .post_json(GENERATE_REPORT_PATH, &request)
            .await
            .map_err(|e| self.reject(WorkflowError::transport(Workflow::GenerateReport, e)))?;

        if !reply.is_success() {
            return Err(self.reject(WorkflowError::ServerReported {
                workflow: Workflow::GenerateReport,
                message: reply.failure_message(),
            }));
        }
        let Some(report_url) = reply.report_url else {
            return Err(self.reject(WorkflowError::transport(
                Workflow::GenerateReport,
                anyhow!("success reply without report_url"),
            )));
        };

        let alert = {
            let mut state = self.state();
            state
                .page
                .display_message(REPORT_GENERATED_MESSAGE, Severity::Success);
            state.page.navigate(report_url.clone());
            state.page.message().alert.clone()
        };
        info!(report_url = %report_url, charts = request.charts.len(), "report generated");
        self.emit(ClientEvent::MessageChanged(alert));
        self.emit(ClientEvent::Navigate(report_url.clone()));
        Ok(report_url)
    }
}

#[async_trait]
impl ClientHandle for ChartDeskClient {
    fn select_file(&self, file: Option<SelectedFile>) {
        let name = file.as_ref().map(|f| f.name.clone());
        self.state().page.select_file(file);
        self.emit(ClientEvent::FileSelected(name));
    }

    async fn upload(&self) -> Result<String, WorkflowError> {
        ChartDeskClient::upload(self).await
    }

    async fn generate_chart(&self, chart_type: ChartType) -> Result<String, WorkflowError> {
        ChartDeskClient::generate_chart(self, chart_type).await
    }

    async fn clear_chart(&self) -> Result<(), WorkflowError> {
        ChartDeskClient::clear_chart(self).await
    }

    async fn download_report(&self) -> Result<String, WorkflowError> {
        ChartDeskClient::download_report(self).await
    }

    fn snapshot(&self) -> PageSnapshot {
        let state = self.state();
        PageSnapshot::capture(&state.page, &state.chart_urls)
    }

    fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
