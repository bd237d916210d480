//! In-memory page model: the file picker, progress indicator, message area,
//! action buttons, chart canvas and location that the workflows update.

use shared::domain::{SelectedFile, Severity};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub text: String,
    pub severity: Severity,
}

impl Alert {
    pub fn class(&self) -> String {
        self.severity.css_class()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartImage {
    pub src: String,
    pub alt: String,
}

impl ChartImage {
    /// Image for a chart locator returned by the service, which is relative to
    /// the site root.
    pub fn for_chart(chart_url: &str, chart_type: &str) -> Self {
        Self {
            src: format!("/{chart_url}"),
            alt: format!("{chart_type} chart"),
        }
    }
}

/// Single-slot message area. Chart images are appended after the alert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageArea {
    pub alert: Option<Alert>,
    pub images: Vec<ChartImage>,
}

impl MessageArea {
    pub fn is_empty(&self) -> bool {
        self.alert.is_none() && self.images.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressIndicator {
    pub visible: bool,
    pub percent: u8,
}

impl ProgressIndicator {
    pub fn label(&self) -> String {
        format!("{}%", self.percent)
    }
}

/// A chart rendered on the page canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartHandle {
    pub label: String,
}

#[derive(Debug, Default)]
pub struct PageState {
    file_input: Option<SelectedFile>,
    message: MessageArea,
    progress: ProgressIndicator,
    actions_visible: bool,
    chart: Option<ChartHandle>,
    location: Option<String>,
}

impl PageState {
    pub fn select_file(&mut self, file: Option<SelectedFile>) {
        self.file_input = file;
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.file_input.as_ref()
    }

    pub fn selected_file_name(&self) -> Option<&str> {
        self.file_input.as_ref().map(|f| f.name.as_str())
    }

    /// Replaces the message area. An empty text clears it entirely, images
    /// included.
    pub fn display_message(&mut self, text: &str, severity: Severity) {
        self.message.images.clear();
        self.message.alert = if text.is_empty() {
            None
        } else {
            Some(Alert {
                text: text.to_string(),
                severity,
            })
        };
    }

    pub fn clear_message(&mut self) {
        self.message = MessageArea::default();
    }

    pub fn message(&self) -> &MessageArea {
        &self.message
    }

    pub fn append_chart_image(&mut self, image: ChartImage) {
        self.message.images.push(image);
    }

    /// Returns how many images were removed.
    pub fn remove_chart_images(&mut self) -> usize {
        let removed = self.message.images.len();
        self.message.images.clear();
        removed
    }

    pub fn show_progress(&mut self) {
        self.progress = ProgressIndicator {
            visible: true,
            percent: 0,
        };
    }

    pub fn set_progress(&mut self, percent: u8) {
        self.progress.percent = percent.min(100);
    }

    pub fn hide_progress(&mut self) {
        self.progress.visible = false;
    }

    pub fn progress(&self) -> ProgressIndicator {
        self.progress
    }

    pub fn reveal_actions(&mut self) {
        self.actions_visible = true;
    }

    pub fn actions_visible(&self) -> bool {
        self.actions_visible
    }

    pub fn attach_chart(&mut self, chart: ChartHandle) {
        self.chart = Some(chart);
    }

    /// Tears down the canvas chart if one exists.
    pub fn destroy_chart(&mut self) -> Option<ChartHandle> {
        self.chart.take()
    }

    pub fn chart(&self) -> Option<&ChartHandle> {
        self.chart.as_ref()
    }

    pub fn navigate(&mut self, location: impl Into<String>) {
        self.location = Some(location.into());
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }
}

/// Read-only copy of the page handed out to hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSnapshot {
    pub selected_file: Option<String>,
    pub message: MessageArea,
    pub progress: ProgressIndicator,
    pub actions_visible: bool,
    pub chart: Option<ChartHandle>,
    pub location: Option<String>,
    pub chart_urls: Vec<String>,
}

impl PageSnapshot {
    pub(crate) fn capture(page: &PageState, chart_urls: &[String]) -> Self {
        Self {
            selected_file: page.selected_file_name().map(str::to_string),
            message: page.message.clone(),
            progress: page.progress,
            actions_visible: page.actions_visible,
            chart: page.chart.clone(),
            location: page.location.clone(),
            chart_urls: chart_urls.to_vec(),
        }
    }
}
