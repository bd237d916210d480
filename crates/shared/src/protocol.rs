use serde::{Deserialize, Serialize};

use crate::domain::ChartType;

pub const STATUS_SUCCESS: &str = "success";

pub const UPLOAD_PATH: &str = "upload";
pub const GENERATE_CHART_PATH: &str = "generate_chart";
pub const CLEAR_PATH: &str = "clear";
pub const GENERATE_REPORT_PATH: &str = "generate_report";

/// Multipart field carrying the uploaded file.
pub const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateChartRequest {
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub filename: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateChartResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClearResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateReportRequest {
    pub filename: String,
    pub charts: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateReportResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Common view over the `{status, message}` envelope the service replies with.
pub trait StatusReply {
    fn status(&self) -> &str;
    fn message(&self) -> Option<&str>;

    fn is_success(&self) -> bool {
        self.status() == STATUS_SUCCESS
    }

    /// Text shown when the service reports a failure.
    fn failure_message(&self) -> String {
        match self.message() {
            Some(message) => message.to_string(),
            None => format!("server reported status '{}'", self.status()),
        }
    }
}

macro_rules! status_reply {
    ($name:ident) => {
        impl StatusReply for $name {
            fn status(&self) -> &str {
                &self.status
            }

            fn message(&self) -> Option<&str> {
                self.message.as_deref()
            }
        }
    };
}

status_reply!(GenerateChartResponse);
status_reply!(ClearResponse);
status_reply!(GenerateReportResponse);
