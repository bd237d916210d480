//! Error taxonomy for controller workflows.

use std::fmt;

use shared::domain::Severity;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Workflow {
    Upload,
    GenerateChart,
    Clear,
    GenerateReport,
}

impl Workflow {
    pub fn as_str(self) -> &'static str {
        match self {
            Workflow::Upload => "upload",
            Workflow::GenerateChart => "generate_chart",
            Workflow::Clear => "clear",
            Workflow::GenerateReport => "generate_report",
        }
    }

    /// Fixed text shown when the request could not complete.
    pub fn transport_failure_message(self) -> &'static str {
        match self {
            Workflow::Upload => "An error occurred during the upload.",
            Workflow::GenerateChart => "An error occurred while generating the chart.",
            Workflow::Clear => "An error occurred while clearing files.",
            Workflow::GenerateReport => "An error occurred while generating the report.",
        }
    }
}

impl fmt::Display for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A precondition that failed before any request was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please select a file to upload.")]
    NoFileToUpload,
    #[error("Please upload a file first.")]
    NoFileSelected,
    #[error("No charts to include in the report.")]
    NoCharts,
}

impl ValidationError {
    pub fn severity(self) -> Severity {
        match self {
            ValidationError::NoFileToUpload => Severity::Danger,
            ValidationError::NoFileSelected | ValidationError::NoCharts => Severity::Warning,
        }
    }
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{workflow} rejected by server: {message}")]
    ServerReported { workflow: Workflow, message: String },
    #[error("{workflow} request failed: {source}")]
    Transport {
        workflow: Workflow,
        #[source]
        source: anyhow::Error,
    },
}

impl WorkflowError {
    pub fn transport(workflow: Workflow, source: impl Into<anyhow::Error>) -> Self {
        Self::Transport {
            workflow,
            source: source.into(),
        }
    }

    /// Text the page shows for this failure.
    pub fn user_message(&self) -> String {
        match self {
            WorkflowError::Validation(err) => err.to_string(),
            WorkflowError::ServerReported { message, .. } => message.clone(),
            WorkflowError::Transport { workflow, .. } => {
                workflow.transport_failure_message().to_string()
            }
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            WorkflowError::Validation(err) => err.severity(),
            WorkflowError::ServerReported { .. } | WorkflowError::Transport { .. } => {
                Severity::Danger
            }
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, WorkflowError::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;

    #[test]
    fn validation_errors_carry_fixed_text_and_severity() {
        let err = WorkflowError::from(ValidationError::NoCharts);
        assert_eq!(err.user_message(), "No charts to include in the report.");
        assert_eq!(err.severity(), Severity::Warning);
        assert!(err.is_validation());

        let err = WorkflowError::from(ValidationError::NoFileToUpload);
        assert_eq!(err.severity(), Severity::Danger);
    }

    #[test]
    fn transport_errors_hide_detail_from_page() {
        let err = WorkflowError::transport(Workflow::Clear, anyhow!("connection refused"));
        assert_eq!(err.user_message(), "An error occurred while clearing files.");
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn server_reported_errors_show_message_verbatim() {
        let err = WorkflowError::ServerReported {
            workflow: Workflow::GenerateChart,
            message: "Invalid chart type".into(),
        };
        assert_eq!(err.user_message(), "Invalid chart type");
        assert_eq!(err.severity(), Severity::Danger);
    }
}
