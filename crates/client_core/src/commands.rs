//! Command surface: the actions page controls and hosts can trigger, parsed
//! from text or from the page's `onclick` bindings.

use std::{path::PathBuf, str::FromStr, sync::Arc};

use shared::{
    domain::{ChartType, SelectedFile},
    error::FileSelectionError,
};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::{error::WorkflowError, ClientHandle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerCommand {
    Select(PathBuf),
    Upload,
    GenerateChart(ChartType),
    ClearChart,
    DownloadReport,
}

impl ControllerCommand {
    pub fn name(&self) -> &'static str {
        match self {
            ControllerCommand::Select(_) => "select",
            ControllerCommand::Upload => "upload",
            ControllerCommand::GenerateChart(_) => "generate_chart",
            ControllerCommand::ClearChart => "clear_chart",
            ControllerCommand::DownloadReport => "download_report",
        }
    }

    /// Parses a page binding such as `generateChart('pie')` or `clearChart()`.
    fn from_binding(input: &str) -> Option<Self> {
        let (function, rest) = input.split_once('(')?;
        let args = rest.strip_suffix(')')?.trim();
        let args: Vec<&str> = if args.is_empty() {
            Vec::new()
        } else {
            args.split(',')
                .map(|arg| arg.trim().trim_matches(|c| c == '\'' || c == '"').trim())
                .collect()
        };
        match (function.trim(), args.as_slice()) {
            ("generateChart", []) | ("generateChart", [""]) => {
                Some(ControllerCommand::GenerateChart(ChartType::default()))
            }
            ("generateChart", [chart_type]) => {
                Some(ControllerCommand::GenerateChart(ChartType::from(*chart_type)))
            }
            ("clearChart", []) => Some(ControllerCommand::ClearChart),
            ("downloadReport", []) => Some(ControllerCommand::DownloadReport),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseCommandError {
    #[error("empty command")]
    Empty,
    #[error("'select' needs a file path")]
    MissingPath,
    #[error("unknown command '{0}'")]
    Unknown(String),
    #[error("unexpected arguments for '{0}'")]
    UnexpectedArguments(String),
}

impl FromStr for ControllerCommand {
    type Err = ParseCommandError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim().trim_end_matches(';');
        if input.is_empty() {
            return Err(ParseCommandError::Empty);
        }
        if input.contains('(') {
            return Self::from_binding(input)
                .ok_or_else(|| ParseCommandError::Unknown(input.to_string()));
        }

        let (verb, rest) = match input.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (input, ""),
        };
        let no_args = |cmd: ControllerCommand| {
            if rest.is_empty() {
                Ok(cmd)
            } else {
                Err(ParseCommandError::UnexpectedArguments(verb.to_string()))
            }
        };
        match verb.to_ascii_lowercase().as_str() {
            "select" | "open" => {
                if rest.is_empty() {
                    Err(ParseCommandError::MissingPath)
                } else {
                    Ok(ControllerCommand::Select(PathBuf::from(rest)))
                }
            }
            "upload" | "submit" => no_args(ControllerCommand::Upload),
            "chart" | "generate" => {
                if rest.is_empty() {
                    Ok(ControllerCommand::GenerateChart(ChartType::default()))
                } else {
                    Ok(ControllerCommand::GenerateChart(ChartType::from(rest)))
                }
            }
            "clear" => no_args(ControllerCommand::ClearChart),
            "report" => no_args(ControllerCommand::DownloadReport),
            _ => Err(ParseCommandError::Unknown(verb.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Parse(#[from] ParseCommandError),
    #[error(transparent)]
    FileSelection(#[from] FileSelectionError),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

impl CommandError {
    /// Validation failures are ordinary user feedback and already on the page.
    pub fn is_validation(&self) -> bool {
        matches!(self, CommandError::Workflow(err) if err.is_validation())
    }
}

/// Runs a command to completion. Workflow failures are already shown on the
/// page by the time this returns.
pub async fn execute(
    client: &dyn ClientHandle,
    cmd: ControllerCommand,
) -> Result<(), CommandError> {
    match cmd {
        ControllerCommand::Select(path) => {
            let file = SelectedFile::from_path(&path)?;
            client.select_file(Some(file));
        }
        ControllerCommand::Upload => {
            client.upload().await?;
        }
        ControllerCommand::GenerateChart(chart_type) => {
            client.generate_chart(chart_type).await?;
        }
        ControllerCommand::ClearChart => client.clear_chart().await?,
        ControllerCommand::DownloadReport => {
            client.download_report().await?;
        }
    }
    Ok(())
}

/// Starts a command on its own task. Nothing cancels or orders it against
/// other in-flight commands.
pub fn dispatch(
    client: Arc<dyn ClientHandle>,
    cmd: ControllerCommand,
) -> JoinHandle<Result<(), CommandError>> {
    let cmd_name = cmd.name();
    debug!(command = cmd_name, "dispatching command");
    tokio::spawn(async move {
        let result = execute(&*client, cmd).await;
        match &result {
            Err(err) if !err.is_validation() => {
                debug!(command = cmd_name, error = %err, "command finished with error");
            }
            _ => {}
        }
        result
    })
}
