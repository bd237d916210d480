use std::{fmt, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::FileSelectionError;

/// Visual weight of a displayed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Warning,
    Danger,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Danger => "danger",
        }
    }

    pub fn css_class(self) -> String {
        format!("alert alert-{}", self.as_str())
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chart kind requested from the service. The service decides which kinds it
/// supports (`bar`, `pie` and `line` today), so any name is carried through.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChartType(String);

impl ChartType {
    pub const BAR: &'static str = "bar";
    pub const PIE: &'static str = "pie";
    pub const LINE: &'static str = "line";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ChartType {
    fn default() -> Self {
        Self::new(Self::BAR)
    }
}

impl From<&str> for ChartType {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The file currently held by the file picker.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub content: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FileSelectionError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| FileSelectionError::InvalidName(path.display().to_string()))?
            .to_string();
        let content = fs::read(path).map_err(|source| FileSelectionError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self { name, content })
    }

    pub fn len(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("len", &self.content.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_maps_to_alert_class() {
        assert_eq!(Severity::Success.css_class(), "alert alert-success");
        assert_eq!(Severity::Warning.css_class(), "alert alert-warning");
        assert_eq!(Severity::Danger.css_class(), "alert alert-danger");
    }

    #[test]
    fn chart_type_defaults_to_bar_and_serializes_as_plain_string() {
        assert_eq!(ChartType::default().as_str(), "bar");
        let json = serde_json::to_string(&ChartType::from("pie")).expect("serialize");
        assert_eq!(json, "\"pie\"");
    }

    #[test]
    fn selected_file_from_path_uses_file_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sales.csv");
        fs::write(&path, b"month,total\njan,3\n").expect("write");

        let file = SelectedFile::from_path(&path).expect("select");
        assert_eq!(file.name, "sales.csv");
        assert_eq!(file.len(), 18);
    }

    #[test]
    fn selected_file_from_missing_path_fails() {
        let err = SelectedFile::from_path("/definitely/not/here.csv").expect_err("must fail");
        assert!(matches!(err, FileSelectionError::Read { .. }));
    }
}
