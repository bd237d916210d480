use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileSelectionError {
    #[error("'{0}' does not name a file")]
    InvalidName(String),
    #[error("failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
