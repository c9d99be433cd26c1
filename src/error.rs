use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors that abort a run.
///
/// Lint violations are never reported through this type, they are collected
/// as results instead.
#[derive(Debug, Error)]
pub enum TaskError {
    /// Neither a preset nor explicit rules were given, or the linter rejected them.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unable to read {}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The linter could not process a snippet at all.
    #[error("Linter crashed on a code block in {file}: {message}")]
    LinterCrash { file: String, message: String },

    #[error("Failed to write report: {0}")]
    Output(#[from] io::Error),
}

impl TaskError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}
