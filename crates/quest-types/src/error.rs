//! Error types for Linux Quest.

use std::io;

/// Errors produced by the simulated filesystem and shell.
///
/// Every variant is recoverable: the shell renders it as a single message
/// line and returns to the prompt.
#[derive(Debug, thiserror::Error)]
pub enum QuestError {
    #[error("{0}: No such file or directory")]
    NotFound(String),

    #[error("{0}: File exists")]
    AlreadyExists(String),

    #[error("{0}: Not a directory")]
    NotADirectory(String),

    #[error("{0}: Is a directory")]
    IsADirectory(String),

    #[error("{0}: Permission denied")]
    PermissionDenied(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}: not supported in a pipeline")]
    UnsupportedInPipeline(String),

    #[error("pipeline aborted at stage {stage}: {source}")]
    PipelineAborted {
        /// 1-based index of the failing stage.
        stage: usize,
        source: Box<QuestError>,
    },

    #[error("{0}: command not found")]
    CommandNotFound(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl QuestError {
    /// Wrap an error as the failure of pipeline stage `stage` (1-based).
    ///
    /// An error that is already a `PipelineAborted` is returned unchanged so
    /// the first failing stage is the one reported.
    pub fn in_stage(self, stage: usize) -> Self {
        match self {
            Self::PipelineAborted { .. } => self,
            other => Self::PipelineAborted {
                stage,
                source: Box::new(other),
            },
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, QuestError>;
