use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrowseError {
    #[error("chezmoi {command} failed: {message}")]
    ExternalTool { command: String, message: String },

    #[error("cannot resolve path {path:?}: {reason}")]
    PathResolution { path: String, reason: String },

    #[error("failed to read directory {}: {source}", path.display())]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl BrowseError {
    pub fn external(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalTool {
            command: command.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BrowseError>;
