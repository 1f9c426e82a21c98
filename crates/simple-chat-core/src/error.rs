//! Error taxonomy for simple-chat.
//!
//! Filesystem helpers return `io::Result` and are lifted into [`Error`] at the
//! session boundary, where the variant decides whether the input loop keeps
//! going or the process has to stop.

use std::io;
use std::path::PathBuf;

/// Everything that can go wrong while running a chat session.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Bad or missing configuration, directories, or persisted state.
    #[error("{0}")]
    Config(String),

    /// A prompt or chat could not be written. Never fatal.
    #[error("Couldn't write to {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The remote completion service rejected the request or the stream broke.
    #[error("{0}")]
    Collaborator(String),

    /// Terminal I/O failure (stdin closed mid-dialog, stdout gone).
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    pub fn collaborator(message: impl Into<String>) -> Self {
        Error::Collaborator(message.into())
    }

    /// Whether the error ends the process with status 1.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::Persistence { .. })
    }

    /// Short tag printed in red ahead of the message.
    pub fn tag(&self) -> &'static str {
        match self {
            Error::Config(_) => "CONFIG ERROR",
            Error::Persistence { .. } => "WRITE ERROR",
            Error::Collaborator(_) => "API ERROR",
            Error::Io(_) => "IO ERROR",
        }
    }
}
