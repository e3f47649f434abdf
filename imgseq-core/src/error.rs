use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Why a single filesystem step of a batch failed.
#[derive(Error, Debug)]
pub enum RenameError {
    #[error("{source} (gave up after {attempts} attempts)")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: io::Error,
    },

    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("target already exists: {}", .0.display())]
    TargetExists(PathBuf),

    #[error("cancelled before rename started")]
    Cancelled,
}

impl RenameError {
    /// The underlying OS error, when there is one.
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            Self::RetriesExhausted { source, .. } => Some(source),
            Self::Io(err) => Some(err),
            Self::TargetExists(_) | Self::Cancelled => None,
        }
    }
}
