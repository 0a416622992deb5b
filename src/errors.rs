use std::path::PathBuf;
use thiserror::Error;

/// Boxed engine or transport error carried as the `source()` of an [`ExecutionError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure while dispatching a generated command to the engine.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("failed to open administrative connection: {0}")]
    Connect(#[source] BoxError),
    #[error("engine rejected command: {0}")]
    Command(#[source] BoxError),
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("a snapshot already exists at {}", path.display())]
    ExistingSnapshot { path: PathBuf },

    #[error("no snapshot exists at {}", path.display())]
    NoSnapshot { path: PathBuf },

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SnapshotError>;
