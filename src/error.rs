use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("batch_size must be at least 1")]
    ZeroBatchSize,
}

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("could not build storage client: {0}")]
    Client(#[from] object_store::Error),
    #[error("could not start listing runtime: {0}")]
    Runtime(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum ListError {
    #[error("storage denied access during listing: {0}")]
    Unauthorized(#[source] object_store::Error),
    #[error("listing request failed: {0}")]
    Backend(#[source] object_store::Error),
    #[error("could not walk local tree: {0}")]
    Tree(#[from] walkdir::Error),
    #[error("could not stat {}: {source}", path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ListError {
    pub fn from_backend(err: object_store::Error) -> Self {
        match err {
            object_store::Error::Unauthenticated { .. }
            | object_store::Error::PermissionDenied { .. } => ListError::Unauthorized(err),
            _ => ListError::Backend(err),
        }
    }

    /// True when fixing credentials could help, as opposed to a transport
    /// or backend failure.
    pub fn is_auth(&self) -> bool {
        matches!(self, ListError::Unauthorized(_))
    }
}

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("could not open checkpoint {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("checkpoint {} is missing the '{column}' column, refusing to resume from it", path.display())]
    MissingColumn { path: PathBuf, column: &'static str },
    #[error("checkpoint {} contains an unreadable row: {source}", path.display())]
    Row {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("could not encode batch for {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("could not append batch to {}: {source}", path.display())]
    Append {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("no checkpoint data at {}, nothing to report", .0.display())]
    NoData(PathBuf),
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
    #[error("could not read checkpoint row: {0}")]
    Row(#[from] csv::Error),
    #[error("could not write report {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}
