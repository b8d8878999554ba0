use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CsvBucketError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("local file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    LocalRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("remote object not found: {0}")]
    RemoteNotFound(String),

    #[error("failed to write {}: {source}", path.display())]
    LocalWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {location}: {message}")]
    RemoteWrite { location: String, message: String },

    #[error("failed to read {location}: {message}")]
    RemoteRead { location: String, message: String },

    #[error("malformed csv: {0}")]
    Parse(#[source] csv::Error),

    #[error("failed to build storage client: {0}")]
    Client(String),

    #[error("failed to write output: {0}")]
    Output(#[source] io::Error),
}

impl CsvBucketError {
    /// Stable label used as `error_group` in log events.
    pub fn group(&self) -> &'static str {
        match self {
            CsvBucketError::InvalidArgument(_) => "invalid_argument",
            CsvBucketError::NotFound(_) => "not_found",
            CsvBucketError::LocalRead { .. } => "local_read",
            CsvBucketError::RemoteNotFound(_) => "remote_not_found",
            CsvBucketError::LocalWrite { .. } => "local_write",
            CsvBucketError::RemoteWrite { .. } => "remote_write",
            CsvBucketError::RemoteRead { .. } => "remote_read",
            CsvBucketError::Parse(_) => "parse",
            CsvBucketError::Client(_) => "client",
            CsvBucketError::Output(_) => "output",
        }
    }
}
