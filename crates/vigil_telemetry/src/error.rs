//! Error types for telemetry and acquisition.

use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TelemetryError>;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Archive(#[from] vigil_archive::ArchiveError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("transceiver unreachable at {0}")]
    TransceiverUnreachable(String),

    #[error("relay power-on failed with exit status {0}")]
    PowerOnFailed(i32),

    #[error("remote machine unreachable at {0}")]
    HubUnreachable(String),

    #[error("instrument unreachable at {0}")]
    InstrumentUnreachable(String),

    #[error("transfer failed with exit status {0}")]
    TransferFailed(i32),

    #[error("query failed with exit status {0}")]
    QueryFailed(i32),

    #[error("file has no owning stream directory: {0}")]
    InvalidPath(String),
}

impl TelemetryError {
    /// Exit status to propagate from CLI invocations: the underlying
    /// command's status where one exists, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            TelemetryError::PowerOnFailed(code)
            | TelemetryError::TransferFailed(code)
            | TelemetryError::QueryFailed(code) => *code,
            _ => 1,
        }
    }
}
