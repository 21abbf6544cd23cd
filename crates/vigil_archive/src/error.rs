//! Error types for classification and migration.
//!
//! Every variant here is an unrecoverable format error: the caller logs it,
//! leaves the source file in place for manual triage, and keeps running.
//! Nothing in this crate deletes a source file.

use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ArchiveError>;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed filename '{name}': {reason}")]
    Filename { name: String, reason: String },

    #[error("unrecognized GNSS stream selector '{0}'")]
    UnknownStream(char),

    #[error("no station mapped to receiver serial {0}")]
    UnknownSerial(u32),

    #[error("invalid date encoded in filename: {0}")]
    InvalidDate(String),

    #[error("corrupt miniSEED file: {0}")]
    CorruptMiniseed(String),

    #[error("image modality directory not recognized for '{0}'")]
    UnknownModality(String),

    #[error("gas-probe file '{0}' does not contain a header and a data line")]
    TruncatedGasFile(String),

    #[error("archive copy failed with exit status {0}")]
    CopyFailed(i32),
}

impl ArchiveError {
    /// Build a `Filename` error for `path`-like inputs.
    pub fn filename(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ArchiveError::Filename {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
