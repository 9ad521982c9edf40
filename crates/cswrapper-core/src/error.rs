//! Adapter error taxonomy.

use std::path::PathBuf;

use crate::types::{FmuType, Status};

/// Errors raised while creating or driving an adapter instance.
///
/// Nothing here crosses the C boundary directly: every variant is turned
/// into an FMI status with [`WrapperError::status`].
#[derive(Debug, thiserror::Error)]
pub enum WrapperError {
    #[error("Failed to locate the adapter library: {0}")]
    LocationUnknown(String),

    #[error("Adapter path {path:?} does not end with the expected suffix {suffix:?}")]
    InvalidAdapterPath { path: PathBuf, suffix: String },

    #[error("Companion path {0:?} is the adapter itself")]
    CompanionIsAdapter(PathBuf),

    #[error("Failed to load companion library {path:?}: {reason}")]
    LoadFailed { path: PathBuf, reason: String },

    #[error("Companion library is missing required symbols: {}", .0.join(", "))]
    MissingSymbols(Vec<String>),

    #[error("Incompatible companion version: expected {expected}, got {found}")]
    IncompatibleVersion { expected: String, found: String },

    #[error("Argument fmuType must be fmi2CoSimulation, got {0}")]
    WrongConvention(FmuType),

    #[error("Companion fmi2Instantiate returned null")]
    CompanionInstantiation,

    #[error("Null instance handle passed to {0}")]
    NullHandle(&'static str),

    #[error("{0} is not supported by this FMU")]
    UnsupportedOperation(&'static str),

    #[error("Companion returned {0}")]
    NativeFailure(Status),
}

impl WrapperError {
    /// The status reported to the caller for this failure.
    pub fn status(&self) -> Status {
        match self {
            WrapperError::NativeFailure(status) => *status,
            _ => Status::ERROR,
        }
    }
}

/// Result type for adapter operations.
pub type Result<T> = std::result::Result<T, WrapperError>;
