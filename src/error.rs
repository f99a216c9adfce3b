//! Error types for Flowkit.
//!
//! All errors in Flowkit are represented by the `FlowkitError` enum,
//! which provides specific variants for the node-level failure taxonomy.
//! Nothing in this taxonomy ever escapes a node's `run`: errors are
//! caught at the node boundary and turned into a declined or failed
//! [`RunOutput`](crate::node::RunOutput).

use std::{io::ErrorKind, string::FromUtf8Error};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for all Flowkit operations.
///
/// Each variant represents a specific category of error that can occur
/// while a node resolves its parameters, calls its external API, or
/// releases its scratch resources.
#[derive(Deserialize, Serialize, Error, Debug, Clone, PartialEq)]
pub enum FlowkitError {
    /// Missing credentials or environment values.
    #[error("{0}")]
    Config(String),

    /// Required parameter absent or malformed.
    #[error("{0}")]
    Input(String),

    /// Third-party API or network failure, non-2xx response, timeout.
    #[error("{0}")]
    External(String),

    /// Scratch-resource release failure. Logged and swallowed at the
    /// node boundary, never escalated.
    #[error("{0}")]
    Cleanup(String),

    /// Data conversion errors (JSON, row decoding, etc.).
    #[error("{0}")]
    Convert(String),

    /// Tool-payload or descriptor schema violations.
    #[error("{0}")]
    Schema(String),

    /// Node registry errors (unknown type identifier).
    #[error("{0}")]
    Registry(String),

    /// I/O operation errors.
    #[error("{0}")]
    IoError(String),
}

impl From<FlowkitError> for String {
    fn from(val: FlowkitError) -> Self {
        val.to_string()
    }
}

impl From<std::io::Error> for FlowkitError {
    fn from(error: std::io::Error) -> Self {
        FlowkitError::IoError(error.to_string())
    }
}

impl From<FlowkitError> for std::io::Error {
    fn from(val: FlowkitError) -> Self {
        #[allow(clippy::io_other_error)]
        std::io::Error::new(ErrorKind::Other, val.to_string())
    }
}

impl From<FromUtf8Error> for FlowkitError {
    fn from(_: FromUtf8Error) -> Self {
        FlowkitError::Convert("Error with utf-8 string convert".to_string())
    }
}

impl From<serde_json::Error> for FlowkitError {
    fn from(error: serde_json::Error) -> Self {
        FlowkitError::Convert(error.to_string())
    }
}

impl From<jsonschema::ValidationError<'_>> for FlowkitError {
    fn from(error: jsonschema::ValidationError<'_>) -> Self {
        FlowkitError::Schema(error.to_string())
    }
}

impl From<reqwest::Error> for FlowkitError {
    fn from(error: reqwest::Error) -> Self {
        FlowkitError::External(error.to_string())
    }
}

impl From<sqlx::Error> for FlowkitError {
    fn from(error: sqlx::Error) -> Self {
        FlowkitError::External(error.to_string())
    }
}
