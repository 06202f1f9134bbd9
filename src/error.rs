//! Error types for Flowlet.
//!
//! All errors in Flowlet are represented by the `FlowletError` enum,
//! which provides specific variants for different error categories.

use std::io::ErrorKind;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for all Flowlet operations.
///
/// Each variant represents a specific category of error that can occur
/// during workflow definition, execution, or storage operations.
#[derive(Deserialize, Serialize, Error, Debug, Clone, PartialEq)]
pub enum FlowletError {
    /// Engine-level errors (startup, shutdown, configuration).
    #[error("{0}")]
    Engine(String),

    /// Configuration parsing or validation errors.
    #[error("{0}")]
    Config(String),

    /// Data conversion errors (JSON, enum parsing).
    #[error("{0}")]
    Convert(String),

    /// A run was requested for a workflow that is missing or not active.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// The stored graph configuration could not be parsed or is invalid
    /// (bad JSON, schema violation, duplicate node id, missing trigger).
    #[error("malformed config: {0}")]
    MalformedConfig(String),

    /// A node with an unrecognized type was reached during traversal.
    #[error("unknown node type: {0}")]
    UnknownNodeType(String),

    /// The run deadline elapsed before the traversal finished.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Runtime execution errors.
    #[error("{0}")]
    Runtime(String),

    /// Storage operation errors.
    #[error("{0}")]
    Store(String),

    /// Workflow document errors.
    #[error("{0}")]
    Workflow(String),

    /// Node definition or execution errors.
    #[error("{0}")]
    Node(String),

    /// Edge definition errors.
    #[error("{0}")]
    Edge(String),

    /// Action execution errors.
    #[error("{0}")]
    Action(String),

    /// I/O operation errors.
    #[error("{0}")]
    IoError(String),

    /// Message queue errors.
    #[error("{0}")]
    Queue(String),
}

impl From<FlowletError> for String {
    fn from(val: FlowletError) -> Self {
        val.to_string()
    }
}

impl From<std::io::Error> for FlowletError {
    fn from(error: std::io::Error) -> Self {
        FlowletError::IoError(error.to_string())
    }
}

impl From<FlowletError> for std::io::Error {
    fn from(val: FlowletError) -> Self {
        #[allow(clippy::io_other_error)]
        std::io::Error::new(ErrorKind::Other, val.to_string())
    }
}

impl From<serde_json::Error> for FlowletError {
    fn from(error: serde_json::Error) -> Self {
        FlowletError::Convert(error.to_string())
    }
}

impl From<jsonschema::ValidationError<'_>> for FlowletError {
    fn from(error: jsonschema::ValidationError<'_>) -> Self {
        FlowletError::MalformedConfig(error.to_string())
    }
}
