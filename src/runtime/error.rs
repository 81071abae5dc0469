//! Error types for the playground bridge
//!
//! Each concern gets its own thiserror enum with a `Result` alias beside it.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use super::RunId;
use super::engine::EngineStatus;
use super::registry::ObserverId;
use crate::interpreter::InterpreterError;

/// The engine failed to become ready.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitError {
    /// The engine reported a setup failure.
    #[error("engine setup failed: {0}")]
    Engine(String),

    /// The engine panicked while initializing.
    #[error("engine panicked during initialization: {0}")]
    Panicked(String),

    /// The session owning the engine was shut down.
    #[error("engine was shut down")]
    ShutDown,
}

/// Convenience result alias for initialization
pub type InitResult<T> = std::result::Result<T, InitError>;

/// Why an engine could not execute (or inspect) a piece of source text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    /// Lexing, parsing or evaluation failed inside the interpreter.
    #[error(transparent)]
    Interpreter(#[from] InterpreterError),

    /// The engine panicked mid-run.
    #[error("engine panicked: {0}")]
    Panicked(String),

    /// Any other engine-defined failure.
    #[error("{0}")]
    Engine(String),
}

/// Convenience result alias for engine execution
pub type ExecutionResult<T> = std::result::Result<T, ExecutionError>;

/// A failed run, with the diagnostic shown to the user.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("run {run_id} failed: {error}")]
pub struct ExecutionFailure {
    /// Identifier of the failed run
    pub run_id: RunId,
    /// Underlying cause
    pub error: ExecutionError,
}

impl ExecutionFailure {
    /// Human-readable diagnostic text.
    pub fn diagnostic(&self) -> String {
        self.error.to_string()
    }
}

/// Error returned by a print observer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ObserverError(pub String);

impl ObserverError {
    /// Build an observer error from any displayable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Convenience result alias for print observers
pub type ObserverResult = std::result::Result<(), ObserverError>;

/// One observer failing to handle one print event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("observer {observer} failed: {message}")]
pub struct ObserverFailure {
    /// Observer that failed
    pub observer: ObserverId,
    /// Error or panic message
    pub message: String,
}

/// Outcome of a rejected or failed run request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunError {
    /// The engine is not ready to accept runs.
    #[error("engine is not ready (status: {0})")]
    NotReady(EngineStatus),

    /// Another run is already in flight.
    #[error("a run is already in progress")]
    Busy,

    /// A run was triggered from inside print dispatch of the in-flight run.
    #[error("run triggered from inside print dispatch of run {0}")]
    Reentrant(RunId),

    /// The engine executed the source and failed.
    #[error(transparent)]
    Execution(#[from] ExecutionFailure),
}

/// Convenience result alias for run requests
pub type RunResult<T> = std::result::Result<T, RunError>;

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read or written
    #[error("IO error on {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// Config file is not valid JSON for [`PlaygroundConfig`](super::PlaygroundConfig)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A value is out of range
    #[error("Invalid value for {field}: {detail}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// Why it was rejected
        detail: String,
    },
}

/// Convenience result alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
