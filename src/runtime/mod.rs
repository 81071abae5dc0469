//! Playground bridge runtime
//!
//! This module ties the embedded engine to the host: the print observer
//! registry, the engine readiness state machine, the run coordinator, the
//! playground state and the [`Session`](session::Session) that owns them all.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use uuid::Uuid;

// Submodules
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod registry;
pub mod session;
pub mod state;

pub use coordinator::{RunCoordinator, RunReport};
pub use engine::{AlcEngine, Engine, EngineHost, EngineStatus, Execution};
pub use error::{
    ConfigError, ConfigResult, ExecutionError, ExecutionFailure, InitError,
    ObserverError, ObserverResult, RunError, RunResult,
};
pub use registry::{CallbackRegistry, DispatchReport, ObserverId, PrintObserver};
pub use session::Session;
pub use state::{PlaygroundSnapshot, PlaygroundState, StateEvent};

/// Default buffer size of the state change channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Unique identifier of one run request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Generate a fresh run id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Configuration for a playground session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaygroundConfig {
    /// Append the rendered result of each successful run to the message log
    pub echo_result: bool,

    /// Maximum nesting of user-function calls before a run fails
    pub max_call_depth: usize,

    /// Maximum bracket nesting accepted by the parser
    pub max_nesting_depth: usize,

    /// Buffer size of the state change channel
    pub event_capacity: usize,

    /// Enable debug tracing
    pub debug: bool,
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            echo_result: false,
            max_call_depth: crate::interpreter::DEFAULT_MAX_CALL_DEPTH,
            max_nesting_depth: crate::interpreter::DEFAULT_MAX_NESTING_DEPTH,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            debug: false,
        }
    }
}

impl PlaygroundConfig {
    /// Interpreter limits derived from this config.
    pub fn limits(&self) -> crate::interpreter::Limits {
        crate::interpreter::Limits {
            max_call_depth: self.max_call_depth,
            max_nesting_depth: self.max_nesting_depth,
        }
    }

    /// Read a JSON config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reject values the runtime cannot work with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_call_depth == 0 {
            return Err(ConfigError::Invalid {
                field: "max_call_depth",
                detail: "must be at least 1".to_string(),
            });
        }
        if self.max_nesting_depth == 0 {
            return Err(ConfigError::Invalid {
                field: "max_nesting_depth",
                detail: "must be at least 1".to_string(),
            });
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "event_capacity",
                detail: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
