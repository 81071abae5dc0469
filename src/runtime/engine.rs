//! Engine abstraction and readiness state machine
//!
//! An [`Engine`] lexes, parses and evaluates source text, forwarding print
//! events to the sink it is handed. [`EngineHost`] wraps an engine with the
//! Uninitialized → Initializing → Ready/Failed lifecycle: initialization runs
//! at most once at a time, concurrent callers wait on the same attempt, and
//! a failed attempt can be retried. Shutting the host down is final.

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio::sync::watch;

use super::error::{ExecutionResult, InitError, InitResult};
use crate::interpreter::{self, Limits, Node, Object, PrintSink, Token};
use crate::util::panic_message;

/// Everything a successful execution produces.
#[derive(Debug, Clone)]
pub struct Execution {
    /// Value of the last top-level form
    pub result: Object,
    /// Lexed tokens
    pub tokens: Vec<Token>,
    /// Parsed program root
    pub ast: Node,
}

impl From<interpreter::Output> for Execution {
    fn from(output: interpreter::Output) -> Self {
        Self {
            result: output.result,
            tokens: output.tokens,
            ast: output.ast,
        }
    }
}

/// Interpreter consumed by the bridge.
pub trait Engine: Send + Sync + 'static {
    /// Short name used in logs.
    fn name(&self) -> &str {
        "engine"
    }

    /// One-time asynchronous setup.
    fn initialize(&self) -> impl Future<Output = InitResult<()>> + Send;

    /// Run `source`, delivering every print event to `sink` as it happens.
    fn execute(&self, source: &str, sink: &dyn PrintSink) -> ExecutionResult<Execution>;

    /// Lex and parse `source` without evaluating it.
    fn inspect(&self, source: &str) -> ExecutionResult<(Vec<Token>, Node)>;
}

/// Lifecycle of an engine.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum EngineStatus {
    /// `initialize` has not been called yet.
    #[default]
    Uninitialized,
    /// An initialization attempt is in progress.
    Initializing,
    /// Runs are accepted.
    Ready,
    /// The last attempt failed; `initialize` may be retried.
    Failed(String),
    /// The owning session was shut down. Terminal.
    ShutDown,
}

impl EngineStatus {
    /// Whether runs are accepted.
    pub fn is_ready(&self) -> bool {
        matches!(self, EngineStatus::Ready)
    }
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineStatus::Uninitialized => write!(f, "uninitialized"),
            EngineStatus::Initializing => write!(f, "initializing"),
            EngineStatus::Ready => write!(f, "ready"),
            EngineStatus::Failed(reason) => write!(f, "failed: {}", reason),
            EngineStatus::ShutDown => write!(f, "shut down"),
        }
    }
}

/// Engine plus its readiness state.
pub struct EngineHost<E> {
    engine: E,
    status: watch::Sender<EngineStatus>,
}

impl<E: Engine> EngineHost<E> {
    /// Wrap an uninitialized engine.
    pub fn new(engine: E) -> Self {
        let (status, _) = watch::channel(EngineStatus::Uninitialized);
        Self { engine, status }
    }

    /// The wrapped engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Current status.
    pub fn status(&self) -> EngineStatus {
        self.status.borrow().clone()
    }

    /// Bring the engine to `Ready`.
    ///
    /// Returns immediately when already ready. When another caller is
    /// initializing, waits for that attempt and shares its outcome.
    /// Otherwise (never initialized, or the last attempt failed) starts a
    /// new attempt. Engine panics are reported as [`InitError::Panicked`].
    pub async fn initialize(&self) -> InitResult<()> {
        let claimed = self.status.send_if_modified(|status| match status {
            EngineStatus::Uninitialized | EngineStatus::Failed(_) => {
                *status = EngineStatus::Initializing;
                true
            }
            EngineStatus::Initializing | EngineStatus::Ready | EngineStatus::ShutDown => false,
        });

        if !claimed {
            return self.wait_for_attempt().await;
        }

        tracing::info!(engine = self.engine.name(), "initializing engine");
        let mut attempt = Attempt {
            status: &self.status,
            settled: false,
        };

        let outcome = AssertUnwindSafe(async { self.engine.initialize().await })
            .catch_unwind()
            .await;
        let result = match outcome {
            Ok(result) => result,
            Err(payload) => Err(InitError::Panicked(panic_message(payload.as_ref()))),
        };

        match &result {
            Ok(()) => {
                attempt.settle(EngineStatus::Ready);
                tracing::info!(engine = self.engine.name(), "engine ready");
            }
            Err(err) => {
                attempt.settle(EngineStatus::Failed(err.to_string()));
                tracing::error!(engine = self.engine.name(), error = %err, "engine initialization failed");
            }
        }
        if self.status() == EngineStatus::ShutDown {
            return Err(InitError::ShutDown);
        }
        result
    }

    async fn wait_for_attempt(&self) -> InitResult<()> {
        let mut receiver = self.status.subscribe();
        let settled = receiver
            .wait_for(|status| !matches!(status, EngineStatus::Initializing))
            .await
            .map(|status| (*status).clone())
            .map_err(|_| InitError::Engine("engine host dropped".to_string()))?;

        match settled {
            EngineStatus::Ready => Ok(()),
            EngineStatus::Failed(reason) => Err(InitError::Engine(reason)),
            EngineStatus::ShutDown => Err(InitError::ShutDown),
            other => Err(InitError::Engine(format!("unexpected status: {}", other))),
        }
    }

    /// Move to the terminal `ShutDown` status. Runs and initialization are
    /// refused from then on; an attempt still in progress settles into
    /// `ShutDown` as well.
    pub fn shut_down(&self) {
        let previous = self.status.send_replace(EngineStatus::ShutDown);
        if previous != EngineStatus::ShutDown {
            tracing::info!(engine = self.engine.name(), %previous, "engine shut down");
        }
    }
}

impl<E> fmt::Debug for EngineHost<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineHost")
            .field("status", &*self.status.borrow())
            .finish_non_exhaustive()
    }
}

/// In-progress initialization. Dropping it unsettled (the initializing
/// future was cancelled) leaves the host in `Failed` so it can be retried.
struct Attempt<'a> {
    status: &'a watch::Sender<EngineStatus>,
    settled: bool,
}

impl Attempt<'_> {
    fn settle(&mut self, status: EngineStatus) {
        self.settled = true;
        settle(self.status, status);
    }
}

impl Drop for Attempt<'_> {
    fn drop(&mut self) {
        if !self.settled {
            settle(
                self.status,
                EngineStatus::Failed("initialization cancelled".to_string()),
            );
        }
    }
}

/// Publish the outcome of an attempt unless the host was shut down meanwhile.
fn settle(sender: &watch::Sender<EngineStatus>, outcome: EngineStatus) {
    sender.send_if_modified(|status| {
        if *status == EngineStatus::ShutDown {
            return false;
        }
        *status = outcome;
        true
    });
}

/// Reference engine running the bundled ALC Lisp interpreter.
#[derive(Debug, Clone, Default)]
pub struct AlcEngine {
    limits: Limits,
}

impl AlcEngine {
    /// Engine with the given recursion and nesting limits.
    pub fn new(limits: Limits) -> Self {
        Self { limits }
    }

    /// Limits applied to every run.
    pub fn limits(&self) -> Limits {
        self.limits
    }
}

impl Engine for AlcEngine {
    fn name(&self) -> &str {
        "alc"
    }

    async fn initialize(&self) -> InitResult<()> {
        if self.limits.max_call_depth == 0 || self.limits.max_nesting_depth == 0 {
            return Err(InitError::Engine("engine limits must be at least 1".to_string()));
        }
        let builtins = interpreter::builtins::builtin_names().count();
        tracing::debug!(
            builtins,
            max_call_depth = self.limits.max_call_depth,
            max_nesting_depth = self.limits.max_nesting_depth,
            "ALC engine loaded"
        );
        Ok(())
    }

    fn execute(&self, source: &str, sink: &dyn PrintSink) -> ExecutionResult<Execution> {
        let output = interpreter::parse_and_run(source, sink, self.limits)?;
        Ok(output.into())
    }

    fn inspect(&self, source: &str) -> ExecutionResult<(Vec<Token>, Node)> {
        Ok(interpreter::parse_source_with(source, self.limits)?)
    }
}
