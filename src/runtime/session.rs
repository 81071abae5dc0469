//! Playground session
//!
//! A [`Session`] owns everything one playground needs: the callback
//! registry, the playground state, the engine and the run coordinator. It is
//! the surface a presentation layer talks to.

use std::sync::Arc;
use tokio::sync::broadcast;

use super::coordinator::{RunCoordinator, RunReport};
use super::engine::{AlcEngine, Engine, EngineHost, EngineStatus};
use super::error::{ExecutionError, ExecutionResult, InitResult, RunError, RunResult};
use super::registry::{CallbackRegistry, ObserverId, PrintObserver};
use super::state::{PlaygroundSnapshot, PlaygroundState, StateEvent};
use super::PlaygroundConfig;
use crate::interpreter::{Node, Token};
use crate::util::render::render_message;

/// One playground session.
pub struct Session<E: Engine = AlcEngine> {
    config: PlaygroundConfig,
    registry: Arc<CallbackRegistry>,
    state: Arc<PlaygroundState>,
    host: Arc<EngineHost<E>>,
    coordinator: RunCoordinator<E>,
    message_log: ObserverId,
}

impl Session<AlcEngine> {
    /// Session backed by the bundled ALC engine.
    pub fn new(config: PlaygroundConfig) -> Self {
        let engine = AlcEngine::new(config.limits());
        Self::with_engine(config, engine)
    }
}

impl Default for Session<AlcEngine> {
    fn default() -> Self {
        Self::new(PlaygroundConfig::default())
    }
}

impl<E: Engine> Session<E> {
    /// Session backed by a custom engine.
    ///
    /// The message-log observer is registered here, so it is first in
    /// dispatch order before any run can start.
    pub fn with_engine(config: PlaygroundConfig, engine: E) -> Self {
        let registry = Arc::new(CallbackRegistry::new());
        let state = Arc::new(PlaygroundState::new(config.event_capacity));
        let host = Arc::new(EngineHost::new(engine));
        let coordinator =
            RunCoordinator::new(host.clone(), registry.clone(), state.clone(), &config);

        let message_log = {
            let state = state.clone();
            registry.register_fn(move |values| {
                state.append_message(render_message(values));
                Ok(())
            })
        };
        tracing::debug!(observer = %message_log, "message log attached");

        Self {
            config,
            registry,
            state,
            host,
            coordinator,
            message_log,
        }
    }

    /// Session configuration.
    pub fn config(&self) -> &PlaygroundConfig {
        &self.config
    }

    /// Bring the engine up.
    ///
    /// Safe to call repeatedly and concurrently; all callers share one
    /// attempt. After a failure, calling again retries. After
    /// [`shutdown`](Self::shutdown) it fails with `InitError::ShutDown`.
    pub async fn initialize(&self) -> InitResult<()> {
        self.host.initialize().await
    }

    /// Handle of the built-in observer feeding the message log.
    pub fn message_log_observer(&self) -> ObserverId {
        self.message_log
    }

    /// The engine behind this session.
    pub fn engine(&self) -> &E {
        self.host.engine()
    }

    /// Engine lifecycle status.
    pub fn status(&self) -> EngineStatus {
        self.host.status()
    }

    /// Execute `source`, appending its prints to the message log.
    pub fn trigger_run(&self, source: &str) -> RunResult<RunReport> {
        self.coordinator.run(source)
    }

    /// Empty the message log.
    pub fn clear_messages(&self) {
        self.state.clear_messages();
    }

    /// Consistent view of tokens, AST, messages and last error.
    pub fn snapshot(&self) -> PlaygroundSnapshot {
        self.state.snapshot()
    }

    /// Subscribe to state change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.state.subscribe()
    }

    /// Lex and parse without running. Leaves the state untouched.
    pub fn inspect(&self, source: &str) -> ExecutionResult<(Vec<Token>, Node)> {
        let status = self.host.status();
        if !status.is_ready() {
            return Err(ExecutionError::Engine(format!(
                "engine is not ready (status: {})",
                status
            )));
        }
        self.host.engine().inspect(source)
    }

    /// Receive raw print events alongside the message log.
    pub fn register_observer(&self, observer: PrintObserver) -> RunResult<ObserverId> {
        let status = self.host.status();
        if !status.is_ready() {
            return Err(RunError::NotReady(status));
        }
        Ok(self.registry.register(observer))
    }

    /// Stop delivering print events to `id`. Unknown ids are a no-op.
    pub fn unregister_observer(&self, id: ObserverId) -> bool {
        if id == self.message_log {
            tracing::debug!(observer = %id, "refusing to detach the message log");
            return false;
        }
        self.registry.unregister(id)
    }

    /// Shared callback registry.
    pub fn registry(&self) -> &Arc<CallbackRegistry> {
        &self.registry
    }

    /// Shared playground state.
    pub fn state(&self) -> &Arc<PlaygroundState> {
        &self.state
    }

    /// Run coordinator.
    pub fn coordinator(&self) -> &RunCoordinator<E> {
        &self.coordinator
    }

    /// Tear the session down: every observer is dropped and the engine moves
    /// to the terminal `ShutDown` status, so later runs, observer
    /// registrations and initialization are refused.
    pub fn shutdown(&self) {
        self.host.shut_down();
        let removed = self.registry.clear();
        tracing::debug!(removed, "session shut down");
    }
}

impl<E: Engine> Drop for Session<E> {
    fn drop(&mut self) {
        self.registry.clear();
    }
}
