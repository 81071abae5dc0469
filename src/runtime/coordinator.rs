//! Run coordinator
//!
//! Turns a run request into an engine execution with print events flowing
//! through the callback registry, then publishes the outcome to the
//! playground state. One run at a time: a second request while a run is in
//! flight is rejected, and a request issued from inside that run's print
//! dispatch is rejected as reentrant.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use super::engine::{AlcEngine, Engine, EngineHost, Execution};
use super::error::{ExecutionError, ExecutionFailure, RunError, RunResult};
use super::registry::CallbackRegistry;
use super::state::{PlaygroundState, RunArtifacts};
use super::{PlaygroundConfig, RunId};
use crate::interpreter::Object;
use crate::util::panic_message;
use crate::util::render::render_message;

/// Summary of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Identifier of the run
    pub run_id: RunId,
    /// Value of the last top-level form
    #[serde(skip)]
    pub result: Object,
    /// Number of lexed tokens
    pub token_count: usize,
    /// Number of AST nodes
    pub node_count: usize,
    /// Print events dispatched during the run
    pub print_events: u64,
    /// Observer errors and panics caught while dispatching those events
    pub observer_failures: u64,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    run_id: RunId,
    thread: ThreadId,
}

/// Serializes runs against one engine, registry and state.
pub struct RunCoordinator<E: Engine = AlcEngine> {
    host: Arc<EngineHost<E>>,
    registry: Arc<CallbackRegistry>,
    state: Arc<PlaygroundState>,
    echo_result: bool,
    in_flight: Mutex<Option<InFlight>>,
}

impl<E: Engine> RunCoordinator<E> {
    /// Create a coordinator over shared session components.
    pub fn new(
        host: Arc<EngineHost<E>>,
        registry: Arc<CallbackRegistry>,
        state: Arc<PlaygroundState>,
        config: &PlaygroundConfig,
    ) -> Self {
        Self {
            host,
            registry,
            state,
            echo_result: config.echo_result,
            in_flight: Mutex::new(None),
        }
    }

    /// Run currently executing, if any.
    pub fn current_run(&self) -> Option<RunId> {
        self.in_flight.lock().as_ref().map(|run| run.run_id)
    }

    /// Whether a run is executing.
    pub fn is_running(&self) -> bool {
        self.in_flight.lock().is_some()
    }

    /// Execute `source` and publish its outcome.
    ///
    /// On success the run's tokens, AST and result replace the previous ones
    /// in a single step, after all of the run's print events were dispatched.
    /// On failure the diagnostic goes to the state's error channel and the
    /// previous tokens and AST stay in place.
    pub fn run(&self, source: &str) -> RunResult<RunReport> {
        let status = self.host.status();
        if !status.is_ready() {
            return Err(RunError::NotReady(status));
        }

        let run_id = RunId::new();
        let _guard = self.claim(run_id)?;
        self.state.set_current_run(Some(run_id));

        let started_at = Utc::now();
        let timer = Instant::now();
        let events_before = self.registry.dispatched_events();
        let failures_before = self.registry.observer_failures();
        tracing::info!(run = %run_id, bytes = source.len(), "run started");

        let registry = self.registry.as_ref();
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            self.host.engine().execute(source, registry)
        }))
        .unwrap_or_else(|payload| Err(ExecutionError::Panicked(panic_message(payload.as_ref()))));

        let print_events = self.registry.dispatched_events() - events_before;
        let observer_failures = self.registry.observer_failures() - failures_before;
        let elapsed = timer.elapsed();
        if observer_failures > 0 {
            tracing::warn!(run = %run_id, observer_failures, "print observers failed during run");
        }

        match outcome {
            Ok(execution) => {
                let report = self.publish(
                    run_id,
                    execution,
                    started_at,
                    elapsed,
                    print_events,
                    observer_failures,
                );
                tracing::info!(run = %run_id, elapsed_ms = elapsed.as_millis() as u64, "run finished");
                Ok(report)
            }
            Err(error) => {
                let failure = ExecutionFailure { run_id, error };
                self.state.record_failure(run_id, failure.diagnostic());
                tracing::info!(
                    run = %run_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %failure.error,
                    "run failed"
                );
                Err(failure.into())
            }
        }
    }

    fn claim(&self, run_id: RunId) -> RunResult<RunGuard<'_>> {
        let mut in_flight = self.in_flight.lock();
        if let Some(current) = *in_flight {
            if current.thread == thread::current().id() {
                tracing::warn!(run = %current.run_id, "run requested from inside print dispatch");
                return Err(RunError::Reentrant(current.run_id));
            }
            tracing::warn!(run = %current.run_id, "run rejected: another run is in progress");
            return Err(RunError::Busy);
        }

        *in_flight = Some(InFlight {
            run_id,
            thread: thread::current().id(),
        });
        Ok(RunGuard {
            in_flight: &self.in_flight,
            state: self.state.as_ref(),
        })
    }

    fn publish(
        &self,
        run_id: RunId,
        execution: Execution,
        started_at: DateTime<Utc>,
        elapsed: Duration,
        print_events: u64,
        observer_failures: u64,
    ) -> RunReport {
        let Execution {
            result,
            tokens,
            ast,
        } = execution;
        let token_count = tokens.len();
        let node_count = ast.node_count();
        tracing::debug!(run = %run_id, tokens = token_count, nodes = node_count, print_events, "publishing run artifacts");

        self.state.replace_artifacts(RunArtifacts {
            run_id,
            tokens,
            ast,
            result: result.clone(),
            completed_at: Utc::now(),
        });
        if self.echo_result {
            self.state.append_message(render_message(std::slice::from_ref(&result)));
        }

        RunReport {
            run_id,
            result,
            token_count,
            node_count,
            print_events,
            observer_failures,
            started_at,
            elapsed,
        }
    }
}

/// Releases the in-flight slot when a run ends, including by panic.
struct RunGuard<'a> {
    in_flight: &'a Mutex<Option<InFlight>>,
    state: &'a PlaygroundState,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.state.set_current_run(None);
        *self.in_flight.lock() = None;
    }
}
