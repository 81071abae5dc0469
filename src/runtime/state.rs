//! Playground state: latest run artifacts plus the message log
//!
//! Tokens, AST and result of a run live together in one [`RunArtifacts`]
//! value that is swapped as a whole, so readers can never observe tokens
//! from one run next to the AST of another. Every change is announced on a
//! broadcast channel for presentation layers that want to redraw.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use super::RunId;
use crate::interpreter::{Node, Object, Token};

/// Artifacts published by one successful run.
#[derive(Debug, Clone)]
pub struct RunArtifacts {
    /// Run that produced them
    pub run_id: RunId,
    /// Lexed tokens
    pub tokens: Vec<Token>,
    /// Parsed program root
    pub ast: Node,
    /// Value of the last top-level form
    pub result: Object,
    /// When the run completed
    pub completed_at: DateTime<Utc>,
}

/// One entry of the message log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Rendered text
    pub text: String,
    /// Run that was in flight when the message was appended, if any
    pub run_id: Option<RunId>,
    /// Append time
    pub at: DateTime<Utc>,
}

/// Diagnostic left behind by the most recent failed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Run that failed
    pub run_id: RunId,
    /// Human-readable description
    pub message: String,
    /// Failure time
    pub at: DateTime<Utc>,
}

/// Change notification emitted by [`PlaygroundState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StateEvent {
    /// Tokens, AST and result were replaced by a completed run.
    ArtifactsReplaced {
        /// Run whose artifacts are now current
        run_id: RunId,
    },
    /// A message was appended at `index`.
    MessageAppended {
        /// Position in the log
        index: usize,
    },
    /// The message log was emptied.
    MessagesCleared,
    /// A run failed; see [`PlaygroundSnapshot::last_error`].
    RunFailed {
        /// Run that failed
        run_id: RunId,
    },
}

/// Consistent point-in-time view of the state.
#[derive(Debug, Clone, Default)]
pub struct PlaygroundSnapshot {
    /// Latest artifacts, absent before the first successful run
    pub artifacts: Option<Arc<RunArtifacts>>,
    /// Ordered message log
    pub messages: Vec<Message>,
    /// Latest failure, cleared by the next successful run
    pub last_error: Option<Diagnostic>,
}

impl PlaygroundSnapshot {
    /// Tokens of the latest run (empty before the first run).
    pub fn tokens(&self) -> &[Token] {
        self.artifacts
            .as_ref()
            .map(|artifacts| artifacts.tokens.as_slice())
            .unwrap_or(&[])
    }

    /// AST of the latest run.
    pub fn ast(&self) -> Option<&Node> {
        self.artifacts.as_ref().map(|artifacts| &artifacts.ast)
    }

    /// Result of the latest run.
    pub fn result(&self) -> Option<&Object> {
        self.artifacts.as_ref().map(|artifacts| &artifacts.result)
    }

    /// Run that produced the current artifacts.
    pub fn run_id(&self) -> Option<RunId> {
        self.artifacts.as_ref().map(|artifacts| artifacts.run_id)
    }

    /// Message texts in log order.
    pub fn message_texts(&self) -> Vec<&str> {
        self.messages
            .iter()
            .map(|message| message.text.as_str())
            .collect()
    }
}

#[derive(Default)]
struct Inner {
    artifacts: Option<Arc<RunArtifacts>>,
    messages: Vec<Message>,
    last_error: Option<Diagnostic>,
    current_run: Option<RunId>,
}

/// Session-scoped playground state.
pub struct PlaygroundState {
    inner: RwLock<Inner>,
    events: broadcast::Sender<StateEvent>,
}

impl PlaygroundState {
    /// Create an empty state whose change channel buffers `event_capacity` events.
    pub fn new(event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            inner: RwLock::new(Inner::default()),
            events,
        }
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.events.subscribe()
    }

    fn notify(&self, event: StateEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Read a consistent snapshot.
    pub fn snapshot(&self) -> PlaygroundSnapshot {
        let inner = self.inner.read();
        PlaygroundSnapshot {
            artifacts: inner.artifacts.clone(),
            messages: inner.messages.clone(),
            last_error: inner.last_error.clone(),
        }
    }

    /// Swap tokens, AST and result in one step and clear the last error.
    pub fn replace_artifacts(&self, artifacts: RunArtifacts) {
        let run_id = artifacts.run_id;
        {
            let mut inner = self.inner.write();
            inner.artifacts = Some(Arc::new(artifacts));
            inner.last_error = None;
        }
        self.notify(StateEvent::ArtifactsReplaced { run_id });
    }

    /// Append a message to the log.
    pub fn append_message(&self, text: impl Into<String>) {
        let index = {
            let mut inner = self.inner.write();
            let run_id = inner.current_run;
            inner.messages.push(Message {
                text: text.into(),
                run_id,
                at: Utc::now(),
            });
            inner.messages.len() - 1
        };
        self.notify(StateEvent::MessageAppended { index });
    }

    /// Empty the message log. Tokens and AST are untouched.
    pub fn clear_messages(&self) {
        self.inner.write().messages.clear();
        self.notify(StateEvent::MessagesCleared);
    }

    /// Record a failed run without touching tokens or AST.
    pub fn record_failure(&self, run_id: RunId, message: impl Into<String>) {
        self.inner.write().last_error = Some(Diagnostic {
            run_id,
            message: message.into(),
            at: Utc::now(),
        });
        self.notify(StateEvent::RunFailed { run_id });
    }

    /// Mark which run subsequent messages belong to (`None` when idle).
    pub(crate) fn set_current_run(&self, run_id: Option<RunId>) {
        self.inner.write().current_run = run_id;
    }
}

impl Default for PlaygroundState {
    fn default() -> Self {
        Self::new(super::DEFAULT_EVENT_CAPACITY)
    }
}
