//! Print observer registry
//!
//! Holds the host-supplied observers that receive print events raised by the
//! engine. The registry is owned by a session and injected where it is
//! needed; there is no process-global instance. Observers are addressed by
//! the [`ObserverId`] handed out at registration.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::error::{ObserverFailure, ObserverResult};
use crate::interpreter::{Object, PrintSink};
use crate::util::panic_message;

/// Host callback invoked once per print event with that event's values.
pub type PrintObserver = Arc<dyn Fn(&[Object]) -> ObserverResult + Send + Sync>;

/// Opaque handle identifying a registered observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObserverId(u64);

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "observer#{}", self.0)
    }
}

#[derive(Clone)]
struct Entry {
    id: ObserverId,
    observer: PrintObserver,
}

/// Result of dispatching one print event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Observers that handled the event, in dispatch order.
    pub delivered: Vec<ObserverId>,
    /// Observers that returned an error or panicked.
    pub failures: Vec<ObserverFailure>,
}

impl DispatchReport {
    /// Whether every invoked observer succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Registry of print observers, dispatched in registration order.
pub struct CallbackRegistry {
    observers: RwLock<Vec<Entry>>,
    next_id: AtomicU64,
    events: AtomicU64,
    failures: AtomicU64,
}

impl CallbackRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            observers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            events: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// Wrap a closure as a [`PrintObserver`].
    pub fn observer<F>(callback: F) -> PrintObserver
    where
        F: Fn(&[Object]) -> ObserverResult + Send + Sync + 'static,
    {
        Arc::new(callback)
    }

    /// Register an observer.
    ///
    /// Identity is the observer's allocation: registering a clone of an
    /// already registered handle returns the existing id and does not add a
    /// second dispatch.
    pub fn register(&self, observer: PrintObserver) -> ObserverId {
        let mut observers = self.observers.write();
        if let Some(existing) = observers
            .iter()
            .find(|entry| same_observer(&entry.observer, &observer))
        {
            tracing::debug!(observer = %existing.id, "observer already registered");
            return existing.id;
        }

        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        observers.push(Entry { id, observer });
        tracing::debug!(observer = %id, total = observers.len(), "registered print observer");
        id
    }

    /// Register a closure, returning its handle.
    pub fn register_fn<F>(&self, callback: F) -> ObserverId
    where
        F: Fn(&[Object]) -> ObserverResult + Send + Sync + 'static,
    {
        self.register(Self::observer(callback))
    }

    /// Remove an observer by handle. Unknown handles are a no-op.
    pub fn unregister(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|entry| entry.id != id);
        let removed = observers.len() != before;
        if removed {
            tracing::debug!(observer = %id, "unregistered print observer");
        }
        removed
    }

    /// Remove an observer by allocation identity. Unknown observers are a no-op.
    pub fn unregister_observer(&self, observer: &PrintObserver) -> bool {
        let id = self
            .observers
            .read()
            .iter()
            .find(|entry| same_observer(&entry.observer, observer))
            .map(|entry| entry.id);
        id.is_some_and(|id| self.unregister(id))
    }

    /// Whether the handle is currently registered.
    pub fn contains(&self, id: ObserverId) -> bool {
        self.observers.read().iter().any(|entry| entry.id == id)
    }

    /// Handles of all registered observers, in dispatch order.
    pub fn ids(&self) -> Vec<ObserverId> {
        self.observers.read().iter().map(|entry| entry.id).collect()
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.observers.read().len()
    }

    /// Whether no observer is registered.
    pub fn is_empty(&self) -> bool {
        self.observers.read().is_empty()
    }

    /// Drop every observer (session teardown). Returns how many were removed.
    pub fn clear(&self) -> usize {
        let mut observers = self.observers.write();
        let count = observers.len();
        observers.clear();
        count
    }

    /// Total number of print events dispatched so far.
    pub fn dispatched_events(&self) -> u64 {
        self.events.load(Ordering::Acquire)
    }

    /// Total number of observer failures (errors and panics) so far.
    pub fn observer_failures(&self) -> u64 {
        self.failures.load(Ordering::Acquire)
    }

    /// Deliver one print event to every registered observer.
    ///
    /// The observer set is read when the event starts; an observer removed
    /// by an earlier observer of the same event is skipped. Observer errors
    /// and panics are caught, logged and reported; they never stop delivery
    /// to the remaining observers.
    pub fn dispatch(&self, values: &[Object]) -> DispatchReport {
        self.events.fetch_add(1, Ordering::AcqRel);
        let targets: Vec<Entry> = self.observers.read().clone();
        let mut report = DispatchReport::default();

        for entry in targets {
            if !self.contains(entry.id) {
                continue;
            }

            let outcome = catch_unwind(AssertUnwindSafe(|| (entry.observer)(values)));
            let message = match outcome {
                Ok(Ok(())) => {
                    report.delivered.push(entry.id);
                    continue;
                }
                Ok(Err(err)) => err.to_string(),
                Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
            };

            self.failures.fetch_add(1, Ordering::AcqRel);
            tracing::warn!(observer = %entry.id, error = %message, "print observer failed");
            report.failures.push(ObserverFailure {
                observer: entry.id,
                message,
            });
        }

        report
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("observers", &self.ids())
            .field("events", &self.dispatched_events())
            .field("failures", &self.observer_failures())
            .finish()
    }
}

impl PrintSink for CallbackRegistry {
    fn print(&self, values: &[Object]) {
        self.dispatch(values);
    }
}

fn same_observer(a: &PrintObserver, b: &PrintObserver) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
