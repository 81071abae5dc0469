//! ALC Playground – execution bridge between a playground host and an embedded ALC Lisp engine
//!
//! This crate provides:
//! - A session-owned callback registry that fans print events out to host observers
//! - A run coordinator that executes source text and publishes tokens, AST and result atomically
//! - Playground state with an ordered message log and change notifications
//! - An engine readiness state machine with shared, retryable initialization
//! - A bundled reference interpreter for the ALC Lisp dialect

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Reference ALC Lisp interpreter
pub mod interpreter;

/// Bridge runtime: registry, coordinator, state and session
pub mod runtime;

/// Rendering helpers shared by the runtime and hosts
pub mod util;

// Re-export key types for convenience
pub use runtime::{PlaygroundConfig, RunId, Session};

/// Current version of the playground bridge
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
