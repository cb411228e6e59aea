//! Event system for run lifecycle hooks.
//!
//! Provides an optional, non-intrusive way to observe a run. The
//! orchestrator emits events when a run starts, enters each stage, moves
//! the progress value, and reaches a terminal state. UI layers implement
//! [`EventHandler`] to drive a progress bar or result view.

use std::sync::Arc;

/// Events emitted during a pipeline run.
#[derive(Debug, Clone)]
pub enum Event {
    /// A run has started.
    RunStart {
        city: String,
        state: String,
    },
    /// A stage has started executing.
    StageStart {
        /// Stage label (e.g. `"geocoding"`).
        stage: &'static str,
    },
    /// A stage has finished executing.
    StageEnd {
        stage: &'static str,
        /// Whether the stage succeeded.
        ok: bool,
    },
    /// The progress value changed.
    Progress {
        /// Current value in [0, 100].
        percent: u32,
    },
    /// The run reached a terminal state.
    RunEnd {
        /// Terminal label: `"done"`, `"failed"`, or `"timed-out"`.
        outcome: &'static str,
    },
}

/// Handler for run lifecycle events.
///
/// Entirely optional -- the pipeline works without an event handler.
///
/// # Example
///
/// ```
/// use snowday_pipeline::events::{Event, EventHandler};
///
/// struct PrintHandler;
///
/// impl EventHandler for PrintHandler {
///     fn on_event(&self, event: Event) {
///         match event {
///             Event::Progress { percent } => println!("{}%", percent),
///             Event::StageStart { stage } => println!("[start] {}", stage),
///             _ => {}
///         }
///     }
/// }
/// ```
pub trait EventHandler: Send + Sync {
    /// Called when the run emits an event.
    fn on_event(&self, event: Event);
}

/// Emit an event if a handler is present. No-op otherwise.
pub(crate) fn emit(handler: &Option<Arc<dyn EventHandler>>, event: Event) {
    if let Some(ref h) = handler {
        h.on_event(event);
    }
}

/// An [`EventHandler`] backed by a closure.
///
/// # Example
///
/// ```
/// use snowday_pipeline::events::{Event, FnEventHandler};
/// use std::sync::Arc;
///
/// let handler = Arc::new(FnEventHandler(|event: Event| {
///     if let Event::Progress { percent } = event {
///         println!("{}%", percent);
///     }
/// }));
/// ```
pub struct FnEventHandler<F: Fn(Event) + Send + Sync>(pub F);

impl<F: Fn(Event) + Send + Sync> EventHandler for FnEventHandler<F> {
    fn on_event(&self, event: Event) {
        (self.0)(event);
    }
}
