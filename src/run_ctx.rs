//! Per-run context owned by one active pipeline run.
//!
//! [`RunCtx`] bundles the state a run mutates — the progress value and
//! the diagnostic log — with the shared HTTP client and the optional
//! event handler. It is created fresh for every submission and passed
//! explicitly into stage execution, so nothing leaks between runs and no
//! module-level singletons are needed.

use std::sync::Arc;

use reqwest::Client;

use crate::diagnostics::RunLog;
use crate::events::{emit, Event, EventHandler};
use crate::progress::Progress;

pub struct RunCtx {
    /// HTTP client shared by all three service calls (cheap to clone --
    /// uses `Arc` internally).
    pub client: Client,
    /// Progress value for this run.
    pub progress: Progress,
    /// Diagnostic log for this run.
    pub log: Arc<RunLog>,
    /// Optional observer for lifecycle and progress events.
    pub event_handler: Option<Arc<dyn EventHandler>>,
}

impl RunCtx {
    pub fn new(client: Client, event_handler: Option<Arc<dyn EventHandler>>) -> Self {
        Self {
            client,
            progress: Progress::new(),
            log: Arc::new(RunLog::new()),
            event_handler,
        }
    }

    pub(crate) fn emit(&self, event: Event) {
        emit(&self.event_handler, event);
    }
}

impl std::fmt::Debug for RunCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunCtx")
            .field("progress", &self.progress.value())
            .field("log_entries", &self.log.entries().len())
            .field("has_event_handler", &self.event_handler.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_context_starts_clean() {
        let ctx = RunCtx::new(Client::new(), None);
        assert_eq!(ctx.progress.value(), 0);
        assert!(ctx.log.entries().is_empty());
        assert!(!ctx.progress.is_terminal());
    }

    #[test]
    fn test_debug_does_not_require_handler() {
        let ctx = RunCtx::new(Client::new(), None);
        let rendered = format!("{:?}", ctx);
        assert!(rendered.contains("has_event_handler: false"));
    }
}
