//! In-memory diagnostic log and the user-facing error view.
//!
//! Every stage failure is appended to the run's [`RunLog`] with its
//! stage label before being surfaced, so nothing is silently swallowed.
//! [`ErrorView`] is the dismissable surface rendered instead of a
//! result: a headline, remediation copy keyed by failure class, and the
//! expandable raw log.

use std::sync::Mutex;

use crate::error::PipelineError;

/// One appended log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Stage label (e.g. `"geocoding"`, `"deadline"`).
    pub stage: &'static str,
    pub message: String,
}

/// Append-only diagnostic log for a single run.
#[derive(Debug, Default)]
pub struct RunLog {
    entries: Mutex<Vec<LogEntry>>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, stage: &'static str, message: impl Into<String>) {
        self.entries.lock().expect("run log poisoned").push(LogEntry {
            stage,
            message: message.into(),
        });
    }

    /// Snapshot of the entries in append order.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().expect("run log poisoned").clone()
    }

    /// The raw log as display text, one line per entry.
    pub fn render(&self) -> String {
        self.entries()
            .iter()
            .map(|e| format!("[{}] {}", e.stage, e.message))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Dismissable error view shown instead of a result view.
#[derive(Debug, Clone)]
pub struct ErrorView {
    /// What went wrong, in one line.
    pub headline: String,
    /// What the user can do about it.
    pub remediation: String,
    /// The raw diagnostic log, for the expandable details section.
    pub log: String,
}

impl ErrorView {
    pub fn from_error(error: &PipelineError, log: &RunLog) -> Self {
        Self {
            headline: error.to_string(),
            remediation: remediation_for(error).to_string(),
            log: log.render(),
        }
    }
}

/// Remediation copy keyed by failure class.
pub fn remediation_for(error: &PipelineError) -> &'static str {
    match error {
        PipelineError::Auth => "Verify that the API key you entered is valid and active.",
        PipelineError::RateLimit => {
            "The narrative service is rate limiting requests. Wait a moment and resubmit."
        }
        PipelineError::NotFound { .. } => {
            "Check the city and state selection; the location could not be resolved."
        }
        PipelineError::Timeout(_) => {
            "The run did not finish in time. Check your connection and resubmit."
        }
        PipelineError::Transport { .. } | PipelineError::Request(_) => {
            "Check your network connectivity and resubmit."
        }
        PipelineError::Validation { .. } => "Fill in the missing field and submit again.",
        _ => "Resubmit the form to try again.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_log_preserves_append_order() {
        let log = RunLog::new();
        log.append("geocoding", "resolved Duluth");
        log.append("narrative", "HTTP 500");
        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].stage, "geocoding");
        assert_eq!(entries[1].stage, "narrative");
    }

    #[test]
    fn test_render_one_line_per_entry() {
        let log = RunLog::new();
        log.append("forecast", "daily data missing");
        assert_eq!(log.render(), "[forecast] daily data missing");
    }

    #[test]
    fn test_auth_remediation_mentions_the_key() {
        assert!(remediation_for(&PipelineError::Auth).contains("API key"));
    }

    #[test]
    fn test_rate_limit_remediation_is_distinct() {
        let copy = remediation_for(&PipelineError::RateLimit);
        assert!(copy.contains("rate limiting"));
    }

    #[test]
    fn test_timeout_remediation_is_distinct_from_failure() {
        let timeout = remediation_for(&PipelineError::Timeout(Duration::from_secs(45)));
        let transport = remediation_for(&PipelineError::Transport {
            status: 500,
            body: String::new(),
        });
        assert_ne!(timeout, transport);
    }

    #[test]
    fn test_error_view_carries_the_log() {
        let log = RunLog::new();
        log.append("narrative", "HTTP 401");
        let view = ErrorView::from_error(&PipelineError::Auth, &log);
        assert!(view.headline.contains("API key"));
        assert!(view.log.contains("HTTP 401"));
    }
}
