//! # Snowday Pipeline
//!
//! Client-side snow day prediction pipeline: geocode a US city, fetch a
//! multi-day forecast, and ask a hosted chat-completion service for a
//! day-by-day "snow day" likelihood narrative.
//!
//! The pipeline is three strictly sequential network stages followed by
//! local post-processing:
//!
//! ```text
//! RunRequest ──► geocode ──► forecast ──► narrative ──► segment ──► Vec<DayView>
//!                   │            │            │
//!             OpenMeteoGeocoder  │       MistralBackend
//!                        OpenMeteoForecast
//! ```
//!
//! ## Core Concepts
//!
//! - **[`Pipeline`]** — the orchestrator: sequences the stages, drives
//!   the progress value, enforces the 45 s run deadline, and maps
//!   failures to a user-facing [`ErrorView`](diagnostics::ErrorView).
//! - **[`RunRequest`]** — validated input for one run, readable from a
//!   [`SessionStore`](session::SessionStore) the form page wrote.
//! - **Provider traits** — [`GeocodeProvider`](geocode::GeocodeProvider),
//!   [`ForecastProvider`](forecast::ForecastProvider), and
//!   [`ChatBackend`](backend::ChatBackend) are the seams to the three
//!   remote services; tests substitute stubs or [`MockBackend`].
//! - **[`RunReport`]** — the terminal result: exactly one of `Done`
//!   (per-day views), `Failed` (taxonomy error + error view), or
//!   `TimedOut`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use snowday_pipeline::{Pipeline, RunOutcome, RunRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = Pipeline::builder().build();
//!     let request = RunRequest::new("your-mistral-key", "Duluth", "Minnesota");
//!
//!     let report = pipeline.run(&request).await?;
//!     match report.outcome {
//!         RunOutcome::Done(views) => {
//!             for view in views {
//!                 println!("{}: {}", view.date, view.analysis_text);
//!             }
//!         }
//!         RunOutcome::Failed(_) | RunOutcome::TimedOut => {
//!             let view = report.error_view.expect("terminal error view");
//!             eprintln!("{}\n{}", view.headline, view.remediation);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod diagnostics;
pub mod error;
pub mod events;
pub mod forecast;
pub mod geocode;
pub mod narrative;
pub mod pipeline;
pub mod progress;
pub mod prompt;
pub mod run_ctx;
pub mod segmenter;
pub mod session;
pub mod types;

pub use backend::{ChatBackend, ChatRequest, ChatResponse, MistralBackend, MockBackend};
pub use diagnostics::{ErrorView, LogEntry, RunLog};
pub use error::{PipelineError, Result};
pub use events::{Event, EventHandler, FnEventHandler};
pub use forecast::{ForecastProvider, OpenMeteoForecast};
pub use geocode::{GeocodeProvider, OpenMeteoGeocoder};
pub use narrative::NarrativeGenerator;
pub use pipeline::{Pipeline, PipelineBuilder, RunOutcome, RunReport, RunState, DEFAULT_DEADLINE};
pub use progress::Progress;
pub use run_ctx::RunCtx;
pub use session::{MemorySession, RunRequest, SessionStore};
pub use types::{Coordinates, DayRecord, DayView, ForecastType, LocationQuery};
