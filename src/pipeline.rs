//! Pipeline orchestrator for the snow day prediction run.
//!
//! Sequences the three network stages (geocode, forecast, narrative),
//! drives the progress value, enforces the wall-clock deadline, and maps
//! failures to the user-facing error view. Transitions are strictly
//! sequential and one-directional; each run ends in exactly one of
//! `Done`, `Failed`, or `TimedOut`.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::backend::{ChatBackend, MistralBackend};
use crate::diagnostics::{ErrorView, LogEntry};
use crate::error::{PipelineError, Result};
use crate::events::{Event, EventHandler};
use crate::forecast::{ForecastProvider, OpenMeteoForecast};
use crate::geocode::{GeocodeProvider, OpenMeteoGeocoder};
use crate::narrative::NarrativeGenerator;
use crate::run_ctx::RunCtx;
use crate::segmenter;
use crate::session::{RunRequest, SessionStore};
use crate::types::{DayView, LocationQuery};

/// Wall-clock deadline for a run.
pub const DEFAULT_DEADLINE: Duration = Duration::from_millis(45_000);

// Milestone targets per stage.
const PROGRESS_START: u32 = 10;
const PROGRESS_GEOCODED: u32 = 30;
const PROGRESS_FORECAST: u32 = 60;
const PROGRESS_NARRATIVE: u32 = 95;

/// States a run moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Geocoding,
    FetchingForecast,
    GeneratingNarrative,
    Segmenting,
    Done,
    Failed,
    TimedOut,
}

impl RunState {
    pub fn label(self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Geocoding => "geocoding",
            RunState::FetchingForecast => "forecast",
            RunState::GeneratingNarrative => "narrative",
            RunState::Segmenting => "segmenting",
            RunState::Done => "done",
            RunState::Failed => "failed",
            RunState::TimedOut => "timed-out",
        }
    }

    /// Human-readable prefix for the stage's entry in the run log.
    fn failure_prefix(self) -> &'static str {
        match self {
            RunState::Geocoding => "Location lookup failed",
            RunState::FetchingForecast => "Weather fetch failed",
            RunState::GeneratingNarrative => "AI narrative failed",
            _ => "Run failed",
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Terminal outcome of a run. Exactly one per run.
#[derive(Debug)]
pub enum RunOutcome {
    /// The run produced its per-day views.
    Done(Vec<DayView>),
    /// A stage failed; the error carries the failure class.
    Failed(PipelineError),
    /// The deadline elapsed first. The in-flight stage was abandoned and
    /// its eventual result discarded.
    TimedOut,
}

/// Everything the caller needs to render the result of a run.
#[derive(Debug)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Terminal state reached.
    pub state: RunState,
    /// Final progress value.
    pub progress: u32,
    /// Error surface for the `Failed` and `TimedOut` outcomes.
    pub error_view: Option<ErrorView>,
    /// Snapshot of the diagnostic log.
    pub log: Vec<LogEntry>,
}

/// Executor for snow day prediction runs.
///
/// Built once and reused across submissions; each call to
/// [`run`](Pipeline::run) owns a fresh [`RunCtx`], so no state leaks
/// between runs. Only one run may be in flight at a time.
pub struct Pipeline {
    client: Client,
    geocoder: Arc<dyn GeocodeProvider>,
    forecaster: Arc<dyn ForecastProvider>,
    narrator: NarrativeGenerator,
    deadline: Duration,
    event_handler: Option<Arc<dyn EventHandler>>,
    /// Models the disabled submit control while a run is in flight.
    busy: AtomicBool,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("narrator", &self.narrator)
            .field("deadline", &self.deadline)
            .field("busy", &self.busy.load(Ordering::Relaxed))
            .field("has_event_handler", &self.event_handler.is_some())
            .finish()
    }
}

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Read a [`RunRequest`] from session state (once, at run start) and
    /// execute it.
    pub async fn run_from_session(&self, session: &dyn SessionStore) -> Result<RunReport> {
        let request = RunRequest::from_session(session)?;
        self.run(&request).await
    }

    /// Execute one run to its terminal state.
    ///
    /// Returns `Err` only when no run was started: a missing input field
    /// (`Validation`) or another run already in flight (`Busy`). Every
    /// started run yields a [`RunReport`] whose outcome is exactly one
    /// of `Done`, `Failed`, or `TimedOut`.
    pub async fn run(&self, request: &RunRequest) -> Result<RunReport> {
        request.validate()?;
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| PipelineError::Busy)?;
        let _busy = BusyGuard(&self.busy);

        let ctx = RunCtx::new(self.client.clone(), self.event_handler.clone());
        ctx.emit(Event::RunStart {
            city: request.city.clone(),
            state: request.state.clone(),
        });

        // Leaving Idle: arm the deadline and start the progress driver.
        let driver = ctx.progress.spawn_driver(self.event_handler.clone());
        let outcome = tokio::time::timeout(self.deadline, self.execute_stages(&ctx, request)).await;

        let report = match outcome {
            Ok(Ok(views)) => {
                ctx.progress.complete();
                ctx.emit(Event::Progress { percent: 100 });
                ctx.emit(Event::RunEnd { outcome: "done" });
                RunReport {
                    outcome: RunOutcome::Done(views),
                    state: RunState::Done,
                    progress: ctx.progress.value(),
                    error_view: None,
                    log: ctx.log.entries(),
                }
            }
            Ok(Err(error)) => {
                // The bar stays where it was; the error view replaces it.
                ctx.progress.freeze();
                tracing::warn!("Run failed during {}: {}", error_stage(&error), error);
                let error_view = ErrorView::from_error(&error, &ctx.log);
                ctx.emit(Event::RunEnd { outcome: "failed" });
                RunReport {
                    outcome: RunOutcome::Failed(error),
                    state: RunState::Failed,
                    progress: ctx.progress.value(),
                    error_view: Some(error_view),
                    log: ctx.log.entries(),
                }
            }
            Err(_elapsed) => {
                // The in-flight stage was dropped; any late result is
                // discarded. The bar is forced full before the error
                // view replaces it.
                ctx.progress.complete();
                let error = PipelineError::Timeout(self.deadline);
                ctx.log.append("deadline", error.to_string());
                let error_view = ErrorView::from_error(&error, &ctx.log);
                ctx.emit(Event::Progress { percent: 100 });
                ctx.emit(Event::RunEnd { outcome: "timed-out" });
                RunReport {
                    outcome: RunOutcome::TimedOut,
                    state: RunState::TimedOut,
                    progress: ctx.progress.value(),
                    error_view: Some(error_view),
                    log: ctx.log.entries(),
                }
            }
        };

        // The tick task must never outlive the run.
        driver.abort();
        Ok(report)
    }

    async fn execute_stages(&self, ctx: &RunCtx, request: &RunRequest) -> Result<Vec<DayView>> {
        let query = LocationQuery::new(request.city.clone(), request.state.clone());
        ctx.progress.set_target(PROGRESS_START);

        let coords = run_stage(
            ctx,
            RunState::Geocoding,
            self.geocoder.resolve(&ctx.client, &query),
        )
        .await?;
        if !coords.in_bounds() {
            let error = PipelineError::MalformedResponse(format!(
                "coordinates out of range: ({}, {})",
                coords.latitude, coords.longitude
            ));
            ctx.log.append(
                RunState::Geocoding.label(),
                format!("{}: {}", RunState::Geocoding.failure_prefix(), error),
            );
            return Err(error);
        }
        ctx.log.append(
            RunState::Geocoding.label(),
            format!(
                "Resolved {}, {} to ({}, {})",
                query.city, query.state, coords.latitude, coords.longitude
            ),
        );
        ctx.progress.set_target(PROGRESS_GEOCODED);

        let records = run_stage(
            ctx,
            RunState::FetchingForecast,
            self.forecaster
                .daily(&ctx.client, &coords, request.forecast_type.days()),
        )
        .await?;
        ctx.log.append(
            RunState::FetchingForecast.label(),
            format!("Fetched {} forecast day(s)", records.len()),
        );
        ctx.progress.set_target(PROGRESS_FORECAST);

        let narrative = run_stage(
            ctx,
            RunState::GeneratingNarrative,
            self.narrator.generate(
                &ctx.client,
                &request.city,
                &request.state,
                &records,
                &request.api_key,
            ),
        )
        .await?;
        ctx.progress.set_target(PROGRESS_NARRATIVE);

        // Segmenting is local work; it cannot fail, only fall back to
        // the placeholder text per day.
        ctx.emit(Event::StageStart {
            stage: RunState::Segmenting.label(),
        });
        let views = records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                DayView::from_record(
                    record,
                    segmenter::analysis_for_day(&narrative, i + 1, records.len()),
                )
            })
            .collect();
        ctx.emit(Event::StageEnd {
            stage: RunState::Segmenting.label(),
            ok: true,
        });

        Ok(views)
    }
}

/// Run one stage: emit its lifecycle events and, on failure, append the
/// prefixed error to the run log before propagating it.
async fn run_stage<T, F>(ctx: &RunCtx, state: RunState, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    ctx.emit(Event::StageStart {
        stage: state.label(),
    });
    let result = fut.await;
    match &result {
        Ok(_) => ctx.emit(Event::StageEnd {
            stage: state.label(),
            ok: true,
        }),
        Err(error) => {
            ctx.log.append(
                state.label(),
                format!("{}: {}", state.failure_prefix(), error),
            );
            ctx.emit(Event::StageEnd {
                stage: state.label(),
                ok: false,
            });
        }
    }
    result
}

/// Which stage an error most likely came from, for the warning log.
fn error_stage(error: &PipelineError) -> &'static str {
    match error {
        PipelineError::NotFound { .. } => RunState::Geocoding.label(),
        PipelineError::Auth | PipelineError::RateLimit => RunState::GeneratingNarrative.label(),
        _ => "run",
    }
}

/// Resets the in-flight flag when the run ends, panics included.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Builder for [`Pipeline`].
pub struct PipelineBuilder {
    client: Option<Client>,
    geocoder: Option<Arc<dyn GeocodeProvider>>,
    forecaster: Option<Arc<dyn ForecastProvider>>,
    chat_backend: Option<Arc<dyn ChatBackend>>,
    model: Option<String>,
    deadline: Duration,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            client: None,
            geocoder: None,
            forecaster: None,
            chat_backend: None,
            model: None,
            deadline: DEFAULT_DEADLINE,
            event_handler: None,
        }
    }

    /// Set the HTTP client shared by all three services. If not set, a
    /// default client is created; the run deadline, not a per-request
    /// timeout, bounds the run.
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the geocoding provider. Default: [`OpenMeteoGeocoder`].
    pub fn geocoder(mut self, geocoder: Arc<dyn GeocodeProvider>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    /// Set the forecast provider. Default: [`OpenMeteoForecast`].
    pub fn forecaster(mut self, forecaster: Arc<dyn ForecastProvider>) -> Self {
        self.forecaster = Some(forecaster);
        self
    }

    /// Set the chat-completion backend. Default: [`MistralBackend`].
    pub fn chat_backend(mut self, backend: Arc<dyn ChatBackend>) -> Self {
        self.chat_backend = Some(backend);
        self
    }

    /// Set the narrative model identifier.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the run deadline. Default: [`DEFAULT_DEADLINE`].
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Set the event handler observing run lifecycle and progress.
    pub fn event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// Build the pipeline.
    pub fn build(self) -> Pipeline {
        let backend = self
            .chat_backend
            .unwrap_or_else(|| Arc::new(MistralBackend::new()));
        let mut narrator = NarrativeGenerator::new(backend);
        if let Some(model) = self.model {
            narrator = narrator.with_model(model);
        }
        Pipeline {
            client: self.client.unwrap_or_default(),
            geocoder: self
                .geocoder
                .unwrap_or_else(|| Arc::new(OpenMeteoGeocoder::new())),
            forecaster: self
                .forecaster
                .unwrap_or_else(|| Arc::new(OpenMeteoForecast::new())),
            narrator,
            deadline: self.deadline,
            event_handler: self.event_handler,
            busy: AtomicBool::new(false),
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
