//! Session-scoped key/value handoff from the form page.
//!
//! The form page writes the API key, location, and forecast type into a
//! browser-session store; the pipeline reads them exactly once at run
//! start and never mutates them. The store is modeled as an injected
//! read-only source so the orchestrator stays decoupled from whatever
//! holds the values.

use std::collections::HashMap;

use crate::error::{PipelineError, Result};
use crate::types::ForecastType;

pub const KEY_API_KEY: &str = "mistralApiKey";
pub const KEY_CITY: &str = "city";
pub const KEY_STATE: &str = "state";
/// Legacy combined "City, State" value written by the first page version.
pub const KEY_LOCATION: &str = "location";
pub const KEY_FORECAST_TYPE: &str = "forecastType";

/// Read-only view of the session store.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// In-memory session store.
///
/// # Example
///
/// ```
/// use snowday_pipeline::session::{MemorySession, SessionStore, KEY_CITY};
///
/// let session = MemorySession::new().with(KEY_CITY, "Duluth");
/// assert_eq!(session.get(KEY_CITY).as_deref(), Some("Duluth"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySession {
    data: HashMap<String, String>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a key/value pair.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

impl SessionStore for MemorySession {
    fn get(&self, key: &str) -> Option<String> {
        self.data.get(key).cloned()
    }
}

/// Validated input for a single pipeline run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub api_key: String,
    pub city: String,
    pub state: String,
    pub forecast_type: ForecastType,
}

impl RunRequest {
    pub fn new(
        api_key: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            city: city.into(),
            state: state.into(),
            forecast_type: ForecastType::default(),
        }
    }

    pub fn with_forecast_type(mut self, forecast_type: ForecastType) -> Self {
        self.forecast_type = forecast_type;
        self
    }

    /// Read the request out of session state. Called once at run start.
    ///
    /// Falls back to splitting the legacy combined `location` value when
    /// `city`/`state` were not written separately.
    pub fn from_session(session: &dyn SessionStore) -> Result<Self> {
        let api_key = require(session.get(KEY_API_KEY), "apiKey")?;

        let (city, state) = match (session.get(KEY_CITY), session.get(KEY_STATE)) {
            (Some(city), Some(state)) => (city, state),
            _ => split_location(session.get(KEY_LOCATION)),
        };

        let forecast_type = session
            .get(KEY_FORECAST_TYPE)
            .map(|v| ForecastType::parse(&v))
            .unwrap_or_default();

        let request = Self {
            api_key,
            city: city.trim().to_string(),
            state: state.trim().to_string(),
            forecast_type,
        };
        request.validate()?;
        Ok(request)
    }

    /// Reject empty or whitespace-only fields before any stage runs.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(PipelineError::Validation { field: "apiKey" });
        }
        if self.city.trim().is_empty() {
            return Err(PipelineError::Validation { field: "city" });
        }
        if self.state.trim().is_empty() {
            return Err(PipelineError::Validation { field: "state" });
        }
        Ok(())
    }
}

fn require(value: Option<String>, field: &'static str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(PipelineError::Validation { field }),
    }
}

fn split_location(location: Option<String>) -> (String, String) {
    let Some(location) = location else {
        return (String::new(), String::new());
    };
    match location.split_once(',') {
        Some((city, state)) => (city.trim().to_string(), state.trim().to_string()),
        None => (location.trim().to_string(), String::new()),
    }
}
