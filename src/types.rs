use serde::{Deserialize, Serialize};

/// User-supplied location query. Immutable once submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationQuery {
    pub city: String,
    pub state: String,
}

impl LocationQuery {
    pub fn new(city: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            state: state.into(),
        }
    }
}

/// Coordinates resolved by the geocoder, consumed by the forecast client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    /// Place name as the geocoding service resolved it.
    pub resolved_name: String,
    /// State/region as the geocoding service resolved it.
    pub resolved_state: String,
    pub country: String,
}

impl Coordinates {
    /// Latitude must lie in [-90, 90] and longitude in [-180, 180].
    pub fn in_bounds(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Coordinates rounded to 4 decimal places, normalizing cache keys
    /// on the remote forecast service.
    pub fn rounded(&self) -> Self {
        Self {
            latitude: round4(self.latitude),
            longitude: round4(self.longitude),
            ..self.clone()
        }
    }
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

/// One day of the forecast. A full forecast is an ordered `Vec<DayRecord>`;
/// chronological order is preserved through every downstream stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRecord {
    /// ISO date (e.g. `"2026-01-17"`).
    pub date: String,
    pub max_temp_f: f64,
    pub min_temp_f: f64,
    pub precipitation_in: f64,
    pub snowfall_in: f64,
    pub max_wind_mph: f64,
}

/// How many days of forecast the run requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForecastType {
    #[default]
    SevenDay,
    SingleDay,
}

impl ForecastType {
    /// Day count sent to the forecast service.
    pub fn days(self) -> u8 {
        match self {
            ForecastType::SevenDay => 7,
            ForecastType::SingleDay => 1,
        }
    }

    /// Parse the session-store value. Unrecognized values fall back to
    /// the seven-day default, matching the source pages.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "1day" | "single" => ForecastType::SingleDay,
            _ => ForecastType::SevenDay,
        }
    }
}

/// Per-day forecast zipped with its slice of the narrative. Created once
/// per successful run; discarded on the next submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayView {
    pub date: String,
    pub max_temp_f: f64,
    pub min_temp_f: f64,
    pub precipitation_in: f64,
    pub snowfall_in: f64,
    pub max_wind_mph: f64,
    pub analysis_text: String,
}

impl DayView {
    /// Merge a forecast day with its narrative section.
    pub fn from_record(record: &DayRecord, analysis_text: String) -> Self {
        Self {
            date: record.date.clone(),
            max_temp_f: record.max_temp_f,
            min_temp_f: record.min_temp_f,
            precipitation_in: record.precipitation_in,
            snowfall_in: record.snowfall_in,
            max_wind_mph: record.max_wind_mph,
            analysis_text,
        }
    }
}
