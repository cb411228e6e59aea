//! Daily forecast retrieval from the Open-Meteo forecast API.
//!
//! Coordinates are rounded to 4 decimal places before the request so
//! repeated lookups for the same place hit the same cache key on the
//! remote service. The response carries the daily variables as parallel
//! arrays indexed by day; they are zipped positionally into
//! [`DayRecord`]s with chronological order preserved.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{PipelineError, Result};
use crate::types::{Coordinates, DayRecord};

const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
const DAILY_VARS: &str =
    "temperature_2m_max,temperature_2m_min,precipitation_sum,snowfall_sum,wind_speed_10m_max";

/// Abstraction over the forecast service.
#[async_trait]
pub trait ForecastProvider: Send + Sync {
    /// Fetch a `days`-day daily forecast for the given coordinates.
    async fn daily(&self, client: &Client, coords: &Coordinates, days: u8)
        -> Result<Vec<DayRecord>>;
}

/// Open-Meteo daily forecast client. Imperial units throughout.
#[derive(Debug, Clone)]
pub struct OpenMeteoForecast {
    base_url: String,
}

impl OpenMeteoForecast {
    pub fn new() -> Self {
        Self {
            base_url: FORECAST_URL.to_string(),
        }
    }

    /// Point the client at a different endpoint (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for OpenMeteoForecast {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    daily: Option<DailyBlock>,
}

/// Parallel arrays, one entry per day.
#[derive(Debug, Deserialize, Default)]
struct DailyBlock {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    temperature_2m_max: Vec<f64>,
    #[serde(default)]
    temperature_2m_min: Vec<f64>,
    #[serde(default)]
    precipitation_sum: Vec<f64>,
    #[serde(default)]
    snowfall_sum: Vec<f64>,
    #[serde(default)]
    wind_speed_10m_max: Vec<f64>,
}

fn value_at(values: &[f64], index: usize) -> f64 {
    values.get(index).copied().unwrap_or(0.0)
}

#[async_trait]
impl ForecastProvider for OpenMeteoForecast {
    async fn daily(
        &self,
        client: &Client,
        coords: &Coordinates,
        days: u8,
    ) -> Result<Vec<DayRecord>> {
        let coords = coords.rounded();
        let res = client
            .get(&self.base_url)
            .query(&[
                ("latitude", format!("{:.4}", coords.latitude)),
                ("longitude", format!("{:.4}", coords.longitude)),
                ("daily", DAILY_VARS.to_string()),
                ("temperature_unit", "fahrenheit".to_string()),
                ("precipitation_unit", "inch".to_string()),
                ("wind_speed_unit", "mph".to_string()),
                ("timezone", "auto".to_string()),
                ("forecast_days", days.to_string()),
            ])
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(PipelineError::Transport {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ForecastResponse = res.json().await?;
        let daily = parsed.daily.ok_or_else(|| {
            PipelineError::MalformedResponse("daily data missing from forecast response".into())
        })?;

        let records: Vec<DayRecord> = daily
            .time
            .iter()
            .enumerate()
            .map(|(i, date)| DayRecord {
                date: date.clone(),
                max_temp_f: value_at(&daily.temperature_2m_max, i),
                min_temp_f: value_at(&daily.temperature_2m_min, i),
                precipitation_in: value_at(&daily.precipitation_sum, i),
                snowfall_in: value_at(&daily.snowfall_sum, i),
                max_wind_mph: value_at(&daily.wind_speed_10m_max, i),
            })
            .collect();

        tracing::debug!(
            "Fetched {} forecast day(s) for ({}, {})",
            records.len(),
            coords.latitude,
            coords.longitude
        );
        Ok(records)
    }
}
