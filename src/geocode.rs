//! Forward geocoding: resolve a US city and state to coordinates.
//! Uses the Open-Meteo geocoding service - free, no API key required.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{PipelineError, Result};
use crate::types::{Coordinates, LocationQuery};

const GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";

/// Abstraction over the geocoding service.
///
/// Object-safe so the orchestrator can hold `Arc<dyn GeocodeProvider>`
/// and tests can substitute a stub.
#[async_trait]
pub trait GeocodeProvider: Send + Sync {
    /// Resolve a (city, state) pair to coordinates.
    ///
    /// No retries are attempted; the caller resubmits on failure.
    async fn resolve(&self, client: &Client, query: &LocationQuery) -> Result<Coordinates>;
}

/// Open-Meteo geocoding client, restricted to US matches.
#[derive(Debug, Clone)]
pub struct OpenMeteoGeocoder {
    base_url: String,
}

impl OpenMeteoGeocoder {
    pub fn new() -> Self {
        Self {
            base_url: GEOCODING_URL.to_string(),
        }
    }

    /// Point the client at a different endpoint (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for OpenMeteoGeocoder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Option<Vec<SearchResult>>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    name: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    admin1: Option<String>,
    #[serde(default)]
    country: Option<String>,
}

#[async_trait]
impl GeocodeProvider for OpenMeteoGeocoder {
    async fn resolve(&self, client: &Client, query: &LocationQuery) -> Result<Coordinates> {
        let res = client
            .get(&self.base_url)
            .query(&[
                ("name", query.city.as_str()),
                ("count", "1"),
                ("language", "en"),
                ("format", "json"),
                ("countryCode", "US"),
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

        let parsed: SearchResponse = res.json().await?;
        let first = parsed
            .results
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| PipelineError::NotFound {
                city: query.city.clone(),
                state: query.state.clone(),
            })?;

        let coords = Coordinates {
            latitude: first.latitude,
            longitude: first.longitude,
            resolved_name: first.name,
            resolved_state: first.admin1.unwrap_or_else(|| query.state.clone()),
            country: first.country.unwrap_or_else(|| "United States".to_string()),
        };
        tracing::debug!(
            "Geocoded {}, {} to ({}, {})",
            query.city,
            query.state,
            coords.latitude,
            coords.longitude
        );
        Ok(coords)
    }
}
