//! OSRM HTTP adapter for travel-time blocks.

use serde::Deserialize;

use crate::error::ProviderError;
use crate::traits::{Coordinate, TravelTimeProvider};

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "car".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// `table` service URL; origins come first in the coordinate list.
    pub fn table_url(&self, origins: &[Coordinate], destinations: &[Coordinate]) -> String {
        let coords = origins
            .iter()
            .chain(destinations)
            .map(|(lat, lng)| format!("{:.6},{:.6}", lng, lat))
            .collect::<Vec<_>>()
            .join(";");
        let sources = (0..origins.len())
            .map(|index| index.to_string())
            .collect::<Vec<_>>()
            .join(";");
        let targets = (origins.len()..origins.len() + destinations.len())
            .map(|index| index.to_string())
            .collect::<Vec<_>>()
            .join(";");

        format!(
            "{}/table/v1/{}/{}?annotations=duration&sources={}&destinations={}",
            self.config.base_url, self.config.profile, coords, sources, targets
        )
    }
}

impl TravelTimeProvider for OsrmClient {
    fn durations(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
    ) -> Result<Vec<Vec<i64>>, ProviderError> {
        if origins.is_empty() || destinations.is_empty() {
            return Ok(vec![Vec::new(); origins.len()]);
        }

        let body = self
            .client
            .get(self.table_url(origins, destinations))
            .send()?
            .error_for_status()?
            .json::<OsrmTableResponse>()?;

        minutes_from_table(body)
    }
}

#[derive(Debug, Deserialize)]
pub struct OsrmTableResponse {
    pub code: String,
    pub message: Option<String>,
    pub durations: Option<Vec<Vec<Option<f64>>>>,
}

/// Seconds to whole minutes, truncating.
pub fn minutes_from_table(body: OsrmTableResponse) -> Result<Vec<Vec<i64>>, ProviderError> {
    if body.code != "Ok" {
        return Err(ProviderError::Status(match body.message {
            Some(message) => format!("{}: {}", body.code, message),
            None => body.code,
        }));
    }

    let durations = body
        .durations
        .ok_or_else(|| ProviderError::Malformed("missing durations".to_string()))?;
    durations
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|value| {
                    value
                        .map(|seconds| (seconds / 60.0) as i64)
                        .ok_or_else(|| ProviderError::Malformed("unreachable pair".to_string()))
                })
                .collect()
        })
        .collect()
}
