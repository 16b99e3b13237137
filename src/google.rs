//! Distance-matrix HTTP API adapter (pipe-separated origins/destinations
//! plus an API key).

use serde::Deserialize;

use crate::error::ProviderError;
use crate::matrix::DEFAULT_MAX_ELEMENTS;
use crate::traits::{Coordinate, TravelTimeProvider};

#[derive(Debug, Clone)]
pub struct GoogleMatrixConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
    /// Elements accepted per request.
    pub max_elements: usize,
}

impl Default for GoogleMatrixConfig {
    fn default() -> Self {
        Self {
            base_url: "https://maps.googleapis.com/maps/api/distancematrix/json".to_string(),
            api_key: String::new(),
            timeout_secs: 10,
            max_elements: DEFAULT_MAX_ELEMENTS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GoogleMatrixClient {
    config: GoogleMatrixConfig,
    client: reqwest::blocking::Client,
}

impl GoogleMatrixClient {
    pub fn new(config: GoogleMatrixConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn max_elements(&self) -> usize {
        self.config.max_elements
    }
}

fn address_list(locations: &[Coordinate]) -> String {
    locations
        .iter()
        .map(|(lat, lng)| format!("{},{}", lat, lng))
        .collect::<Vec<_>>()
        .join("|")
}

impl TravelTimeProvider for GoogleMatrixClient {
    fn durations(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
    ) -> Result<Vec<Vec<i64>>, ProviderError> {
        if origins.is_empty() || destinations.is_empty() {
            return Ok(vec![Vec::new(); origins.len()]);
        }

        let origins = address_list(origins);
        let destinations = address_list(destinations);
        let body = self
            .client
            .get(&self.config.base_url)
            .query(&[
                ("units", "metric"),
                ("origins", origins.as_str()),
                ("destinations", destinations.as_str()),
                ("key", self.config.api_key.as_str()),
            ])
            .send()?
            .error_for_status()?
            .json::<MatrixResponse>()?;

        build_time_matrix(body)
    }
}

#[derive(Debug, Deserialize)]
pub struct MatrixResponse {
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub rows: Vec<MatrixRow>,
}

#[derive(Debug, Deserialize)]
pub struct MatrixRow {
    pub elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
pub struct MatrixElement {
    pub status: String,
    pub duration: Option<MatrixValue>,
}

#[derive(Debug, Deserialize)]
pub struct MatrixValue {
    pub value: i64,
}

/// Duration seconds to whole minutes, truncating.
pub fn build_time_matrix(body: MatrixResponse) -> Result<Vec<Vec<i64>>, ProviderError> {
    if body.status != "OK" {
        return Err(ProviderError::Status(match body.error_message {
            Some(message) => format!("{}: {}", body.status, message),
            None => body.status,
        }));
    }

    body.rows
        .into_iter()
        .map(|row| {
            row.elements
                .into_iter()
                .map(|element| match (element.status.as_str(), element.duration) {
                    ("OK", Some(duration)) => Ok(duration.value / 60),
                    (status, _) => Err(ProviderError::Status(format!("element {}", status))),
                })
                .collect()
        })
        .collect()
}
