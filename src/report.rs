//! Output document consumed by presentation collaborators.

use serde::{Deserialize, Serialize};

use crate::optimizer::SolverStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanDocument {
    #[serde(rename = "Metadata")]
    pub metadata: Metadata,
    #[serde(rename = "Model")]
    pub model: ModelSummary,
    #[serde(rename = "Routes")]
    pub routes: Vec<Itinerary>,
}

impl PlanDocument {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Request ids of every served stop, in route order.
    pub fn served_request_ids(&self) -> Vec<&str> {
        self.routes
            .iter()
            .flat_map(|route| route.location_sequence.iter())
            .filter_map(|index| self.metadata.locations.get(*index))
            .filter_map(|location| location.request_id.as_deref())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(rename = "Locations")]
    pub locations: Vec<LocationMeta>,
    #[serde(rename = "Agents")]
    pub agents: Vec<AgentMeta>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationMeta {
    pub index: usize,
    pub coordinate: String,
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMeta {
    pub index: usize,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSummary {
    pub objective_value: i64,
    pub status: SolverStatus,
    pub total_revenue_lost: f64,
    pub total_dropped_count: usize,
    pub dropped_location_indices: Vec<usize>,
    pub dropped_revenues: Vec<f64>,
    pub total_travel_time: i64,
    pub total_load: i64,
}

/// One agent's ordered stops with timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    pub agent_index: usize,
    pub total_travel_time: i64,
    pub total_load: i64,
    pub location_sequence: Vec<usize>,
    pub arrival_windows: Vec<(i64, i64)>,
    pub departure_windows: Vec<(i64, i64)>,
    pub slack_windows: Vec<(i64, i64)>,
}
