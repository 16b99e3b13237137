//! Core domain traits for the dispatch planner.
//!
//! These are intentionally minimal and domain-agnostic. Concrete apps should
//! implement them for their own data models.

use std::fmt::Display;
use std::hash::Hash;

use crate::error::ProviderError;

/// Unique identifier for planner entities.
///
/// Ids are rendered into the output metadata, hence `Display`.
pub trait Id: Clone + Eq + Hash + Display {}

impl<T> Id for T where T: Clone + Eq + Hash + Display {}

/// A (lat, lng) pair.
pub type Coordinate = (f64, f64);

/// A service request to be routed to a field agent.
pub trait Request {
    type Id: Id;

    fn id(&self) -> &Self::Id;

    /// Location coordinates (lat, lng).
    fn location(&self) -> Coordinate;

    /// Requested slot (minutes from midnight). Service must start inside it.
    fn time_window(&self) -> (i64, i64);

    /// Estimated service duration in minutes.
    fn duration_minutes(&self) -> i64;

    /// Extra time reserved after the service, in minutes.
    fn buffer_minutes(&self) -> i64;

    /// Economic value captured when the request is served.
    fn price(&self) -> f64;

    /// Skills an agent must hold, all of them, to serve this request.
    fn required_skills(&self) -> &[String];
}

/// The mobile agent that serves requests.
pub trait Agent {
    type Id: Id;

    fn id(&self) -> &Self::Id;

    /// Start location (lat, lng).
    fn start_location(&self) -> Coordinate;

    /// Shift window (minutes from midnight) bounding the route start.
    fn shift_window(&self) -> (i64, i64);

    /// Maximum number of requests carried on one route.
    fn capacity(&self) -> i64;

    /// Quality rating on the configured rating scale.
    fn rating(&self) -> f64;

    /// Skill identifiers held by this agent.
    fn skills(&self) -> &[String];
}

/// Provides a travel-time block (whole minutes) between two location lists.
///
/// The result has one row per origin and one column per destination, in the
/// order given.
pub trait TravelTimeProvider {
    fn durations(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
    ) -> Result<Vec<Vec<i64>>, ProviderError>;
}
