//! End-to-end planning pipeline.
//!
//! raw tables + travel matrix -> [`RoutingProblem`] -> optimizer ->
//! [`PlanDocument`] -> end-depot resolution when several depots exist.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PlannerError, ValidationError};
use crate::extract::extract;
use crate::matrix::fetch_matrix;
use crate::optimizer::{GuidedLocalSearch, Optimizer};
use crate::problem::{RoutingProblem, canonical_addresses};
use crate::report::PlanDocument;
use crate::resolver;
use crate::traits::{Agent, Coordinate, Request, TravelTimeProvider};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveOptions {
    /// Wall-clock budget of the search.
    pub time_budget: Duration,
    /// Maximum wait at a stop before service may begin (minutes).
    pub max_slack_minutes: i64,
    /// Upper bound of every cumulative time value (minutes).
    pub horizon_minutes: i64,
    /// Window of the end depot or placeholder (minutes from midnight).
    pub operating_day: (i64, i64),
    /// Highest possible agent rating.
    pub rating_scale: f64,
    /// Fixed-use cost per rating point below the scale maximum.
    pub rating_weight: i64,
    /// Guided local search penalty factor.
    pub lambda_coefficient: f64,
    /// Closest requests considered by exchange moves.
    pub neighbourhood_size: usize,
    /// Optional cap on search iterations.
    pub max_iterations: Option<usize>,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            time_budget: Duration::from_secs(30),
            max_slack_minutes: 60,
            horizon_minutes: 24 * 60,
            operating_day: (6 * 60, 18 * 60),
            rating_scale: 5.0,
            rating_weight: 1,
            lambda_coefficient: 0.1,
            neighbourhood_size: 20,
            max_iterations: None,
        }
    }
}

impl SolveOptions {
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = budget;
        self
    }

    pub fn with_max_slack(mut self, minutes: i64) -> Self {
        self.max_slack_minutes = minutes;
        self
    }

    pub fn with_horizon(mut self, minutes: i64) -> Self {
        self.horizon_minutes = minutes;
        self
    }

    pub fn with_operating_day(mut self, start: i64, end: i64) -> Self {
        self.operating_day = (start, end);
        self
    }

    pub fn with_rating_scale(mut self, scale: f64) -> Self {
        self.rating_scale = scale;
        self
    }

    pub fn with_rating_weight(mut self, weight: i64) -> Self {
        self.rating_weight = weight;
        self
    }

    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = Some(iterations);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let (start, end) = self.operating_day;
        if start < 0 || end < start {
            return Err(ValidationError::InvalidOptions(format!(
                "operating day ({}, {})",
                start, end
            )));
        }
        if self.max_slack_minutes < 0 || self.horizon_minutes < 0 {
            return Err(ValidationError::InvalidOptions(
                "slack and horizon must be non-negative".to_string(),
            ));
        }
        if !(self.rating_scale.is_finite() && self.rating_scale > 0.0) {
            return Err(ValidationError::InvalidOptions(format!(
                "rating scale {}",
                self.rating_scale
            )));
        }
        if self.rating_weight < 0 {
            return Err(ValidationError::InvalidOptions(format!(
                "rating weight {}",
                self.rating_weight
            )));
        }
        if !(self.lambda_coefficient.is_finite() && self.lambda_coefficient >= 0.0) {
            return Err(ValidationError::InvalidOptions(format!(
                "lambda coefficient {}",
                self.lambda_coefficient
            )));
        }
        Ok(())
    }
}

/// Plans routes with the default guided local search on the wall clock.
pub fn solve<A, R>(
    agents: &[A],
    requests: &[R],
    end_depots: &[Coordinate],
    matrix: &[Vec<i64>],
    options: SolveOptions,
) -> Result<PlanDocument, PlannerError>
where
    A: Agent,
    R: Request,
{
    let optimizer = GuidedLocalSearch::new(options.clone());
    solve_with_optimizer(agents, requests, end_depots, matrix, &options, &optimizer)
}

/// Plans routes with any optimizer backend.
pub fn solve_with_optimizer<A, R, O>(
    agents: &[A],
    requests: &[R],
    end_depots: &[Coordinate],
    matrix: &[Vec<i64>],
    options: &SolveOptions,
    optimizer: &O,
) -> Result<PlanDocument, PlannerError>
where
    A: Agent,
    R: Request,
    O: Optimizer + ?Sized,
{
    let problem = RoutingProblem::build(agents, requests, end_depots, matrix, options)?;
    let model = optimizer.build_model(&problem);
    let solution = optimizer.solve(&model, options.time_budget)?;

    let mut document = extract(&problem, &solution);
    resolver::resolve(&problem, &mut document);

    info!(
        objective = document.model.objective_value,
        routes = document.routes.len(),
        dropped = document.model.total_dropped_count,
        "plan ready"
    );
    Ok(document)
}

/// Fetches the travel matrix from `provider` in chunks, then plans routes.
pub fn solve_with_provider<A, R, P>(
    agents: &[A],
    requests: &[R],
    end_depots: &[Coordinate],
    provider: &P,
    max_elements: usize,
    options: SolveOptions,
) -> Result<PlanDocument, PlannerError>
where
    A: Agent,
    R: Request,
    P: TravelTimeProvider + Sync + ?Sized,
{
    let addresses = canonical_addresses(agents, requests, end_depots);
    let matrix = fetch_matrix(provider, &addresses, max_elements)?;
    solve(agents, requests, end_depots, &matrix, options)
}
