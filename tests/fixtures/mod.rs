//! Test fixtures for dispatch-planner.
//!
//! Provides:
//! - Las Vegas / Henderson coordinates (from OpenStreetMap)
//! - Builders for requests and agents
//! - A Manhattan travel-time provider with predictable minutes
//! - Plan invariant checks shared by the integration tests

#![allow(dead_code)]

pub mod las_vegas_locations;

use std::fmt;
use std::time::Duration;

use dispatch_planner::error::ProviderError;
use dispatch_planner::problem::canonical_addresses;
use dispatch_planner::report::PlanDocument;
use dispatch_planner::solver::SolveOptions;
use dispatch_planner::traits::{Agent, Coordinate, Request, TravelTimeProvider};

#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct TestId(pub String);

impl TestId {
    pub fn new(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builder for test requests with sensible defaults.
#[derive(Clone, Debug)]
pub struct TestRequest {
    pub id: TestId,
    pub location: Coordinate,
    pub window: (i64, i64),
    pub duration: i64,
    pub buffer: i64,
    pub price: f64,
    pub skills: Vec<String>,
}

impl TestRequest {
    pub fn new(id: &str) -> Self {
        Self {
            id: TestId::new(id),
            location: (0.0, 0.0),
            window: (8 * 60, 17 * 60),
            duration: 30,
            buffer: 0,
            price: 100.0,
            skills: Vec::new(),
        }
    }

    pub fn location(mut self, lat: f64, lng: f64) -> Self {
        self.location = (lat, lng);
        self
    }

    pub fn window(mut self, start: i64, end: i64) -> Self {
        self.window = (start, end);
        self
    }

    pub fn duration(mut self, minutes: i64) -> Self {
        self.duration = minutes;
        self
    }

    pub fn buffer(mut self, minutes: i64) -> Self {
        self.buffer = minutes;
        self
    }

    pub fn price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }

    pub fn requires(mut self, skill: &str) -> Self {
        self.skills.push(skill.to_string());
        self
    }
}

impl Request for TestRequest {
    type Id = TestId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn location(&self) -> Coordinate {
        self.location
    }

    fn time_window(&self) -> (i64, i64) {
        self.window
    }

    fn duration_minutes(&self) -> i64 {
        self.duration
    }

    fn buffer_minutes(&self) -> i64 {
        self.buffer
    }

    fn price(&self) -> f64 {
        self.price
    }

    fn required_skills(&self) -> &[String] {
        &self.skills
    }
}

/// Builder for test agents with sensible defaults.
#[derive(Clone, Debug)]
pub struct TestAgent {
    pub id: TestId,
    pub start: Coordinate,
    pub shift: (i64, i64),
    pub capacity: i64,
    pub rating: f64,
    pub skills: Vec<String>,
}

impl TestAgent {
    pub fn new(id: &str) -> Self {
        Self {
            id: TestId::new(id),
            start: (0.0, 0.0),
            shift: (8 * 60, 9 * 60),
            capacity: 20,
            rating: 5.0,
            skills: Vec::new(),
        }
    }

    pub fn start(mut self, lat: f64, lng: f64) -> Self {
        self.start = (lat, lng);
        self
    }

    pub fn shift(mut self, start: i64, end: i64) -> Self {
        self.shift = (start, end);
        self
    }

    pub fn capacity(mut self, capacity: i64) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn rating(mut self, rating: f64) -> Self {
        self.rating = rating;
        self
    }

    pub fn skill(mut self, skill: &str) -> Self {
        self.skills.push(skill.to_string());
        self
    }
}

impl Agent for TestAgent {
    type Id = TestId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn start_location(&self) -> Coordinate {
        self.start
    }

    fn shift_window(&self) -> (i64, i64) {
        self.shift
    }

    fn capacity(&self) -> i64 {
        self.capacity
    }

    fn rating(&self) -> f64 {
        self.rating
    }

    fn skills(&self) -> &[String] {
        &self.skills
    }
}

/// Manhattan distance provider (simple, predictable).
///
/// One coordinate unit = one minute of travel.
pub struct ManhattanProvider;

pub fn manhattan(from: Coordinate, to: Coordinate) -> i64 {
    ((from.0 - to.0).abs() + (from.1 - to.1).abs()).round() as i64
}

impl TravelTimeProvider for ManhattanProvider {
    fn durations(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
    ) -> Result<Vec<Vec<i64>>, ProviderError> {
        Ok(origins
            .iter()
            .map(|from| destinations.iter().map(|to| manhattan(*from, *to)).collect())
            .collect())
    }
}

/// Full Manhattan matrix in canonical address order.
pub fn manhattan_matrix(agents: &[TestAgent], requests: &[TestRequest], depots: &[Coordinate]) -> Vec<Vec<i64>> {
    let addresses = canonical_addresses(agents, requests, depots);
    ManhattanProvider
        .durations(&addresses, &addresses)
        .expect("manhattan matrix")
}

/// Options that keep searches short and independent of wall time.
pub fn quick_options() -> SolveOptions {
    SolveOptions::default()
        .with_time_budget(Duration::from_secs(20))
        .with_max_iterations(300)
}

pub fn minutes(h: i64, m: i64) -> i64 {
    h * 60 + m
}

/// Location index of request `r`.
pub fn request_index(agents: &[TestAgent], r: usize) -> usize {
    agents.len() + 1 + r
}

/// Checks the documented plan properties against the raw inputs.
pub fn assert_plan_invariants(document: &PlanDocument, agents: &[TestAgent], requests: &[TestRequest]) {
    let first_request = agents.len() + 1;
    let is_request = |index: usize| index >= first_request && index < first_request + requests.len();

    let mut seen = vec![false; requests.len()];
    for route in &document.routes {
        let agent = &agents[route.agent_index];
        let mut load = 0;
        for (position, &index) in route.location_sequence.iter().enumerate() {
            if !is_request(index) {
                continue;
            }
            let request = &requests[index - first_request];
            assert!(!seen[index - first_request], "request {} served twice", request.id);
            seen[index - first_request] = true;

            load += 1;
            assert!(load <= agent.capacity, "agent {} over capacity", agent.id);

            let service = request.duration + request.buffer;
            let (lo, hi) = route.departure_windows[position];
            assert!(
                lo >= request.window.0 + service && hi <= request.window.1 + service,
                "request {} completes in ({}, {}) outside its window {:?} + {}",
                request.id,
                lo,
                hi,
                request.window,
                service
            );

            assert!(
                request.skills.iter().all(|skill| agent.skills.contains(skill)),
                "agent {} lacks skills for request {}",
                agent.id,
                request.id
            );
        }
        assert_eq!(route.total_load, load);
    }

    let absent: Vec<usize> = (0..requests.len())
        .filter(|r| !seen[*r])
        .map(|r| first_request + r)
        .collect();
    assert_eq!(document.model.dropped_location_indices, absent);
    assert_eq!(document.model.total_dropped_count, absent.len());

    let lost: f64 = absent.iter().map(|index| requests[index - first_request].price).sum();
    assert!(
        (document.model.total_revenue_lost - lost).abs() <= 0.5 * absent.len() as f64 + 1e-9,
        "revenue lost {} differs from dropped prices {}",
        document.model.total_revenue_lost,
        lost
    );

    for (r, request) in requests.iter().enumerate() {
        let eligible = agents
            .iter()
            .any(|agent| request.skills.iter().all(|skill| agent.skills.contains(skill)));
        if !eligible {
            assert!(!seen[r], "request {} has no eligible agent but was served", request.id);
        }
    }
}
