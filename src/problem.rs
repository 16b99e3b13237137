//! Problem normalization: raw agents, requests and depots into an indexed
//! [`RoutingProblem`].
//!
//! Location layout:
//! - index 0: the shared end depot (single depot) or a zero-cost placeholder
//!   (several depots)
//! - `1..=K`: agent start points, one per agent
//! - `K+1..=K+R`: request sites
//! - after the requests: the real end depots (several depots only)

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::cost::CostModel;
use crate::error::ValidationError;
use crate::solver::SolveOptions;
use crate::traits::{Agent, Coordinate, Request};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationKind {
    EndDepot,
    AgentStart,
    RequestSite,
    Placeholder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub index: usize,
    /// `None` for the placeholder.
    pub coordinate: Option<Coordinate>,
    pub kind: LocationKind,
    pub request_id: Option<String>,
}

/// Fixed-size set of agent indices.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AgentSet {
    words: Vec<u64>,
    len: usize,
}

impl AgentSet {
    pub fn empty(agent_count: usize) -> Self {
        Self {
            words: vec![0; agent_count.div_ceil(64)],
            len: agent_count,
        }
    }

    pub fn full(agent_count: usize) -> Self {
        let mut set = Self::empty(agent_count);
        for agent in 0..agent_count {
            set.insert(agent);
        }
        set
    }

    pub fn insert(&mut self, agent: usize) {
        if agent < self.len {
            self.words[agent / 64] |= 1u64 << (agent % 64);
        }
    }

    pub fn contains(&self, agent: usize) -> bool {
        agent < self.len && self.words[agent / 64] & (1u64 << (agent % 64)) != 0
    }

    pub fn intersect_with(&mut self, other: &AgentSet) {
        for (word, other) in self.words.iter_mut().zip(&other.words) {
            *word &= *other;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|word| *word == 0)
    }

    pub fn count(&self) -> usize {
        self.words.iter().map(|word| word.count_ones() as usize).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(|agent| self.contains(*agent))
    }
}

/// Immutable, fully indexed routing problem.
#[derive(Debug, Clone)]
pub struct RoutingProblem {
    locations: Vec<Location>,
    agent_ids: Vec<String>,
    travel: Vec<Vec<i64>>,
    service: Vec<i64>,
    cost: CostModel,
    time_windows: Vec<(i64, i64)>,
    demands: Vec<i64>,
    capacities: Vec<i64>,
    ratings: Vec<f64>,
    eligible: Vec<AgentSet>,
    starts: Vec<usize>,
    ends: Vec<usize>,
    end_depots: Vec<usize>,
    max_slack: i64,
    horizon: i64,
}

/// Coordinates in the order the travel-time provider must be queried with.
///
/// One depot: depot, agents, requests. Several depots: agents, requests,
/// depots (the placeholder at index 0 has no address).
pub fn canonical_addresses<A, R>(agents: &[A], requests: &[R], end_depots: &[Coordinate]) -> Vec<Coordinate>
where
    A: Agent,
    R: Request,
{
    let mut addresses = Vec::with_capacity(agents.len() + requests.len() + end_depots.len());
    if end_depots.len() == 1 {
        addresses.push(end_depots[0]);
    }
    addresses.extend(agents.iter().map(|agent| agent.start_location()));
    addresses.extend(requests.iter().map(|request| request.location()));
    if end_depots.len() > 1 {
        addresses.extend_from_slice(end_depots);
    }
    addresses
}

impl RoutingProblem {
    /// Normalizes raw inputs. `matrix` must follow [`canonical_addresses`].
    pub fn build<A, R>(
        agents: &[A],
        requests: &[R],
        end_depots: &[Coordinate],
        matrix: &[Vec<i64>],
        options: &SolveOptions,
    ) -> Result<Self, ValidationError>
    where
        A: Agent,
        R: Request,
    {
        options.validate()?;
        if end_depots.is_empty() {
            return Err(ValidationError::NoEndDepots);
        }
        if agents.is_empty() {
            return Err(ValidationError::NoAgents);
        }

        let multi_depot = end_depots.len() > 1;
        let agent_count = agents.len();
        let first_request = agent_count + 1;
        let addressable = agent_count + requests.len() + end_depots.len();
        validate_matrix(matrix, addressable)?;

        let travel = if multi_depot {
            with_placeholder(matrix)
        } else {
            matrix.to_vec()
        };
        let size = travel.len();

        let mut locations = Vec::with_capacity(size);
        if multi_depot {
            locations.push(Location {
                index: 0,
                coordinate: None,
                kind: LocationKind::Placeholder,
                request_id: None,
            });
        } else {
            locations.push(Location {
                index: 0,
                coordinate: Some(end_depots[0]),
                kind: LocationKind::EndDepot,
                request_id: None,
            });
        }

        let mut agent_ids = Vec::with_capacity(agent_count);
        let mut time_windows = vec![options.operating_day];
        let mut capacities = Vec::with_capacity(agent_count);
        let mut ratings = Vec::with_capacity(agent_count);

        for agent in agents {
            let label = format!("agent {}", agent.id());
            let shift = agent.shift_window();
            validate_window(&label, shift)?;
            if agent.capacity() < 0 {
                return Err(ValidationError::InvalidCapacity {
                    agent: agent.id().to_string(),
                    value: agent.capacity(),
                });
            }
            let rating = agent.rating();
            if !rating.is_finite() || rating < 0.0 || rating > options.rating_scale {
                return Err(ValidationError::InvalidRating {
                    agent: agent.id().to_string(),
                    value: rating,
                    scale: options.rating_scale,
                });
            }

            locations.push(Location {
                index: locations.len(),
                coordinate: Some(agent.start_location()),
                kind: LocationKind::AgentStart,
                request_id: None,
            });
            agent_ids.push(agent.id().to_string());
            time_windows.push(shift);
            capacities.push(agent.capacity());
            ratings.push(rating);
        }

        let skill_index = skill_index(agents);
        let mut service = vec![0; first_request];
        let mut prices: Vec<Option<f64>> = vec![None; first_request];
        let mut eligible = vec![AgentSet::full(agent_count); first_request];

        for request in requests {
            let label = format!("request {}", request.id());
            validate_window(&label, request.time_window())?;
            for value in [request.duration_minutes(), request.buffer_minutes()] {
                if value < 0 {
                    return Err(ValidationError::NegativeDuration {
                        request: request.id().to_string(),
                        value,
                    });
                }
            }
            let price = request.price();
            if !price.is_finite() || price < 0.0 {
                return Err(ValidationError::InvalidPrice {
                    request: request.id().to_string(),
                    value: price,
                });
            }

            let agents_for_request = eligible_agents(request.required_skills(), &skill_index, agent_count);
            if agents_for_request.is_empty() {
                warn!(
                    request = %request.id(),
                    skills = ?request.required_skills(),
                    "no agent holds every required skill; request will be dropped"
                );
            }

            let index = locations.len();
            locations.push(Location {
                index,
                coordinate: Some(request.location()),
                kind: LocationKind::RequestSite,
                request_id: Some(request.id().to_string()),
            });
            time_windows.push(request.time_window());
            service.push(request.duration_minutes() + request.buffer_minutes());
            prices.push(Some(price));
            eligible.push(agents_for_request);
        }

        let mut end_depot_indices = vec![0];
        if multi_depot {
            end_depot_indices.clear();
            for depot in end_depots {
                end_depot_indices.push(locations.len());
                locations.push(Location {
                    index: locations.len(),
                    coordinate: Some(*depot),
                    kind: LocationKind::EndDepot,
                    request_id: None,
                });
                time_windows.push(options.operating_day);
                service.push(0);
                prices.push(None);
                eligible.push(AgentSet::empty(agent_count));
            }
        }
        debug_assert_eq!(locations.len(), size);

        let demands = locations
            .iter()
            .map(|location| i64::from(location.kind == LocationKind::RequestSite))
            .collect();

        let cost = CostModel::build(&travel, &service, &prices, end_depot_indices[0])?;
        validate_time_range(&time_windows, &service, &cost.augmented, options)?;

        info!(
            agents = agent_count,
            requests = requests.len(),
            end_depots = end_depots.len(),
            penalty_scale = cost.scale,
            "normalized routing problem"
        );

        Ok(Self {
            locations,
            agent_ids,
            travel,
            service,
            cost,
            time_windows,
            demands,
            capacities,
            ratings,
            eligible,
            starts: (1..=agent_count).collect(),
            ends: vec![0; agent_count],
            end_depots: end_depot_indices,
            max_slack: options.max_slack_minutes,
            horizon: options.horizon_minutes,
        })
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn size(&self) -> usize {
        self.locations.len()
    }

    pub fn agent_count(&self) -> usize {
        self.agent_ids.len()
    }

    pub fn agent_ids(&self) -> &[String] {
        &self.agent_ids
    }

    pub fn is_multi_depot(&self) -> bool {
        self.locations[0].kind == LocationKind::Placeholder
    }

    /// Raw travel minutes, without service time.
    pub fn travel(&self, from: usize, to: usize) -> i64 {
        self.travel[from][to]
    }

    /// Travel minutes plus the service time at `to`.
    pub fn arc_cost(&self, from: usize, to: usize) -> i64 {
        self.cost.augmented[from][to]
    }

    pub fn service(&self, node: usize) -> i64 {
        self.service[node]
    }

    pub fn time_window(&self, node: usize) -> (i64, i64) {
        self.time_windows[node]
    }

    pub fn demand(&self, node: usize) -> i64 {
        self.demands[node]
    }

    pub fn capacity(&self, agent: usize) -> i64 {
        self.capacities[agent]
    }

    pub fn rating(&self, agent: usize) -> f64 {
        self.ratings[agent]
    }

    pub fn eligible(&self, node: usize) -> &AgentSet {
        &self.eligible[node]
    }

    pub fn is_eligible(&self, node: usize, agent: usize) -> bool {
        self.eligible[node].contains(agent)
    }

    pub fn penalty(&self, node: usize) -> Option<i64> {
        self.cost.penalties[node]
    }

    pub fn penalty_scale(&self) -> i64 {
        self.cost.scale
    }

    pub fn unscale(&self, penalty: i64) -> f64 {
        self.cost.unscale(penalty)
    }

    pub fn start(&self, agent: usize) -> usize {
        self.starts[agent]
    }

    pub fn end(&self, agent: usize) -> usize {
        self.ends[agent]
    }

    /// Real end locations: `[0]` for one depot, the appended depots otherwise.
    pub fn end_depots(&self) -> &[usize] {
        &self.end_depots
    }

    pub fn is_request(&self, node: usize) -> bool {
        self.locations[node].kind == LocationKind::RequestSite
    }

    pub fn request_nodes(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.size()).filter(|node| self.is_request(*node))
    }

    pub fn max_slack(&self) -> i64 {
        self.max_slack
    }

    pub fn horizon(&self) -> i64 {
        self.horizon
    }
}

fn validate_matrix(matrix: &[Vec<i64>], expected: usize) -> Result<(), ValidationError> {
    if matrix.len() != expected {
        return Err(ValidationError::MatrixDimension {
            expected,
            rows: matrix.len(),
        });
    }
    for (from, row) in matrix.iter().enumerate() {
        if row.len() != expected {
            return Err(ValidationError::MatrixNotSquare {
                row: from,
                len: row.len(),
            });
        }
        if let Some((to, value)) = row.iter().enumerate().find(|(_, value)| **value < 0) {
            return Err(ValidationError::NegativeTravelTime {
                from,
                to,
                value: *value,
            });
        }
    }
    Ok(())
}

fn validate_window(entity: &str, (start, end): (i64, i64)) -> Result<(), ValidationError> {
    if start < 0 {
        return Err(ValidationError::NegativeTime {
            entity: entity.to_string(),
            value: start,
        });
    }
    if end < start {
        return Err(ValidationError::InvertedWindow {
            entity: entity.to_string(),
            start,
            end,
        });
    }
    Ok(())
}

/// Every completion bound and every `latest + arc + slack` step of the
/// schedule must fit `i64`. Completion upper bounds never exceed the horizon.
fn validate_time_range(
    time_windows: &[(i64, i64)],
    service: &[i64],
    augmented: &[Vec<i64>],
    options: &SolveOptions,
) -> Result<(), ValidationError> {
    for (node, (&(_, end), &svc)) in time_windows.iter().zip(service).enumerate() {
        if end.checked_add(svc).is_none() {
            return Err(ValidationError::CostOverflow(format!(
                "completion bound of location {} ({} + {})",
                node, end, svc
            )));
        }
    }

    let longest = augmented.iter().flatten().copied().max().unwrap_or(0);
    options
        .horizon_minutes
        .checked_add(options.max_slack_minutes)
        .and_then(|bound| bound.checked_add(longest))
        .map(|_| ())
        .ok_or_else(|| {
            ValidationError::CostOverflow(format!(
                "horizon {} + slack {} + arc {}",
                options.horizon_minutes, options.max_slack_minutes, longest
            ))
        })
}

/// Inserts an all-zero row and column at index 0.
fn with_placeholder(matrix: &[Vec<i64>]) -> Vec<Vec<i64>> {
    let size = matrix.len() + 1;
    let mut travel = Vec::with_capacity(size);
    travel.push(vec![0; size]);
    for row in matrix {
        let mut padded = Vec::with_capacity(size);
        padded.push(0);
        padded.extend_from_slice(row);
        travel.push(padded);
    }
    travel
}

fn skill_index<A: Agent>(agents: &[A]) -> HashMap<&str, AgentSet> {
    let mut index: HashMap<&str, AgentSet> = HashMap::new();
    for (agent_index, agent) in agents.iter().enumerate() {
        for skill in agent.skills() {
            index
                .entry(skill.as_str())
                .or_insert_with(|| AgentSet::empty(agents.len()))
                .insert(agent_index);
        }
    }
    index
}

/// Intersection, over all required skills, of the agents holding that skill.
fn eligible_agents(
    required: &[String],
    skill_index: &HashMap<&str, AgentSet>,
    agent_count: usize,
) -> AgentSet {
    let mut eligible = AgentSet::full(agent_count);
    for skill in required {
        match skill_index.get(skill.as_str()) {
            Some(holders) => eligible.intersect_with(holders),
            None => {
                debug!(skill = %skill, "skill held by no agent");
                return AgentSet::empty(agent_count);
            }
        }
    }
    eligible
}
