//! Route optimizer: path-cheapest-arc construction followed by a guided
//! local search that runs until the time budget is spent.
//!
//! The search keeps a single incumbent and the best plan seen so far. Moves
//! are scanned in a fixed order without randomness, but how far the search
//! gets depends on the budget and the clock, so two runs with different
//! budgets can return different routes. Only the best objective is
//! monotone: more search never returns a worse plan.

use std::cell::Cell;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::error::InfeasibleError;
use crate::moves;
use crate::problem::RoutingProblem;
use crate::schedule::{self, RouteSchedule};
use crate::solver::SolveOptions;

/// Source of monotonic time for the search loop.
pub trait Clock {
    /// Time since an arbitrary fixed origin.
    fn now(&self) -> Duration;
}

/// Wall clock.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Simulated clock that advances by `step` every time it is read.
#[derive(Debug)]
pub struct StepClock {
    step: Duration,
    reads: Cell<u32>,
}

impl StepClock {
    pub fn new(step: Duration) -> Self {
        Self {
            step,
            reads: Cell::new(0),
        }
    }

    pub fn reads(&self) -> u32 {
        self.reads.get()
    }
}

impl Clock for StepClock {
    fn now(&self) -> Duration {
        let reads = self.reads.get();
        self.reads.set(reads.saturating_add(1));
        self.step * reads
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolverStatus {
    Ok,
    NoSolution,
}

/// Search-ready view of a problem.
#[derive(Debug, Clone)]
pub struct Model<'a> {
    pub problem: &'a RoutingProblem,
    fixed_costs: Vec<i64>,
    neighbours: Vec<Vec<usize>>,
}

impl<'a> Model<'a> {
    /// Cost charged once when `agent` serves at least one request.
    pub fn fixed_cost(&self, agent: usize) -> i64 {
        self.fixed_costs[agent]
    }

    /// Request nodes closest to `node` by arc cost, nearest first.
    pub fn neighbours(&self, node: usize) -> &[usize] {
        &self.neighbours[node]
    }

    /// Real cost of a route: arcs plus the fixed cost if it is used.
    pub fn route_cost(&self, agent: usize, requests: &[usize]) -> Option<i64> {
        let arcs = schedule::route_cost(self.problem, agent, requests)?;
        if requests.is_empty() {
            Some(arcs)
        } else {
            Some(arcs + self.fixed_costs[agent])
        }
    }
}

/// Output of a search run.
#[derive(Debug, Clone)]
pub struct Solution {
    pub status: SolverStatus,
    pub objective: i64,
    pub routes: Vec<RouteSchedule>,
    pub dropped: Vec<usize>,
    pub iterations: usize,
    successors: Vec<usize>,
}

impl Solution {
    /// Next node on the route; a dropped request is its own successor.
    pub fn successor(&self, node: usize) -> usize {
        self.successors[node]
    }
}

/// Interchangeable search backend.
pub trait Optimizer {
    fn build_model<'a>(&self, problem: &'a RoutingProblem) -> Model<'a>;

    fn solve(&self, model: &Model<'_>, time_budget: Duration) -> Result<Solution, InfeasibleError>;
}

/// Guided local search over arc features.
pub struct GuidedLocalSearch<C: Clock> {
    options: SolveOptions,
    clock: C,
}

impl GuidedLocalSearch<SystemClock> {
    pub fn new(options: SolveOptions) -> Self {
        Self::with_clock(options, SystemClock::new())
    }
}

impl<C: Clock> GuidedLocalSearch<C> {
    pub fn with_clock(options: SolveOptions, clock: C) -> Self {
        Self { options, clock }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

impl<C: Clock> Optimizer for GuidedLocalSearch<C> {
    fn build_model<'a>(&self, problem: &'a RoutingProblem) -> Model<'a> {
        let fixed_costs = (0..problem.agent_count())
            .map(|agent| {
                let gap = self.options.rating_scale - problem.rating(agent);
                (gap * self.options.rating_weight as f64).round().max(0.0) as i64
            })
            .collect();

        let requests: Vec<usize> = problem.request_nodes().collect();
        let neighbours = (0..problem.size())
            .map(|node| {
                if !problem.is_request(node) {
                    return Vec::new();
                }
                let mut closest: Vec<usize> = requests.iter().copied().filter(|other| *other != node).collect();
                closest.sort_by_key(|other| (problem.arc_cost(node, *other), *other));
                closest.truncate(self.options.neighbourhood_size);
                closest
            })
            .collect();

        Model {
            problem,
            fixed_costs,
            neighbours,
        }
    }

    fn solve(&self, model: &Model<'_>, time_budget: Duration) -> Result<Solution, InfeasibleError> {
        let started = self.clock.now();
        let problem = model.problem;

        for agent in 0..problem.agent_count() {
            if model.route_cost(agent, &[]).is_none() {
                info!(agent, "agent cannot travel from start to end within its windows");
                return Err(InfeasibleError {
                    status: SolverStatus::NoSolution,
                });
            }
        }

        let mut search = SearchState::construct(model);
        let mut best = search.plan.clone();
        let mut best_objective = search.objective();
        info!(
            objective = best_objective,
            dropped = search.plan.dropped.len(),
            "initial solution constructed"
        );

        let mut guide = Guide::new(problem.size(), self.options.lambda_coefficient);
        let mut iterations = 0;
        loop {
            if self.clock.now().saturating_sub(started) >= time_budget {
                debug!(iterations, "time budget exhausted");
                break;
            }
            if self.options.max_iterations.is_some_and(|cap| iterations >= cap) {
                debug!(iterations, "iteration cap reached");
                break;
            }
            iterations += 1;

            let improved = moves::improve(&mut search, model, &guide);
            let objective = search.objective();
            if objective < best_objective {
                best_objective = objective;
                best = search.plan.clone();
                debug!(iterations, objective, "new best solution");
            }

            if !improved {
                if !guide.penalize(&search.plan, model) {
                    debug!(iterations, "local optimum has no arc left to penalize");
                    break;
                }
                search.refresh_guided(model, &guide);
                trace!(iterations, lambda = guide.lambda, "penalized local optimum");
            }
        }

        info!(iterations, objective = best_objective, "search finished");
        Ok(best.into_solution(model, best_objective, iterations))
    }
}

/// Routes and dropped requests; the incumbent of the search.
#[derive(Debug, Clone)]
pub(crate) struct Plan {
    pub routes: Vec<Vec<usize>>,
    pub dropped: Vec<usize>,
    /// Real cost per route.
    pub costs: Vec<i64>,
    /// Guided cost per route.
    pub guided: Vec<i64>,
}

impl Plan {
    fn into_solution(self, model: &Model<'_>, objective: i64, iterations: usize) -> Solution {
        let problem = model.problem;
        let mut successors: Vec<usize> = (0..problem.size()).collect();
        let mut routes = Vec::with_capacity(self.routes.len());
        for (agent, requests) in self.routes.iter().enumerate() {
            // Every incumbent route passed the same feasibility check.
            let Some(timed) = schedule::schedule(problem, agent, requests) else {
                continue;
            };
            for pair in timed.nodes.windows(2) {
                successors[pair[0]] = pair[1];
            }
            routes.push(timed);
        }

        let mut dropped = self.dropped;
        dropped.sort_unstable();

        Solution {
            status: SolverStatus::Ok,
            objective,
            routes,
            dropped,
            iterations,
            successors,
        }
    }
}

/// Incumbent plus the cached drop penalty total.
pub(crate) struct SearchState {
    pub plan: Plan,
    pub dropped_penalty: i64,
}

impl SearchState {
    /// Path cheapest arc: extend each agent's route, in agent order, with the
    /// cheapest feasible arc to an unassigned eligible request.
    fn construct(model: &Model<'_>) -> Self {
        let problem = model.problem;
        let mut assigned = vec![false; problem.size()];
        let mut routes = Vec::with_capacity(problem.agent_count());

        for agent in 0..problem.agent_count() {
            let mut route: Vec<usize> = Vec::new();
            loop {
                let last = route.last().copied().unwrap_or(problem.start(agent));
                let mut candidates: Vec<usize> = problem
                    .request_nodes()
                    .filter(|node| !assigned[*node] && problem.is_eligible(*node, agent))
                    .collect();
                candidates.sort_by_key(|node| (problem.arc_cost(last, *node), *node));

                let next = candidates.into_iter().find(|node| {
                    route.push(*node);
                    let feasible = schedule::route_cost(problem, agent, &route).is_some();
                    route.pop();
                    feasible
                });
                match next {
                    Some(node) => {
                        assigned[node] = true;
                        route.push(node);
                    }
                    None => break,
                }
            }
            routes.push(route);
        }

        let dropped: Vec<usize> = problem.request_nodes().filter(|node| !assigned[*node]).collect();
        let costs: Vec<i64> = routes
            .iter()
            .enumerate()
            .map(|(agent, route)| model.route_cost(agent, route).unwrap_or(0))
            .collect();
        let dropped_penalty = dropped.iter().map(|node| problem.penalty(*node).unwrap_or(0)).sum();

        Self {
            plan: Plan {
                guided: costs.clone(),
                routes,
                dropped,
                costs,
            },
            dropped_penalty,
        }
    }

    pub fn objective(&self) -> i64 {
        self.plan.costs.iter().sum::<i64>() + self.dropped_penalty
    }

    pub fn guided_objective(&self) -> i64 {
        self.plan.guided.iter().sum::<i64>() + self.dropped_penalty
    }

    fn refresh_guided(&mut self, model: &Model<'_>, guide: &Guide) {
        for (agent, route) in self.plan.routes.iter().enumerate() {
            self.plan.guided[agent] = self.plan.costs[agent] + guide.route_penalty(model, agent, route);
        }
    }
}

/// Arc penalty counts of the guided local search.
pub(crate) struct Guide {
    size: usize,
    counts: Vec<u32>,
    lambda: i64,
    coefficient: f64,
}

impl Guide {
    fn new(size: usize, coefficient: f64) -> Self {
        Self {
            size,
            counts: vec![0; size * size],
            lambda: 0,
            coefficient,
        }
    }

    fn count(&self, from: usize, to: usize) -> u32 {
        self.counts[from * self.size + to]
    }

    /// `lambda` times the penalty counts of the route's arcs.
    pub fn route_penalty(&self, model: &Model<'_>, agent: usize, requests: &[usize]) -> i64 {
        if self.lambda == 0 {
            return 0;
        }
        let problem = model.problem;
        let mut prev = problem.start(agent);
        let mut total: i64 = 0;
        for &node in requests.iter().chain(std::iter::once(&problem.end(agent))) {
            total += i64::from(self.count(prev, node));
            prev = node;
        }
        total * self.lambda
    }

    /// Penalizes the maximum-utility arcs of a local optimum.
    ///
    /// Returns `false` when no arc has positive cost.
    fn penalize(&mut self, plan: &Plan, model: &Model<'_>) -> bool {
        let problem = model.problem;
        let mut arcs = Vec::new();
        for (agent, route) in plan.routes.iter().enumerate() {
            if route.is_empty() {
                continue;
            }
            let mut prev = problem.start(agent);
            for &node in route.iter().chain(std::iter::once(&problem.end(agent))) {
                arcs.push((prev, node));
                prev = node;
            }
        }

        let utilities: Vec<f64> = arcs
            .iter()
            .map(|&(from, to)| problem.arc_cost(from, to) as f64 / (1.0 + f64::from(self.count(from, to))))
            .collect();
        let max_utility = utilities.iter().copied().fold(0.0, f64::max);
        if max_utility <= 0.0 {
            return false;
        }

        if self.lambda == 0 {
            let total: i64 = arcs.iter().map(|&(from, to)| problem.arc_cost(from, to)).sum();
            let average = total as f64 / arcs.len() as f64;
            self.lambda = ((self.coefficient * average).round() as i64).max(1);
        }

        for (&(from, to), utility) in arcs.iter().zip(utilities) {
            if utility >= max_utility {
                let slot = from * self.size + to;
                self.counts[slot] = self.counts[slot].saturating_add(1);
            }
        }
        true
    }
}
