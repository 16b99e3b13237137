//! Route timing, load and cost.
//!
//! The time dimension tracks completion times. From a feasible completion
//! interval `[e, l]` at one stop, an arc of augmented cost `t` plus up to
//! `max_slack` minutes of waiting reaches `[e + t, l + t + max_slack]`, which
//! is intersected with the next stop's window. A backward pass then trims
//! every interval to the values that extend to a full feasible route.

use crate::problem::RoutingProblem;

/// Fully timed route of one agent, start and end nodes included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSchedule {
    pub agent: usize,
    pub nodes: Vec<usize>,
    /// Feasible completion-time interval per node.
    pub completion: Vec<(i64, i64)>,
    /// Permitted wait after each node before travelling on.
    pub slack: Vec<(i64, i64)>,
    pub load: i64,
    /// Sum of augmented arc costs (travel plus destination service).
    pub arc_cost: i64,
    /// Pure movement time: arc costs minus destination service times.
    pub travel_time: i64,
}

impl RouteSchedule {
    pub fn requests(&self) -> &[usize] {
        &self.nodes[1..self.nodes.len() - 1]
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 2
    }
}

/// Completion bounds of `node`: requests complete within their service
/// window shifted by the service time; other nodes use the window as is.
fn completion_bounds(problem: &RoutingProblem, node: usize) -> (i64, i64) {
    let (start, end) = problem.time_window(node);
    let service = problem.service(node);
    (start + service, (end + service).min(problem.horizon()))
}

fn admits(problem: &RoutingProblem, agent: usize, requests: &[usize]) -> bool {
    let mut load = 0;
    for &node in requests {
        if !problem.is_eligible(node, agent) {
            return false;
        }
        load += problem.demand(node);
        if load > problem.capacity(agent) {
            return false;
        }
    }
    true
}

/// Arc cost of the route if it is feasible, without building a schedule.
///
/// Used in the search hot loop.
pub fn route_cost(problem: &RoutingProblem, agent: usize, requests: &[usize]) -> Option<i64> {
    if !admits(problem, agent, requests) {
        return None;
    }

    let start = problem.start(agent);
    let (mut earliest, mut latest) = completion_bounds(problem, start);
    if earliest > latest {
        return None;
    }

    let mut cost = 0;
    let mut prev = start;
    for &node in requests.iter().chain(std::iter::once(&problem.end(agent))) {
        let arc = problem.arc_cost(prev, node);
        let (lo, hi) = completion_bounds(problem, node);
        earliest = (earliest + arc).max(lo);
        latest = (latest + arc + problem.max_slack()).min(hi);
        if earliest > latest {
            return None;
        }
        cost += arc;
        prev = node;
    }
    Some(cost)
}

/// Builds the timed schedule of a route, or `None` if it is infeasible.
pub fn schedule(problem: &RoutingProblem, agent: usize, requests: &[usize]) -> Option<RouteSchedule> {
    if !admits(problem, agent, requests) {
        return None;
    }

    let mut nodes = Vec::with_capacity(requests.len() + 2);
    nodes.push(problem.start(agent));
    nodes.extend_from_slice(requests);
    nodes.push(problem.end(agent));

    let max_slack = problem.max_slack();
    let mut completion = Vec::with_capacity(nodes.len());
    let first = completion_bounds(problem, nodes[0]);
    if first.0 > first.1 {
        return None;
    }
    completion.push(first);

    for pair in nodes.windows(2) {
        let (earliest, latest) = completion[completion.len() - 1];
        let arc = problem.arc_cost(pair[0], pair[1]);
        let (lo, hi) = completion_bounds(problem, pair[1]);
        let next = ((earliest + arc).max(lo), (latest + arc + max_slack).min(hi));
        if next.0 > next.1 {
            return None;
        }
        completion.push(next);
    }

    for k in (0..nodes.len() - 1).rev() {
        let arc = problem.arc_cost(nodes[k], nodes[k + 1]);
        let (next_lo, next_hi) = completion[k + 1];
        let (lo, hi) = completion[k];
        completion[k] = (lo.max(next_lo - arc - max_slack), hi.min(next_hi - arc));
    }

    let mut slack = Vec::with_capacity(nodes.len());
    let mut arc_cost = 0;
    let mut travel_time = 0;
    for k in 0..nodes.len() - 1 {
        let arc = problem.arc_cost(nodes[k], nodes[k + 1]);
        let (lo, hi) = completion[k];
        let (next_lo, next_hi) = completion[k + 1];
        slack.push((
            (next_lo - arc - hi).max(0),
            (next_hi - arc - lo).min(max_slack).max(0),
        ));
        arc_cost += arc;
        travel_time += arc - problem.service(nodes[k + 1]);
    }
    slack.push((0, 0));

    let load = requests.iter().map(|node| problem.demand(*node)).sum();

    Some(RouteSchedule {
        agent,
        nodes,
        completion,
        slack,
        load,
        arc_cost,
        travel_time,
    })
}
