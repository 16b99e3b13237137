//! Solution extraction into the output document.

use tracing::info;

use crate::optimizer::Solution;
use crate::problem::{LocationKind, RoutingProblem};
use crate::report::{AgentMeta, Itinerary, LocationMeta, Metadata, ModelSummary, PlanDocument};
use crate::schedule::RouteSchedule;

/// Walks the solution into per-agent itineraries plus drop accounting.
pub fn extract(problem: &RoutingProblem, solution: &Solution) -> PlanDocument {
    let routes: Vec<Itinerary> = solution
        .routes
        .iter()
        .map(|route| itinerary(problem, route))
        .collect();

    let dropped_location_indices: Vec<usize> = problem
        .request_nodes()
        .filter(|node| solution.successor(*node) == *node)
        .collect();
    let dropped_revenues: Vec<f64> = dropped_location_indices
        .iter()
        .map(|node| problem.unscale(problem.penalty(*node).unwrap_or(0)))
        .collect();
    let total_revenue_lost = dropped_revenues.iter().sum();

    let model = ModelSummary {
        objective_value: solution.objective,
        status: solution.status,
        total_revenue_lost,
        total_dropped_count: dropped_location_indices.len(),
        dropped_location_indices,
        dropped_revenues,
        total_travel_time: routes.iter().map(|route| route.total_travel_time).sum(),
        total_load: routes.iter().map(|route| route.total_load).sum(),
    };

    info!(
        served = model.total_load,
        dropped = model.total_dropped_count,
        revenue_lost = model.total_revenue_lost,
        "extracted solution"
    );

    PlanDocument {
        metadata: metadata(problem),
        model,
        routes,
    }
}

fn itinerary(problem: &RoutingProblem, route: &RouteSchedule) -> Itinerary {
    let arrival_windows = route
        .nodes
        .iter()
        .zip(&route.completion)
        .map(|(node, (lo, hi))| {
            let service = problem.service(*node);
            (lo - service, hi - service)
        })
        .collect();

    let mut total_travel_time = 0;
    for pair in route.nodes.windows(2) {
        total_travel_time += problem.arc_cost(pair[0], pair[1]) - problem.service(pair[1]);
    }
    let total_load = route.nodes.iter().map(|node| problem.demand(*node)).sum();

    Itinerary {
        agent_index: route.agent,
        total_travel_time,
        total_load,
        location_sequence: route.nodes.clone(),
        arrival_windows,
        departure_windows: route.completion.clone(),
        slack_windows: route.slack.clone(),
    }
}

fn metadata(problem: &RoutingProblem) -> Metadata {
    let locations = problem
        .locations()
        .iter()
        .map(|location| LocationMeta {
            index: location.index,
            coordinate: match (location.kind, location.coordinate) {
                (LocationKind::Placeholder, _) | (_, None) => "Placeholder".to_string(),
                (_, Some((lat, lng))) => format!("{:.6},{:.6}", lat, lng),
            },
            request_id: location.request_id.clone(),
        })
        .collect();

    let agents = problem
        .agent_ids()
        .iter()
        .enumerate()
        .map(|(index, id)| AgentMeta {
            index,
            id: id.clone(),
        })
        .collect();

    Metadata { locations, agents }
}
