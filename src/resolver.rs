//! Multi-depot resolution.
//!
//! With several end depots the search routes every agent to a zero-cost
//! placeholder. Afterwards each route's placeholder is replaced by the end
//! depot closest to its last stop; ties go to the first depot listed.

use tracing::debug;

use crate::error::ProviderError;
use crate::problem::RoutingProblem;
use crate::report::{Itinerary, PlanDocument};
use crate::traits::{Coordinate, TravelTimeProvider};

/// Resolves end depots from the normalized travel matrix.
pub fn resolve(problem: &RoutingProblem, document: &mut PlanDocument) {
    if !problem.is_multi_depot() {
        return;
    }
    for route in &mut document.routes {
        let Some(last) = last_stop(route) else {
            continue;
        };
        let times: Vec<i64> = problem
            .end_depots()
            .iter()
            .map(|depot| problem.travel(last, *depot))
            .collect();
        let added = append_nearest(problem, route, &times);
        document.model.total_travel_time += added;
    }
}

/// Resolves end depots with a fresh lookup per route.
pub fn resolve_with_provider<P>(
    problem: &RoutingProblem,
    document: &mut PlanDocument,
    provider: &P,
) -> Result<(), ProviderError>
where
    P: TravelTimeProvider + ?Sized,
{
    if !problem.is_multi_depot() {
        return Ok(());
    }
    let depots: Vec<Coordinate> = problem
        .end_depots()
        .iter()
        .filter_map(|depot| problem.locations()[*depot].coordinate)
        .collect();

    for route in &mut document.routes {
        let Some(last) = last_stop(route) else {
            continue;
        };
        let Some(origin) = problem.locations()[last].coordinate else {
            continue;
        };
        let block = provider.durations(&[origin], &depots)?;
        let times = match block.into_iter().next() {
            Some(row) if row.len() == depots.len() => row,
            other => {
                return Err(ProviderError::Shape {
                    expected: (1, depots.len()),
                    actual: (usize::from(other.is_some()), other.map_or(0, |row| row.len())),
                });
            }
        };
        let added = append_nearest(problem, route, &times);
        document.model.total_travel_time += added;
    }
    Ok(())
}

/// Location of the last real stop, ignoring the trailing placeholder.
fn last_stop(route: &Itinerary) -> Option<usize> {
    let len = route.location_sequence.len();
    if len < 2 {
        return None;
    }
    Some(route.location_sequence[len - 2])
}

/// Replaces the trailing placeholder with the depot of minimum travel time.
fn append_nearest(problem: &RoutingProblem, route: &mut Itinerary, times: &[i64]) -> i64 {
    let mut best: Option<(usize, i64)> = None;
    for (position, time) in times.iter().enumerate() {
        if best.is_none_or(|(_, best_time)| *time < best_time) {
            best = Some((position, *time));
        }
    }
    let Some((position, travel)) = best else {
        return 0;
    };
    let depot = problem.end_depots()[position];

    route.location_sequence.pop();
    route.arrival_windows.pop();
    route.departure_windows.pop();
    route.slack_windows.pop();

    let (lo, hi) = route.departure_windows.last().copied().unwrap_or((0, 0));
    if let Some(slack) = route.slack_windows.last_mut() {
        *slack = (0, 0);
    }
    let arrival = (lo + travel, hi + travel);
    route.location_sequence.push(depot);
    route.arrival_windows.push(arrival);
    route.departure_windows.push(arrival);
    route.slack_windows.push((0, 0));
    route.total_travel_time += travel;

    debug!(agent = route.agent_index, depot, travel, "resolved end depot");
    travel
}
