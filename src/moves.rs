//! Local search neighbourhoods.
//!
//! Every neighbourhood applies the first move that lowers the guided
//! objective and reports whether it found one. Candidate routes are
//! re-evaluated in full, so each accepted move keeps every route feasible.

use crate::optimizer::{Guide, Model, SearchState};

/// Real and guided cost of a candidate route, if feasible.
fn evaluate(model: &Model<'_>, guide: &Guide, agent: usize, route: &[usize]) -> Option<(i64, i64)> {
    let real = model.route_cost(agent, route)?;
    Some((real, real + guide.route_penalty(model, agent, route)))
}

fn replace(search: &mut SearchState, agent: usize, route: Vec<usize>, (real, guided): (i64, i64)) {
    search.plan.routes[agent] = route;
    search.plan.costs[agent] = real;
    search.plan.guided[agent] = guided;
}

fn penalty(model: &Model<'_>, node: usize) -> i64 {
    model.problem.penalty(node).unwrap_or(0)
}

/// Node -> (agent, position) for every served request.
fn positions(search: &SearchState, size: usize) -> Vec<Option<(usize, usize)>> {
    let mut positions = vec![None; size];
    for (agent, route) in search.plan.routes.iter().enumerate() {
        for (pos, node) in route.iter().enumerate() {
            positions[*node] = Some((agent, pos));
        }
    }
    positions
}

/// Tries each neighbourhood in turn and applies the first improving move.
pub(crate) fn improve(search: &mut SearchState, model: &Model<'_>, guide: &Guide) -> bool {
    insert_dropped(search, model, guide)
        || relocate(search, model, guide)
        || exchange(search, model, guide)
        || swap_dropped(search, model, guide)
        || two_opt(search, model, guide)
        || drop_served(search, model, guide)
}

/// Inserts a dropped request into some route.
fn insert_dropped(search: &mut SearchState, model: &Model<'_>, guide: &Guide) -> bool {
    let problem = model.problem;
    for index in 0..search.plan.dropped.len() {
        let node = search.plan.dropped[index];
        let gain = penalty(model, node);
        for agent in problem.eligible(node).iter() {
            let current = &search.plan.routes[agent];
            for pos in 0..=current.len() {
                let mut candidate = current.clone();
                candidate.insert(pos, node);
                let Some(cost) = evaluate(model, guide, agent, &candidate) else {
                    continue;
                };
                if cost.1 - search.plan.guided[agent] - gain < 0 {
                    replace(search, agent, candidate, cost);
                    search.plan.dropped.swap_remove(index);
                    search.dropped_penalty -= gain;
                    return true;
                }
            }
        }
    }
    false
}

/// Moves a request to another position, in its own route or another one.
fn relocate(search: &mut SearchState, model: &Model<'_>, guide: &Guide) -> bool {
    let problem = model.problem;
    for from in 0..search.plan.routes.len() {
        for from_pos in 0..search.plan.routes[from].len() {
            let node = search.plan.routes[from][from_pos];
            let mut shortened = search.plan.routes[from].clone();
            shortened.remove(from_pos);
            let shortened_cost = evaluate(model, guide, from, &shortened);

            for to in problem.eligible(node).iter() {
                if to == from {
                    for to_pos in 0..=shortened.len() {
                        if to_pos == from_pos {
                            continue;
                        }
                        let mut candidate = shortened.clone();
                        candidate.insert(to_pos, node);
                        let Some(cost) = evaluate(model, guide, from, &candidate) else {
                            continue;
                        };
                        if cost.1 < search.plan.guided[from] {
                            replace(search, from, candidate, cost);
                            return true;
                        }
                    }
                    continue;
                }

                let Some(from_cost) = shortened_cost else {
                    continue;
                };
                let target = &search.plan.routes[to];
                for to_pos in 0..=target.len() {
                    let mut candidate = target.clone();
                    candidate.insert(to_pos, node);
                    let Some(to_cost) = evaluate(model, guide, to, &candidate) else {
                        continue;
                    };
                    let delta = from_cost.1 + to_cost.1 - search.plan.guided[from] - search.plan.guided[to];
                    if delta < 0 {
                        replace(search, from, shortened, from_cost);
                        replace(search, to, candidate, to_cost);
                        return true;
                    }
                }
            }
        }
    }
    false
}

/// Swaps two requests served by different agents.
fn exchange(search: &mut SearchState, model: &Model<'_>, guide: &Guide) -> bool {
    let positions = positions(search, model.problem.size());
    for left_agent in 0..search.plan.routes.len() {
        for left_pos in 0..search.plan.routes[left_agent].len() {
            let left = search.plan.routes[left_agent][left_pos];
            for &right in model.neighbours(left) {
                let Some((right_agent, right_pos)) = positions[right] else {
                    continue;
                };
                if right_agent == left_agent {
                    continue;
                }

                let mut left_route = search.plan.routes[left_agent].clone();
                left_route[left_pos] = right;
                let Some(left_cost) = evaluate(model, guide, left_agent, &left_route) else {
                    continue;
                };
                let mut right_route = search.plan.routes[right_agent].clone();
                right_route[right_pos] = left;
                let Some(right_cost) = evaluate(model, guide, right_agent, &right_route) else {
                    continue;
                };

                let delta = left_cost.1 + right_cost.1
                    - search.plan.guided[left_agent]
                    - search.plan.guided[right_agent];
                if delta < 0 {
                    replace(search, left_agent, left_route, left_cost);
                    replace(search, right_agent, right_route, right_cost);
                    return true;
                }
            }
        }
    }
    false
}

/// Replaces a served request with a dropped one in the same slot.
fn swap_dropped(search: &mut SearchState, model: &Model<'_>, guide: &Guide) -> bool {
    let problem = model.problem;
    for index in 0..search.plan.dropped.len() {
        let dropped = search.plan.dropped[index];
        for agent in problem.eligible(dropped).iter() {
            for pos in 0..search.plan.routes[agent].len() {
                let served = search.plan.routes[agent][pos];
                let mut candidate = search.plan.routes[agent].clone();
                candidate[pos] = dropped;
                let Some(cost) = evaluate(model, guide, agent, &candidate) else {
                    continue;
                };
                let delta = cost.1 - search.plan.guided[agent] + penalty(model, served) - penalty(model, dropped);
                if delta < 0 {
                    replace(search, agent, candidate, cost);
                    search.plan.dropped[index] = served;
                    search.dropped_penalty += penalty(model, served) - penalty(model, dropped);
                    return true;
                }
            }
        }
    }
    false
}

/// Reverses a segment of one route.
fn two_opt(search: &mut SearchState, model: &Model<'_>, guide: &Guide) -> bool {
    for agent in 0..search.plan.routes.len() {
        let len = search.plan.routes[agent].len();
        for i in 0..len {
            for j in i + 1..len {
                let mut candidate = search.plan.routes[agent].clone();
                candidate[i..=j].reverse();
                let Some(cost) = evaluate(model, guide, agent, &candidate) else {
                    continue;
                };
                if cost.1 < search.plan.guided[agent] {
                    replace(search, agent, candidate, cost);
                    return true;
                }
            }
        }
    }
    false
}

/// Removes a served request when its penalty is cheaper than serving it.
fn drop_served(search: &mut SearchState, model: &Model<'_>, guide: &Guide) -> bool {
    for agent in 0..search.plan.routes.len() {
        for pos in 0..search.plan.routes[agent].len() {
            let node = search.plan.routes[agent][pos];
            let mut candidate = search.plan.routes[agent].clone();
            candidate.remove(pos);
            let Some(cost) = evaluate(model, guide, agent, &candidate) else {
                continue;
            };
            let loss = penalty(model, node);
            if cost.1 - search.plan.guided[agent] + loss < 0 {
                replace(search, agent, candidate, cost);
                search.plan.dropped.push(node);
                search.dropped_penalty += loss;
                return true;
            }
        }
    }
    false
}
