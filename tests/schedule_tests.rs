//! Timing tests for route schedules.
//!
//! All coordinates use the Manhattan fixture: one unit is one minute.

mod fixtures;

use dispatch_planner::problem::RoutingProblem;
use dispatch_planner::schedule::{route_cost, schedule};
use dispatch_planner::solver::SolveOptions;
use fixtures::*;

fn build(agents: &[TestAgent], requests: &[TestRequest], options: &SolveOptions) -> RoutingProblem {
    let depots = [(0.0, 0.0)];
    let matrix = manhattan_matrix(agents, requests, &depots);
    RoutingProblem::build(agents, requests, &depots, &matrix, options).unwrap()
}

#[test]
fn test_single_visit_intervals() {
    let agents = vec![TestAgent::new("a1").start(0.0, 10.0).shift(480, 540)];
    let requests = vec![TestRequest::new("r1").location(0.0, 20.0).window(500, 560).duration(30)];
    let problem = build(&agents, &requests, &SolveOptions::default());

    let timed = schedule(&problem, 0, &[2]).expect("route should be feasible");

    assert_eq!(timed.nodes, vec![1, 2, 0]);
    assert_eq!(timed.completion, vec![(480, 540), (530, 590), (550, 670)]);
    assert_eq!(timed.slack, vec![(0, 60), (0, 60), (0, 0)]);
    assert_eq!(timed.load, 1);
    assert_eq!(timed.arc_cost, 60);
    assert_eq!(timed.travel_time, 30);
    assert_eq!(timed.requests(), &[2]);
    assert!(!timed.is_empty());
}

#[test]
fn test_route_cost_matches_schedule() {
    let agents = vec![TestAgent::new("a1").start(0.0, 10.0).shift(480, 540)];
    let requests = vec![TestRequest::new("r1").location(0.0, 20.0).window(500, 560).duration(30)];
    let problem = build(&agents, &requests, &SolveOptions::default());

    let timed = schedule(&problem, 0, &[2]).unwrap();
    assert_eq!(route_cost(&problem, 0, &[2]), Some(timed.arc_cost));
}

#[test]
fn test_waiting_is_bounded_by_max_slack() {
    let agents = vec![TestAgent::new("a1").start(0.0, 10.0).shift(480, 490)];
    let requests = vec![TestRequest::new("late").location(0.0, 20.0).window(700, 710).duration(30)];

    // Leaving by 490 and arriving at 500 would need over three hours of waiting.
    let tight = build(&agents, &requests, &SolveOptions::default());
    assert!(schedule(&tight, 0, &[2]).is_none());
    assert!(route_cost(&tight, 0, &[2]).is_none());

    let relaxed = build(&agents, &requests, &SolveOptions::default().with_max_slack(300));
    let timed = schedule(&relaxed, 0, &[2]).expect("long wait allowed");
    assert_eq!(timed.completion[1], (730, 740));
}

#[test]
fn test_completion_respects_window_end() {
    let agents = vec![TestAgent::new("a1").start(0.0, 0.0).shift(480, 480)];
    let requests = vec![TestRequest::new("early").location(0.0, 30.0).window(480, 500).duration(10)];
    let problem = build(&agents, &requests, &SolveOptions::default());

    // Earliest arrival is 510, after the window closes at 500.
    assert!(schedule(&problem, 0, &[2]).is_none());
}

#[test]
fn test_empty_route_spans_start_to_end() {
    let agents = vec![TestAgent::new("a1").start(0.0, 15.0).shift(480, 540)];
    let problem = build(&agents, &[], &SolveOptions::default());

    let timed = schedule(&problem, 0, &[]).unwrap();
    assert!(timed.is_empty());
    assert_eq!(timed.nodes, vec![1, 0]);
    assert_eq!(timed.travel_time, 15);
    assert_eq!(timed.load, 0);
    assert_eq!(timed.slack.last(), Some(&(0, 0)));
}

#[test]
fn test_capacity_rejects_overfull_route() {
    let agents = vec![TestAgent::new("a1").capacity(1)];
    let requests = vec![
        TestRequest::new("r1").location(0.0, 5.0),
        TestRequest::new("r2").location(0.0, 6.0),
    ];
    let problem = build(&agents, &requests, &SolveOptions::default());

    assert!(schedule(&problem, 0, &[2]).is_some());
    assert!(schedule(&problem, 0, &[2, 3]).is_none());
}

#[test]
fn test_ineligible_agent_rejected() {
    let agents = vec![TestAgent::new("a1")];
    let requests = vec![TestRequest::new("r1").location(0.0, 5.0).requires("phlebotomy")];
    let problem = build(&agents, &requests, &SolveOptions::default());

    assert!(schedule(&problem, 0, &[2]).is_none());
}

#[test]
fn test_buffer_extends_service() {
    let agents = vec![TestAgent::new("a1").start(0.0, 0.0).shift(480, 480)];
    let requests = vec![
        TestRequest::new("r1")
            .location(0.0, 10.0)
            .window(480, 600)
            .duration(20)
            .buffer(15),
    ];
    let problem = build(&agents, &requests, &SolveOptions::default());

    assert_eq!(problem.service(2), 35);
    let timed = schedule(&problem, 0, &[2]).unwrap();
    // 480 + 10 travel + 35 service
    assert_eq!(timed.completion[1].0, 525);
    assert_eq!(timed.travel_time, 20);
}

#[test]
fn test_slack_intervals_are_ordered() {
    let agents = vec![TestAgent::new("a1").start(0.0, 0.0).shift(480, 600)];
    let requests = vec![
        TestRequest::new("r1").location(0.0, 5.0).window(500, 560).duration(20),
        TestRequest::new("r2").location(0.0, 15.0).window(540, 620).duration(20),
        TestRequest::new("r3").location(5.0, 15.0).window(600, 700).duration(20),
    ];
    let problem = build(&agents, &requests, &SolveOptions::default());

    let timed = schedule(&problem, 0, &[2, 3, 4]).expect("feasible chain");
    for (lo, hi) in &timed.slack {
        assert!(lo <= hi, "slack ({}, {}) inverted", lo, hi);
        assert!(*hi <= 60);
    }
    for (lo, hi) in &timed.completion {
        assert!(lo <= hi);
    }
    for (k, &node) in timed.nodes.iter().enumerate() {
        let (start, end) = problem.time_window(node);
        let service = problem.service(node);
        assert!(timed.completion[k].0 >= start + service);
        assert!(timed.completion[k].1 <= end + service);
    }
}
