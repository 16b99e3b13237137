//! dispatch-planner core
//!
//! Assigns field agents to time- and skill-constrained service requests and
//! orders each agent's visits, dropping requests only when serving them is
//! infeasible or uneconomical.

pub mod traits;
pub mod error;
pub mod problem;
pub mod cost;
pub mod schedule;
pub mod optimizer;
mod moves;
pub mod extract;
pub mod report;
pub mod resolver;
pub mod matrix;
pub mod solver;
pub mod osrm;
pub mod google;
pub mod haversine;
