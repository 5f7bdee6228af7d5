//! Multi-agent path finding on 4-connected grids.
//!
//! Three solvers share one space-time A* planner: [`solver::Independent`]
//! plans agents in isolation, [`solver::Prioritized`] plans them in index
//! order around already committed paths, and [`solver::CBS`] runs
//! Conflict-Based Search for a collision-free solution of minimum
//! sum-of-cost.

pub mod algorithm;
pub mod common;
pub mod config;
pub mod error;
pub mod map;
pub mod scenario;
pub mod solver;
pub mod stat;

pub use common::{sum_of_cost, Agent, Path, Solution};
pub use error::SolveError;
pub use map::Map;
pub use solver::{SearchLimits, Solver, CBS, Independent, Prioritized};
