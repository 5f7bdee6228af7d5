mod cbs;
mod independent;
mod prioritized;

pub use cbs::CBS;
pub use independent::Independent;
pub use prioritized::Prioritized;

use crate::common::{Agent, Solution};
use crate::error::{Result, SolveError};
use crate::map::Map;
use crate::stat::Stats;

use std::collections::HashSet;
use std::time::{Duration, Instant};

pub trait Solver {
    /// Agent-indexed paths, or the reason none could be produced.
    fn find_solution(&mut self) -> Result<Solution>;

    fn stats(&self) -> &Stats;
}

/// Caller-imposed bounds on a single solve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchLimits {
    /// Maximum number of high-level expansions (planner calls for the
    /// decoupled solvers).
    pub max_expansions: Option<usize>,
    pub time_limit: Option<Duration>,
    /// Latest arrival time the single-agent planner will consider.
    pub horizon: Option<usize>,
}

impl SearchLimits {
    /// Fails with `BudgetExceeded` once either budget is spent.
    pub(crate) fn check(&self, expanded: usize, start_time: Instant) -> Result<()> {
        let elapsed = start_time.elapsed();
        let out_of_expansions = self
            .max_expansions
            .is_some_and(|max_expansions| expanded >= max_expansions);
        let out_of_time = self
            .time_limit
            .is_some_and(|time_limit| elapsed >= time_limit);

        if out_of_expansions || out_of_time {
            return Err(SolveError::BudgetExceeded { expanded, elapsed });
        }
        Ok(())
    }
}

/// Checks the shared preconditions and turns start/goal lists into agents.
pub fn build_agents(
    map: &Map,
    starts: &[(usize, usize)],
    goals: &[(usize, usize)],
) -> Result<Vec<Agent>> {
    if starts.len() != goals.len() {
        return Err(SolveError::InvalidInput(format!(
            "{} starts but {} goals",
            starts.len(),
            goals.len()
        )));
    }

    let mut seen_starts = HashSet::new();
    let mut agents = Vec::with_capacity(starts.len());
    for (id, (&start, &goal)) in starts.iter().zip(goals).enumerate() {
        let agent = Agent { id, start, goal };
        if !agent.verify(map) {
            return Err(SolveError::InvalidInput(format!(
                "agent {id} start {start:?} or goal {goal:?} is blocked or out of bounds"
            )));
        }
        if !seen_starts.insert(start) {
            return Err(SolveError::InvalidInput(format!(
                "agent {id} shares start {start:?} with another agent"
            )));
        }
        agents.push(agent);
    }

    Ok(agents)
}

/// One reverse-BFS distance table per agent goal.
pub(crate) fn build_heuristics(map: &Map, agents: &[Agent]) -> Vec<Vec<Vec<usize>>> {
    agents
        .iter()
        .map(|agent| map.heuristic_bfs(agent.goal))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_map() -> Map {
        Map::from_rows(&["...", ".@.", "..."])
    }

    #[test]
    fn test_build_agents() {
        let agents = build_agents(&open_map(), &[(0, 0), (2, 0)], &[(0, 2), (2, 2)]).unwrap();
        assert_eq!(agents.len(), 2);
        assert_eq!(
            agents[1],
            Agent {
                id: 1,
                start: (2, 0),
                goal: (2, 2)
            }
        );
    }

    #[test]
    fn test_build_agents_rejects_invalid_input() {
        let map = open_map();
        let invalid = [
            build_agents(&map, &[(0, 0)], &[(0, 2), (2, 2)]),
            build_agents(&map, &[(1, 1)], &[(0, 2)]),
            build_agents(&map, &[(0, 0)], &[(5, 5)]),
            build_agents(&map, &[(0, 0), (0, 0)], &[(0, 2), (2, 2)]),
        ];
        for result in invalid {
            assert!(matches!(result, Err(SolveError::InvalidInput(_))));
        }
    }

    #[test]
    fn test_limits_check() {
        let start_time = Instant::now();
        assert!(SearchLimits::default().check(1_000_000, start_time).is_ok());

        let limits = SearchLimits {
            max_expansions: Some(3),
            ..Default::default()
        };
        assert!(limits.check(2, start_time).is_ok());
        assert!(matches!(
            limits.check(3, start_time),
            Err(SolveError::BudgetExceeded { expanded: 3, .. })
        ));

        let limits = SearchLimits {
            time_limit: Some(Duration::ZERO),
            ..Default::default()
        };
        assert!(matches!(
            limits.check(0, start_time),
            Err(SolveError::BudgetExceeded { .. })
        ));
    }
}
