use super::{build_agents, build_heuristics, SearchLimits, Solver};
use crate::algorithm::a_star_search;
use crate::common::{Agent, ConstraintTable, Solution};
use crate::error::Result;
use crate::map::Map;
use crate::stat::Stats;

use std::time::Instant;
use tracing::debug;

/// Plans every agent on its own, ignoring the others. Paths may collide.
pub struct Independent<'a> {
    agents: Vec<Agent>,
    map: &'a Map,
    heuristics: Vec<Vec<Vec<usize>>>,
    limits: SearchLimits,
    stats: Stats,
}

impl<'a> Independent<'a> {
    pub fn new(
        map: &'a Map,
        starts: &[(usize, usize)],
        goals: &[(usize, usize)],
    ) -> Result<Self> {
        let agents = build_agents(map, starts, goals)?;
        Ok(Independent {
            heuristics: build_heuristics(map, &agents),
            agents,
            map,
            limits: SearchLimits::default(),
            stats: Stats::default(),
        })
    }

    pub fn with_limits(mut self, limits: SearchLimits) -> Self {
        self.limits = limits;
        self
    }
}

impl Solver for Independent<'_> {
    fn find_solution(&mut self) -> Result<Solution> {
        let total_solve_start_time = Instant::now();
        let result = self.plan_all(total_solve_start_time);
        self.stats.time_us = total_solve_start_time.elapsed().as_micros() as usize;
        self.stats.print("independent");
        result
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }
}

impl Independent<'_> {
    fn plan_all(&mut self, total_solve_start_time: Instant) -> Result<Solution> {
        let constraints = ConstraintTable::new();
        let mut paths = Vec::with_capacity(self.agents.len());

        for agent in &self.agents {
            self.limits.check(paths.len(), total_solve_start_time)?;
            let path = a_star_search(
                self.map,
                agent,
                &self.heuristics[agent.id],
                &constraints,
                self.limits.horizon,
                &mut self.stats,
            )?;
            debug!("agent {} planned independently: {path:?}", agent.id);
            paths.push(path);
        }

        let solution = Solution { paths };
        self.stats.costs = solution.cost();
        Ok(solution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::sum_of_cost;
    use crate::error::SolveError;

    #[test]
    fn test_independent_simple() {
        let map = Map::from_rows(&["...", "...", "..."]);
        let mut solver = Independent::new(&map, &[(0, 0), (2, 0)], &[(0, 2), (2, 2)]).unwrap();
        let solution = solver.find_solution().unwrap();

        assert_eq!(solution.paths.len(), 2);
        assert_eq!(solution.paths[0].len(), 3);
        assert_eq!(solution.paths[1].len(), 3);
        assert_eq!(sum_of_cost(&solution.paths), 4);
        assert_eq!(solver.stats().low_level_searches, 2);
    }

    #[test]
    fn test_independent_ignores_other_agents() {
        let map = Map::from_rows(&["..."]);
        let mut solver = Independent::new(&map, &[(0, 0), (0, 2)], &[(0, 2), (0, 0)]).unwrap();
        let solution = solver.find_solution().unwrap();
        assert_eq!(solution.cost(), 4);
        assert!(!solution.verify(&map, &solver.agents));
    }

    #[test]
    fn test_independent_fails_when_one_agent_is_stuck() {
        let map = Map::from_rows(&[".@.", "..."]);
        let map_blocked = Map::from_rows(&[".@."]);
        assert!(Independent::new(&map, &[(0, 0)], &[(0, 2)])
            .unwrap()
            .find_solution()
            .is_ok());
        assert_eq!(
            Independent::new(&map_blocked, &[(0, 2), (0, 0)], &[(0, 2), (0, 2)])
                .unwrap()
                .find_solution(),
            Err(SolveError::NoPathFound { agent: 1 })
        );
    }

    #[test]
    fn test_independent_budget_exceeded() {
        let map = Map::from_rows(&["...", "...", "..."]);
        let limits = SearchLimits {
            max_expansions: Some(1),
            ..Default::default()
        };
        let mut solver = Independent::new(&map, &[(0, 0), (2, 0)], &[(0, 2), (2, 2)])
            .unwrap()
            .with_limits(limits);

        assert!(matches!(
            solver.find_solution(),
            Err(SolveError::BudgetExceeded { expanded: 1, .. })
        ));
        // Only the first agent was planned before the budget ran out.
        assert_eq!(solver.stats().low_level_searches, 1);
        assert_eq!(solver.stats().costs, 0);
    }

    #[test]
    fn test_independent_horizon_too_short() {
        let map = Map::from_rows(&["...", "...", "..."]);
        let limits = SearchLimits {
            horizon: Some(3),
            ..Default::default()
        };
        let mut solver = Independent::new(&map, &[(0, 0), (2, 0)], &[(0, 1), (0, 2)])
            .unwrap()
            .with_limits(limits);

        // Agent 1 needs four steps to reach its goal.
        assert_eq!(
            solver.find_solution(),
            Err(SolveError::NoPathFound { agent: 1 })
        );
    }
}
