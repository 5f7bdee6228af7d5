use super::{build_agents, build_heuristics, SearchLimits, Solver};
use crate::algorithm::a_star_search;
use crate::common::{Agent, ConstraintTable, Path, Solution};
use crate::error::Result;
use crate::map::Map;
use crate::stat::Stats;

use std::time::Instant;
use tracing::debug;

/// Plans agents one by one in index order. Each committed path is reserved
/// for every agent planned after it, with no backtracking over the order.
pub struct Prioritized<'a> {
    agents: Vec<Agent>,
    map: &'a Map,
    heuristics: Vec<Vec<Vec<usize>>>,
    limits: SearchLimits,
    stats: Stats,
}

impl<'a> Prioritized<'a> {
    pub fn new(
        map: &'a Map,
        starts: &[(usize, usize)],
        goals: &[(usize, usize)],
    ) -> Result<Self> {
        let agents = build_agents(map, starts, goals)?;
        Ok(Prioritized {
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

/// Table reserving every committed higher-priority path.
fn reservation_table(committed: &[Path]) -> ConstraintTable {
    let mut constraints = ConstraintTable::new();
    committed
        .iter()
        .for_each(|path| constraints.reserve_path(path));
    constraints
}

impl Solver for Prioritized<'_> {
    fn find_solution(&mut self) -> Result<Solution> {
        let total_solve_start_time = Instant::now();
        let result = self.plan_all(total_solve_start_time);
        self.stats.time_us = total_solve_start_time.elapsed().as_micros() as usize;
        self.stats.print("prioritized");
        result
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }
}

impl Prioritized<'_> {
    fn plan_all(&mut self, total_solve_start_time: Instant) -> Result<Solution> {
        let mut paths: Vec<Path> = Vec::with_capacity(self.agents.len());

        for agent in &self.agents {
            self.limits.check(paths.len(), total_solve_start_time)?;
            let constraints = reservation_table(&paths);
            let path = a_star_search(
                self.map,
                agent,
                &self.heuristics[agent.id],
                &constraints,
                self.limits.horizon,
                &mut self.stats,
            )?;
            debug!("agent {} committed: {path:?}", agent.id);
            paths.push(path);
        }

        let solution = Solution { paths };
        self.stats.costs = solution.cost();
        Ok(solution)
    }
}
