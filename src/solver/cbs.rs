use super::{build_agents, build_heuristics, SearchLimits, Solver};
use crate::algorithm::a_star_search;
use crate::common::{Agent, ConstraintTable, ConstraintTree, HighLevelOpenNode, Solution};
use crate::error::{Result, SolveError};
use crate::map::Map;
use crate::stat::Stats;

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Conflict-Based Search: best-first search over a constraint tree,
/// returning a conflict-free solution of minimum sum-of-cost.
pub struct CBS<'a> {
    agents: Vec<Agent>,
    map: &'a Map,
    heuristics: Vec<Vec<Vec<usize>>>,
    limits: SearchLimits,
    stats: Stats,
}

impl<'a> CBS<'a> {
    pub fn new(
        map: &'a Map,
        starts: &[(usize, usize)],
        goals: &[(usize, usize)],
    ) -> Result<Self> {
        let agents = build_agents(map, starts, goals)?;
        Ok(CBS {
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

    /// Two agents can never both hold the same goal forever.
    fn shared_goal(&self) -> Option<(usize, usize)> {
        let mut goals = HashMap::new();
        self.agents.iter().find_map(|agent| {
            goals
                .insert(agent.goal, agent.id)
                .map(|other| (other, agent.id))
        })
    }

    fn root(&mut self) -> Result<HighLevelOpenNode> {
        let constraints = ConstraintTable::new();
        let mut paths = Vec::with_capacity(self.agents.len());

        for agent in &self.agents {
            let path = a_star_search(
                self.map,
                agent,
                &self.heuristics[agent.id],
                &constraints,
                self.limits.horizon,
                &mut self.stats,
            )?;
            paths.push(Arc::new(path));
        }

        Ok(HighLevelOpenNode::new(None, paths, 0))
    }
}

impl Solver for CBS<'_> {
    fn find_solution(&mut self) -> Result<Solution> {
        let total_solve_start_time = Instant::now();
        let result = self.search(total_solve_start_time);
        self.stats.time_us = total_solve_start_time.elapsed().as_micros() as usize;
        self.stats.print("cbs");
        result
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }
}

impl CBS<'_> {
    fn search(&mut self, total_solve_start_time: Instant) -> Result<Solution> {
        if let Some((agent_1, agent_2)) = self.shared_goal() {
            debug!("agents {agent_1} and {agent_2} share a goal");
            return Err(SolveError::Infeasible);
        }

        let root = match self.root() {
            Ok(root) => root,
            Err(SolveError::NoPathFound { agent }) => {
                debug!("agent {agent} has no path even without constraints");
                return Err(SolveError::Infeasible);
            }
            Err(err) => return Err(err),
        };

        let mut tree = ConstraintTree::default();
        let mut open = BTreeSet::new();
        let mut order = 0;
        open.insert(root);

        while let Some(current_node) = open.pop_first() {
            let Some(conflict) = current_node.first_conflict else {
                // No conflicts, return solution.
                self.stats.costs = current_node.cost;
                debug!("constraint tree size: {}", tree.len());

                return Ok(Solution {
                    paths: current_node
                        .paths
                        .iter()
                        .map(|path| path.as_ref().clone())
                        .collect(),
                });
            };

            self.limits
                .check(self.stats.high_level_expand_nodes, total_solve_start_time)?;
            self.stats.high_level_expand_nodes += 1;
            debug!(
                "expand node cost {} with {} conflicts, first: {conflict:?}",
                current_node.cost, current_node.conflicts
            );

            for resolve_first in [true, false] {
                let constraint = conflict.constraint_for(resolve_first);
                let agent = &self.agents[constraint.agent];

                let mut constraints = tree.constraint_table(current_node.tree_index, agent.id);
                constraints.insert(&constraint.constraint_type);

                let new_path = match a_star_search(
                    self.map,
                    agent,
                    &self.heuristics[agent.id],
                    &constraints,
                    self.limits.horizon,
                    &mut self.stats,
                ) {
                    Ok(new_path) => new_path,
                    Err(SolveError::NoPathFound { .. }) => {
                        debug!("prune child with {constraint}");
                        continue;
                    }
                    Err(err) => return Err(err),
                };
                debug!("update agent {} with path {new_path:?} for {constraint}", agent.id);

                let tree_index = tree.push(current_node.tree_index, constraint);
                let mut new_paths = current_node.paths.clone();
                new_paths[agent.id] = Arc::new(new_path);

                order += 1;
                open.insert(HighLevelOpenNode::new(Some(tree_index), new_paths, order));
            }
        }

        debug!("constraint tree exhausted after {} nodes", tree.len());
        Err(SolveError::Infeasible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::detect_conflicts;
    use std::time::Duration;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();
    }

    #[test]
    fn test_cbs_head_on_swap() {
        init_tracing();
        let map = Map::from_rows(&["...", "...", "..."]);
        let mut solver = CBS::new(&map, &[(0, 0), (0, 2)], &[(0, 2), (0, 0)]).unwrap();
        let solution = solver.find_solution().unwrap();

        assert!(solution.verify(&map, &solver.agents));
        assert!(detect_conflicts(&solution.paths).is_empty());
        assert_eq!(solution.cost(), 6);
        assert!(solver.stats().high_level_expand_nodes > 0);
    }

    #[test]
    fn test_cbs_without_conflicts_expands_nothing() {
        let map = Map::from_rows(&["...", "...", "..."]);
        let mut solver = CBS::new(&map, &[(0, 0), (2, 0)], &[(0, 2), (2, 2)]).unwrap();
        let solution = solver.find_solution().unwrap();

        assert_eq!(solution.cost(), 4);
        assert_eq!(solver.stats().high_level_expand_nodes, 0);
        assert_eq!(solver.stats().low_level_searches, 2);
    }

    #[test]
    fn test_cbs_goal_blocking() {
        init_tracing();
        // Agent 0 parks on (0, 1); agent 1 must cross it first.
        let map = Map::from_rows(&["...", "@.@"]);
        let mut solver = CBS::new(&map, &[(0, 0), (0, 2)], &[(0, 1), (1, 1)]).unwrap();
        let solution = solver.find_solution().unwrap();

        assert!(solution.verify(&map, &solver.agents));
        // Agent 0 waits one step for agent 1 to pass through its goal.
        assert_eq!(solution.paths[0], vec![(0, 0), (0, 0), (0, 1)]);
        assert_eq!(solution.paths[1], vec![(0, 2), (0, 1), (1, 1)]);
        assert_eq!(solution.cost(), 4);
    }

    #[test]
    fn test_cbs_shared_goal_is_infeasible() {
        let map = Map::from_rows(&["...", "...", "..."]);
        let mut solver = CBS::new(&map, &[(0, 0), (2, 2)], &[(1, 1), (1, 1)]).unwrap();
        assert_eq!(solver.find_solution(), Err(SolveError::Infeasible));
        assert_eq!(solver.stats().high_level_expand_nodes, 0);
    }

    #[test]
    fn test_cbs_unreachable_goal_is_infeasible() {
        let map = Map::from_rows(&[".@."]);
        let mut solver = CBS::new(&map, &[(0, 0)], &[(0, 2)]).unwrap();
        assert_eq!(solver.find_solution(), Err(SolveError::Infeasible));
    }

    #[test]
    fn test_cbs_corridor_swap_is_infeasible_within_horizon() {
        init_tracing();
        let map = Map::from_rows(&[".."]);
        let limits = SearchLimits {
            horizon: Some(3),
            ..Default::default()
        };
        let mut solver = CBS::new(&map, &[(0, 0), (0, 1)], &[(0, 1), (0, 0)])
            .unwrap()
            .with_limits(limits);
        assert_eq!(solver.find_solution(), Err(SolveError::Infeasible));
    }

    #[test]
    fn test_cbs_budget_exceeded() {
        let map = Map::from_rows(&[".."]);
        let limits = SearchLimits {
            max_expansions: Some(20),
            ..Default::default()
        };
        let mut solver = CBS::new(&map, &[(0, 0), (0, 1)], &[(0, 1), (0, 0)])
            .unwrap()
            .with_limits(limits);
        assert!(matches!(
            solver.find_solution(),
            Err(SolveError::BudgetExceeded { expanded: 20, .. })
        ));
        assert_eq!(solver.stats().high_level_expand_nodes, 20);
    }

    #[test]
    fn test_cbs_time_budget_exceeded() {
        let map = Map::from_rows(&[".."]);
        let limits = SearchLimits {
            time_limit: Some(Duration::from_millis(50)),
            ..Default::default()
        };
        let mut solver = CBS::new(&map, &[(0, 0), (0, 1)], &[(0, 1), (0, 0)])
            .unwrap()
            .with_limits(limits);
        assert!(matches!(
            solver.find_solution(),
            Err(SolveError::BudgetExceeded { .. })
        ));
        // Elapsed time is recorded even though the solve failed.
        assert!(solver.stats().time_us >= 50_000);
        assert_eq!(solver.stats().costs, 0);
    }

    #[test]
    fn test_cbs_is_deterministic() {
        let map = Map::from_rows(&["....", ".@..", "....", "..@."]);
        let starts = [(0, 0), (0, 3), (3, 0), (2, 3)];
        let goals = [(3, 3), (3, 0), (0, 3), (0, 0)];

        let first = CBS::new(&map, &starts, &goals)
            .unwrap()
            .find_solution()
            .unwrap();
        for _ in 0..3 {
            let again = CBS::new(&map, &starts, &goals)
                .unwrap()
                .find_solution()
                .unwrap();
            assert_eq!(again, first);
        }
    }
}
