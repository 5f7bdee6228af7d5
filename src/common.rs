mod constraint_table;
mod highlevel;
mod lowlevel;
mod tree;

pub use constraint_table::ConstraintTable;
pub use highlevel::{detect_conflicts, Conflict, ConflictType, Constraint, ConstraintType};
pub(crate) use lowlevel::LowLevelOpenNode;
pub(crate) use tree::{ConstraintTree, HighLevelOpenNode};

use crate::map::Map;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Sequence of cells, one per timestep, starting at the agent's start.
pub type Path = Vec<(usize, usize)>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Agent {
    pub id: usize,
    pub start: (usize, usize),
    pub goal: (usize, usize),
}

impl Agent {
    /// Start and goal are both in bounds and obstacle free.
    pub fn verify(&self, map: &Map) -> bool {
        map.is_free(self.start) && map.is_free(self.goal)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    pub paths: Vec<Path>,
}

impl Solution {
    pub fn cost(&self) -> usize {
        sum_of_cost(&self.paths)
    }

    /// Checks endpoints, step validity and obstacles for every path, and
    /// that no two agents collide, goals being held after arrival.
    pub fn verify(&self, map: &Map, agents: &[Agent]) -> bool {
        if self.paths.len() != agents.len() {
            debug!(
                "solution has {} paths for {} agents",
                self.paths.len(),
                agents.len()
            );
            return false;
        }

        for (agent, path) in agents.iter().zip(&self.paths) {
            if !is_valid_path(map, agent, path) {
                debug!("agent {} has an invalid path {path:?}", agent.id);
                return false;
            }
        }

        let conflicts = detect_conflicts(&self.paths);
        if !conflicts.is_empty() {
            debug!("solution contains conflicts: {conflicts:?}");
            return false;
        }

        true
    }
}

/// Total number of moves across all agents: Σ(len(path) - 1).
pub fn sum_of_cost(paths: &[Path]) -> usize {
    paths.iter().map(|path| path.len().saturating_sub(1)).sum()
}

/// Endpoint, obstacle and step-continuity check for a single path.
pub fn is_valid_path(map: &Map, agent: &Agent, path: &[(usize, usize)]) -> bool {
    let (Some(first), Some(last)) = (path.first(), path.last()) else {
        return false;
    };
    if *first != agent.start || *last != agent.goal {
        return false;
    }
    if path.iter().any(|position| !map.is_free(*position)) {
        return false;
    }
    path.windows(2).all(|step| {
        let (from, to) = (step[0], step[1]);
        from.0.abs_diff(to.0) + from.1.abs_diff(to.1) <= 1
    })
}

/// Position of an agent at `time_step`, holding its goal after arrival.
pub(crate) fn position_at(path: &[(usize, usize)], time_step: usize) -> (usize, usize) {
    path.get(time_step)
        .or_else(|| path.last())
        .copied()
        .unwrap_or_default()
}
