use std::time::Duration;

use thiserror::Error;

/// Failure kinds reported by the solvers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveError {
    /// The low-level search exhausted every reachable state under the
    /// current constraints.
    #[error("no path found for agent {agent}")]
    NoPathFound { agent: usize },

    /// The constraint tree was exhausted without a conflict-free node.
    #[error("instance is infeasible")]
    Infeasible,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A caller-imposed limit stopped the search. This says nothing about
    /// whether a solution exists.
    #[error("search budget exceeded after {expanded} expansions ({elapsed:?})")]
    BudgetExceeded { expanded: usize, elapsed: Duration },
}

pub type Result<T> = std::result::Result<T, SolveError>;
