use super::{detect_conflicts, Conflict, Constraint, ConstraintTable, Path};

use std::cmp::Ordering;
use std::iter;
use std::sync::Arc;

/// Append-only arena of constraint tree nodes. A node holds the single
/// constraint it adds and a link to its parent; the root is implicit and
/// carries no constraint.
#[derive(Debug, Default)]
pub(crate) struct ConstraintTree {
    nodes: Vec<ConstraintTreeNode>,
}

#[derive(Debug, Clone)]
struct ConstraintTreeNode {
    parent: Option<usize>,
    constraint: Constraint,
}

impl ConstraintTree {
    pub(crate) fn push(&mut self, parent: Option<usize>, constraint: Constraint) -> usize {
        self.nodes.push(ConstraintTreeNode { parent, constraint });
        self.nodes.len() - 1
    }

    /// Constraints on the path from `index` up to the root.
    pub(crate) fn constraints(&self, index: Option<usize>) -> impl Iterator<Item = &Constraint> {
        iter::successors(index, |&i| self.nodes[i].parent).map(|i| &self.nodes[i].constraint)
    }

    pub(crate) fn constraint_table(&self, index: Option<usize>, agent: usize) -> ConstraintTable {
        ConstraintTable::for_agent(agent, self.constraints(index))
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }
}

/// Frontier entry: the paths and cost produced under a constraint tree node.
/// Paths are shared with siblings and ancestors, only the replanned agent's
/// path is new.
#[derive(Debug, Clone)]
pub(crate) struct HighLevelOpenNode {
    pub(crate) tree_index: Option<usize>,
    pub(crate) paths: Vec<Arc<Path>>,
    pub(crate) cost: usize,
    pub(crate) conflicts: usize,
    pub(crate) first_conflict: Option<Conflict>,
    pub(crate) order: usize,
}

impl HighLevelOpenNode {
    pub(crate) fn new(tree_index: Option<usize>, paths: Vec<Arc<Path>>, order: usize) -> Self {
        let conflicts = detect_conflicts(&paths);
        let cost = paths.iter().map(|path| path.len() - 1).sum();

        HighLevelOpenNode {
            tree_index,
            cost,
            conflicts: conflicts.len(),
            first_conflict: conflicts.first().copied(),
            paths,
            order,
        }
    }

    fn key(&self) -> (usize, usize, usize) {
        (self.cost, self.conflicts, self.order)
    }
}

impl PartialEq for HighLevelOpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for HighLevelOpenNode {}

// Cheapest first, then fewest conflicts, then first inserted.
impl Ord for HighLevelOpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl PartialOrd for HighLevelOpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
