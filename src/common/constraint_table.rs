use super::{Constraint, ConstraintType, Path};

use std::collections::{HashMap, HashSet};

/// Per-agent lookup of forbidden cells and transitions.
#[derive(Debug, Clone, Default)]
pub struct ConstraintTable {
    vertex: HashMap<usize, HashSet<(usize, usize)>>,
    edge: HashSet<((usize, usize), (usize, usize), usize)>,
    permanent: HashMap<(usize, usize), usize>,
    // Latest timestep at which any constraint applies.
    limit_time_step: usize,
}

impl ConstraintTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table holding the constraints addressed to `agent`.
    pub fn for_agent<'a, I>(agent: usize, constraints: I) -> Self
    where
        I: IntoIterator<Item = &'a Constraint>,
    {
        let mut table = Self::new();
        constraints
            .into_iter()
            .filter(|constraint| constraint.agent == agent)
            .for_each(|constraint| table.insert(&constraint.constraint_type));
        table
    }

    pub fn insert(&mut self, constraint: &ConstraintType) {
        match *constraint {
            ConstraintType::Vertex {
                position,
                time_step,
                is_permanent: false,
            } => {
                self.vertex.entry(time_step).or_default().insert(position);
                self.limit_time_step = self.limit_time_step.max(time_step);
            }
            ConstraintType::Vertex {
                position,
                time_step,
                is_permanent: true,
            } => {
                let from = self.permanent.entry(position).or_insert(time_step);
                *from = (*from).min(time_step);
                self.limit_time_step = self.limit_time_step.max(time_step);
            }
            ConstraintType::Edge {
                from_position,
                to_position,
                to_time_step,
            } => {
                self.edge.insert((from_position, to_position, to_time_step));
                self.limit_time_step = self.limit_time_step.max(to_time_step);
            }
        }
    }

    /// Reserves the cells and moves of a committed path. Its last cell stays
    /// reserved forever from the arrival time on.
    pub fn reserve_path(&mut self, path: &Path) {
        let Some(&goal) = path.last() else {
            return;
        };
        let arrival = path.len() - 1;

        for (time_step, &position) in path.iter().enumerate().take(arrival) {
            self.insert(&ConstraintType::Vertex {
                position,
                time_step,
                is_permanent: false,
            });
        }
        for (time_step, step) in path.windows(2).enumerate() {
            // A swap with the committed agent means moving against its step.
            self.insert(&ConstraintType::Edge {
                from_position: step[1],
                to_position: step[0],
                to_time_step: time_step + 1,
            });
        }
        self.insert(&ConstraintType::Vertex {
            position: goal,
            time_step: arrival,
            is_permanent: true,
        });
    }

    pub fn is_vertex_constrained(&self, position: (usize, usize), time_step: usize) -> bool {
        if self
            .permanent
            .get(&position)
            .is_some_and(|&from| time_step >= from)
        {
            return true;
        }
        self.vertex
            .get(&time_step)
            .is_some_and(|cells| cells.contains(&position))
    }

    pub fn is_edge_constrained(
        &self,
        from_position: (usize, usize),
        to_position: (usize, usize),
        to_time_step: usize,
    ) -> bool {
        self.edge
            .contains(&(from_position, to_position, to_time_step))
    }

    /// Whether moving `from_position -> to_position`, arriving at
    /// `to_time_step`, breaks any constraint.
    pub fn is_violated(
        &self,
        from_position: (usize, usize),
        to_position: (usize, usize),
        to_time_step: usize,
    ) -> bool {
        self.is_vertex_constrained(to_position, to_time_step)
            || self.is_edge_constrained(from_position, to_position, to_time_step)
    }

    /// An agent reaching `goal` at `time_step` may stop there only if nothing
    /// forbids the cell afterwards.
    pub fn can_stay_forever(&self, goal: (usize, usize), time_step: usize) -> bool {
        if self.permanent.contains_key(&goal) {
            return false;
        }
        !self
            .vertex
            .iter()
            .any(|(&t, cells)| t > time_step && cells.contains(&goal))
    }

    pub fn limit_time_step(&self) -> usize {
        self.limit_time_step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_agent_filters_constraints() {
        let constraints = [
            Constraint {
                agent: 0,
                constraint_type: ConstraintType::Vertex {
                    position: (1, 1),
                    time_step: 2,
                    is_permanent: false,
                },
            },
            Constraint {
                agent: 1,
                constraint_type: ConstraintType::Vertex {
                    position: (2, 2),
                    time_step: 5,
                    is_permanent: false,
                },
            },
        ];
        let table = ConstraintTable::for_agent(0, &constraints);

        assert!(table.is_vertex_constrained((1, 1), 2));
        assert!(!table.is_vertex_constrained((1, 1), 3));
        assert!(!table.is_vertex_constrained((2, 2), 5));
        assert_eq!(table.limit_time_step(), 2);
    }

    #[test]
    fn test_edge_is_directed() {
        let mut table = ConstraintTable::new();
        table.insert(&ConstraintType::Edge {
            from_position: (0, 0),
            to_position: (0, 1),
            to_time_step: 1,
        });

        assert!(table.is_violated((0, 0), (0, 1), 1));
        assert!(!table.is_violated((0, 1), (0, 0), 1));
        assert!(!table.is_violated((0, 0), (0, 1), 2));
    }

    #[test]
    fn test_reserve_path() {
        let mut table = ConstraintTable::new();
        table.reserve_path(&vec![(0, 0), (0, 1), (0, 2)]);

        assert!(table.is_vertex_constrained((0, 1), 1));
        assert!(!table.is_vertex_constrained((0, 1), 2));
        // Goal held from arrival on.
        assert!(!table.is_vertex_constrained((0, 2), 1));
        assert!(table.is_vertex_constrained((0, 2), 2));
        assert!(table.is_vertex_constrained((0, 2), 100));
        // Swapping against the committed move.
        assert!(table.is_edge_constrained((0, 1), (0, 0), 1));
        assert!(table.is_edge_constrained((0, 2), (0, 1), 2));
        assert_eq!(table.limit_time_step(), 2);
    }

    #[test]
    fn test_can_stay_forever() {
        let mut table = ConstraintTable::new();
        table.insert(&ConstraintType::Vertex {
            position: (2, 2),
            time_step: 6,
            is_permanent: false,
        });

        assert!(!table.can_stay_forever((2, 2), 4));
        assert!(table.can_stay_forever((2, 2), 6));
        assert!(table.can_stay_forever((1, 2), 0));

        table.reserve_path(&vec![(1, 1), (1, 2)]);
        assert!(!table.can_stay_forever((1, 2), 10));
    }
}
