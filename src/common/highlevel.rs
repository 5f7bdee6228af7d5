use super::{position_at, Path};

use std::borrow::Borrow;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConflictType {
    Vertex {
        position: (usize, usize),
        time_step: usize,
    },
    /// `agent_1` moved `u -> v` while `agent_2` moved `v -> u`, both arriving
    /// at `time_step`.
    Edge {
        u: (usize, usize),
        v: (usize, usize),
        time_step: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Conflict {
    pub agent_1: usize,
    pub agent_2: usize,
    pub conflict_type: ConflictType,
}

impl Conflict {
    /// The constraint that resolves this conflict by restricting one side.
    pub fn constraint_for(&self, resolve_first: bool) -> Constraint {
        let agent = if resolve_first {
            self.agent_1
        } else {
            self.agent_2
        };

        let constraint_type = match self.conflict_type {
            ConflictType::Vertex {
                position,
                time_step,
            } => ConstraintType::Vertex {
                position,
                time_step,
                is_permanent: false,
            },
            ConflictType::Edge { u, v, time_step } => {
                let (from_position, to_position) = if resolve_first { (u, v) } else { (v, u) };
                ConstraintType::Edge {
                    from_position,
                    to_position,
                    to_time_step: time_step,
                }
            }
        };

        Constraint {
            agent,
            constraint_type,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConstraintType {
    /// Forbids occupying `position` at `time_step`, or at any time from
    /// `time_step` on when `is_permanent`.
    Vertex {
        position: (usize, usize),
        time_step: usize,
        is_permanent: bool,
    },
    /// Forbids moving `from_position -> to_position` arriving at `to_time_step`.
    Edge {
        from_position: (usize, usize),
        to_position: (usize, usize),
        to_time_step: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Constraint {
    pub agent: usize,
    pub constraint_type: ConstraintType,
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.constraint_type {
            ConstraintType::Vertex {
                position,
                time_step,
                is_permanent,
            } => write!(
                f,
                "agent {} not at {position:?} at t={time_step}{}",
                self.agent,
                if is_permanent { "+" } else { "" }
            ),
            ConstraintType::Edge {
                from_position,
                to_position,
                to_time_step,
            } => write!(
                f,
                "agent {} not {from_position:?}->{to_position:?} at t={to_time_step}",
                self.agent
            ),
        }
    }
}

/// Every conflict between every pair of paths, ordered by agent pair then
/// timestep, vertex before edge. Agents hold their goal once their path ends.
pub fn detect_conflicts<P: Borrow<Path>>(paths: &[P]) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    for i in 0..paths.len() {
        for j in (i + 1)..paths.len() {
            let path1: &Path = paths[i].borrow();
            let path2: &Path = paths[j].borrow();
            let max_length = path1.len().max(path2.len());

            for step in 0..max_length {
                let pos1 = position_at(path1, step);
                let pos2 = position_at(path2, step);

                if pos1 == pos2 {
                    conflicts.push(Conflict {
                        agent_1: i,
                        agent_2: j,
                        conflict_type: ConflictType::Vertex {
                            position: pos1,
                            time_step: step,
                        },
                    });
                    continue;
                }

                // Edge conflicts need a previous step.
                if step == 0 {
                    continue;
                }
                let prev_pos1 = position_at(path1, step - 1);
                let prev_pos2 = position_at(path2, step - 1);

                if prev_pos1 == pos2 && prev_pos2 == pos1 {
                    conflicts.push(Conflict {
                        agent_1: i,
                        agent_2: j,
                        conflict_type: ConflictType::Edge {
                            u: prev_pos1,
                            v: pos1,
                            time_step: step,
                        },
                    });
                }
            }
        }
    }

    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_conflicts() {
        let paths: Vec<Path> = vec![vec![(0, 0), (0, 1), (0, 2)], vec![(2, 0), (2, 1), (2, 2)]];
        assert!(detect_conflicts(&paths).is_empty());
    }

    #[test]
    fn test_vertex_conflict() {
        let paths: Vec<Path> = vec![vec![(0, 0), (0, 1), (0, 2)], vec![(1, 1), (0, 1), (1, 1)]];
        let conflicts = detect_conflicts(&paths);
        assert_eq!(
            conflicts,
            vec![Conflict {
                agent_1: 0,
                agent_2: 1,
                conflict_type: ConflictType::Vertex {
                    position: (0, 1),
                    time_step: 1,
                },
            }]
        );
    }

    #[test]
    fn test_edge_conflict() {
        let paths: Vec<Path> = vec![vec![(0, 0), (0, 1), (0, 2)], vec![(0, 3), (0, 2), (0, 1)]];
        let conflicts = detect_conflicts(&paths);
        assert_eq!(
            conflicts.first(),
            Some(&Conflict {
                agent_1: 0,
                agent_2: 1,
                conflict_type: ConflictType::Edge {
                    u: (0, 1),
                    v: (0, 2),
                    time_step: 2,
                },
            })
        );
    }

    #[test]
    fn test_goal_is_held_after_arrival() {
        // Agent 0 arrives at (0, 1) at t=1; agent 1 passes it at t=2.
        let paths: Vec<Path> = vec![vec![(0, 0), (0, 1)], vec![(1, 2), (0, 2), (0, 1), (0, 0)]];
        let conflicts = detect_conflicts(&paths);
        assert_eq!(
            conflicts,
            vec![Conflict {
                agent_1: 0,
                agent_2: 1,
                conflict_type: ConflictType::Vertex {
                    position: (0, 1),
                    time_step: 2,
                },
            }]
        );
    }

    #[test]
    fn test_constraint_for_edge() {
        let conflict = Conflict {
            agent_1: 3,
            agent_2: 5,
            conflict_type: ConflictType::Edge {
                u: (0, 1),
                v: (0, 2),
                time_step: 4,
            },
        };
        assert_eq!(
            conflict.constraint_for(true),
            Constraint {
                agent: 3,
                constraint_type: ConstraintType::Edge {
                    from_position: (0, 1),
                    to_position: (0, 2),
                    to_time_step: 4,
                },
            }
        );
        assert_eq!(
            conflict.constraint_for(false),
            Constraint {
                agent: 5,
                constraint_type: ConstraintType::Edge {
                    from_position: (0, 2),
                    to_position: (0, 1),
                    to_time_step: 4,
                },
            }
        );
    }
}
