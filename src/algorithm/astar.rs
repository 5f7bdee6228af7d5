use super::construct_path;
use crate::common::{Agent, ConstraintTable, LowLevelOpenNode, Path};
use crate::error::{Result, SolveError};
use crate::map::Map;
use crate::stat::Stats;

use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, instrument, trace};

/// Space-time A* for a single agent.
///
/// Returns a shortest path from `agent.start` to `agent.goal` that respects
/// `constraints` and, if given, arrives no later than `horizon`. The agent is
/// only allowed to finish at its goal once no later constraint forbids the
/// goal cell.
#[instrument(skip_all, name="a_star", fields(agent = agent.id, start = format!("{:?}", agent.start), goal = format!("{:?}", agent.goal)), level = "debug")]
pub fn a_star_search(
    map: &Map,
    agent: &Agent,
    heuristic: &[Vec<usize>],
    constraints: &ConstraintTable,
    horizon: Option<usize>,
    stats: &mut Stats,
) -> Result<Path> {
    stats.low_level_searches += 1;

    let start_h_open_cost = heuristic[agent.start.0][agent.start.1];
    if start_h_open_cost == usize::MAX {
        debug!("goal unreachable from start");
        return Err(SolveError::NoPathFound { agent: agent.id });
    }

    // Past the last constrained time step every layer looks the same, so
    // time steps are folded onto a single layer and the search stays finite.
    let constraint_limit_time_step = constraints.limit_time_step();
    let fold_time_step = |time_step: usize| time_step.min(constraint_limit_time_step + 1);

    let mut open_list = BTreeSet::new();
    let mut closed_list = HashSet::new();
    let mut g_cost_map = HashMap::new();
    let mut trace = HashMap::new();
    let mut order = 0;

    open_list.insert(LowLevelOpenNode {
        position: agent.start,
        f_open_cost: start_h_open_cost,
        h_open_cost: start_h_open_cost,
        g_cost: 0,
        time_step: 0,
        order,
    });
    g_cost_map.insert((agent.start, 0), 0);

    while let Some(current) = open_list.pop_first() {
        // Stale entry for a state that was already expanded with a lower g.
        if !closed_list.insert((current.position, current.time_step)) {
            continue;
        }
        trace!("expand node: {current:?}");
        stats.low_level_expand_nodes += 1;

        if current.position == agent.goal
            && constraints.can_stay_forever(agent.goal, current.g_cost)
        {
            return Ok(construct_path(
                &trace,
                (current.position, current.g_cost),
            ));
        }

        // Assuming uniform cost, which also indicates the current time.
        let tentative_g_cost = current.g_cost + 1;
        if horizon.is_some_and(|horizon| tentative_g_cost > horizon) {
            continue;
        }
        let tentative_time_step = fold_time_step(tentative_g_cost);

        for &neighbor in map.neighbors(current.position) {
            if closed_list.contains(&(neighbor, tentative_time_step)) {
                continue;
            }

            if constraints.is_violated(current.position, neighbor, tentative_g_cost) {
                continue; // This move is prohibited due to a constraint.
            }

            let h_open_cost = heuristic[neighbor.0][neighbor.1];
            if h_open_cost == usize::MAX {
                continue;
            }

            let old_g_cost = *g_cost_map
                .get(&(neighbor, tentative_time_step))
                .unwrap_or(&usize::MAX);
            if tentative_g_cost < old_g_cost {
                g_cost_map.insert((neighbor, tentative_time_step), tentative_g_cost);
                trace.insert(
                    (neighbor, tentative_g_cost),
                    (current.position, current.g_cost),
                );
                order += 1;
                open_list.insert(LowLevelOpenNode {
                    position: neighbor,
                    f_open_cost: tentative_g_cost + h_open_cost,
                    h_open_cost,
                    g_cost: tentative_g_cost,
                    time_step: tentative_time_step,
                    order,
                });
            }
        }
    }

    debug!("cannot find solution");
    Err(SolveError::NoPathFound { agent: agent.id })
}
