mod astar;

pub use astar::a_star_search;

use std::collections::HashMap;

use crate::common::Path;

type Trace = HashMap<((usize, usize), usize), ((usize, usize), usize)>;

fn construct_path(trace: &Trace, mut current: ((usize, usize), usize)) -> Path {
    let mut path = vec![current.0];
    while let Some(&(pos, time)) = trace.get(&current) {
        path.push(pos);
        current = (pos, time);
    }
    path.reverse();
    path
}
