use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub costs: usize,
    pub time_us: usize,
    pub low_level_expand_nodes: usize,
    pub high_level_expand_nodes: usize,
    pub low_level_searches: usize,
}

impl Stats {
    pub fn print(&self, solver: &str) {
        info!(
            "[{solver}] Cost {:?} Time(microseconds) {:?} High level expand nodes number: {:?} Low level expand nodes number {:?} Low level searches {:?}",
            self.costs,
            self.time_us,
            self.high_level_expand_nodes,
            self.low_level_expand_nodes,
            self.low_level_searches
        );
    }
}
