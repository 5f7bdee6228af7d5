use std::cmp::Ordering;

#[derive(Clone, Eq, Debug, PartialEq, Hash)]
pub(crate) struct LowLevelOpenNode {
    pub(crate) position: (usize, usize),
    pub(crate) f_open_cost: usize,
    pub(crate) h_open_cost: usize,
    pub(crate) g_cost: usize,
    // Time step used for duplicate detection, folded once constraints run out.
    pub(crate) time_step: usize,
    pub(crate) order: usize,
}

// Lowest f first, then lowest h, then first inserted.
impl Ord for LowLevelOpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f_open_cost
            .cmp(&other.f_open_cost)
            .then_with(|| self.h_open_cost.cmp(&other.h_open_cost))
            .then_with(|| self.order.cmp(&other.order))
    }
}

impl PartialOrd for LowLevelOpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
