use serde::{Deserialize, Serialize};

use super::Exercise;

/// One page of a filtered exercise list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExercisePage {
    pub data: Vec<Exercise>,
    /// Number of exercises matching the filter across all pages.
    pub total: u64,
    /// 1-indexed page number that was requested.
    pub page: u32,
    /// Always at least 1, even when nothing matches.
    pub total_pages: u64,
}

/// Dashboard counts.
///
/// `pending_count`, `pool_count` and `reviewed_today_count` use the same
/// predicates as the corresponding list views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total_count: u64,
    pub pending_count: u64,
    pub pool_count: u64,
    pub reviewed_today_count: u64,
    /// Exercises whose `resolve_date` falls on today's local date.
    pub solved_today_count: u64,
}
