//! Fixed-ladder review scheduling.
//!
//! An exercise climbs one stage per review. The interval until it is due
//! again depends only on the stage it lands on:
//!
//! | stage | meaning          | interval |
//! |-------|------------------|----------|
//! | 0     | never reviewed   | 1 day    |
//! | 1     | first review     | 3 days   |
//! | 2     | second review    | 7 days   |
//! | ≥ 3   | pool             | 30 days  |
//!
//! Stage 0's interval is the "first exposure" gap between solving an
//! exercise and its first review. Stages above the pool collapse onto it, so
//! a pooled exercise keeps coming back every 30 days for as long as it is
//! reviewed.

use chrono::{DateTime, Duration, Utc};

/// First stage considered "pool" (graduated).
pub const POOL_STAGE: u32 = 3;

/// Days until an exercise at `stage` is due again.
pub fn interval_days(stage: u32) -> i64 {
    match stage {
        0 => 1,
        1 => 3,
        2 => 7,
        _ => 30,
    }
}

/// Whether `stage` belongs to the pool band.
pub fn is_pooled(stage: u32) -> bool {
    stage >= POOL_STAGE
}

/// Due date of a freshly created exercise.
pub fn first_review_date(resolve_date: DateTime<Utc>) -> DateTime<Utc> {
    resolve_date + Duration::days(interval_days(0))
}

/// Scheduling fields written by a single review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewOutcome {
    pub review_stage: u32,
    pub review_count: u32,
    pub next_review_date: DateTime<Utc>,
    pub last_reviewed_at: DateTime<Utc>,
}

/// Advance an exercise at (`stage`, `count`) by one review performed at `now`.
pub fn advance(stage: u32, count: u32, now: DateTime<Utc>) -> ReviewOutcome {
    let review_stage = stage.saturating_add(1).min(POOL_STAGE);

    ReviewOutcome {
        review_stage,
        review_count: count.saturating_add(1),
        next_review_date: now + Duration::days(interval_days(review_stage)),
        last_reviewed_at: now,
    }
}
