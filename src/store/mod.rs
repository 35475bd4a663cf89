//! Persistence seam for exercises.
//!
//! The service layer only talks to an [`ExerciseStore`], which is passed in
//! explicitly. [`crate::db::Database`] is the SQLite implementation;
//! [`MemoryStore`] keeps everything in a map and serves as a test double.
//!
//! Missing rows are reported as `Ok(None)` / `Ok(false)`. Errors are
//! reserved for storage failures.

mod memory;

pub use memory::MemoryStore;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::models::{Exercise, ExerciseDetails, NewExercise, Stats};
use crate::query::{Filter, PageWindow, Snapshot};

pub trait ExerciseStore: Send + Sync {
    /// Insert a new exercise at stage 0 and return its id. Ids are never
    /// reused, even after deletion.
    fn insert(&self, exercise: NewExercise) -> Result<i64>;

    fn find_by_id(&self, id: i64) -> Result<Option<Exercise>>;

    /// Overwrite the descriptive fields of `id`. Scheduling fields and
    /// `created_at` are left untouched. Returns `false` if `id` is unknown.
    fn update_details(&self, id: i64, details: &ExerciseDetails) -> Result<bool>;

    fn delete(&self, id: i64) -> Result<bool>;

    /// One page of exercises matching `filter`, in the filter's order, plus
    /// the number of matches across all pages.
    fn query(&self, filter: &Filter, window: PageWindow) -> Result<(Vec<Exercise>, u64)>;

    /// Dashboard counts at `snapshot`.
    fn aggregate(&self, snapshot: &Snapshot) -> Result<Stats>;

    /// Apply one [`crate::scheduler::advance`] step to `id` as of `now`.
    ///
    /// The read of the current stage and the write of the outcome happen as
    /// one atomic unit. Returns the updated exercise, or `None` if `id` is
    /// unknown.
    fn record_review(&self, id: i64, now: DateTime<Utc>) -> Result<Option<Exercise>>;
}
