//! Domain models for albook.
//!
//! - [`Exercise`]: the only persisted entity, a solved exercise with its
//!   review schedule.
//! - [`ExercisePage`]: a paginated slice of a filtered view.
//! - [`Stats`]: dashboard counts over the whole record set.

mod exercise;
mod listing;

pub use exercise::*;
pub use listing::*;
