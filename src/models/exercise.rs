use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A solved exercise tracked for spaced-repetition review.
///
/// Descriptive fields (`source` through `answer`) are free text owned by the
/// user. The scheduling fields (`review_stage`, `review_count`,
/// `next_review_date`, `last_reviewed_at`) are owned by the scheduler and are
/// only ever written at creation time or by a review.
///
/// # Lifecycle
/// Created at stage 0 and due one day after `resolve_date`. Each review moves
/// the exercise one rung up the ladder until it reaches the pool stage, where
/// it stays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: i64,
    pub source: String,
    /// Identifier of the exercise on its source (e.g. a problem number).
    pub source_id: String,
    pub title: String,
    pub link: String,
    /// Comma-separated tags, stored verbatim.
    pub tags: String,
    pub answer: String,
    /// When the exercise was first solved.
    pub resolve_date: DateTime<Utc>,
    pub next_review_date: DateTime<Utc>,
    pub review_stage: u32,
    pub review_count: u32,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Exercise {
    /// The user-editable part of the record.
    pub fn details(&self) -> ExerciseDetails {
        ExerciseDetails {
            source: self.source.clone(),
            source_id: self.source_id.clone(),
            title: self.title.clone(),
            link: self.link.clone(),
            tags: self.tags.clone(),
            answer: self.answer.clone(),
            resolve_date: self.resolve_date,
        }
    }
}

/// Descriptive fields of an exercise, as written by an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseDetails {
    pub source: String,
    pub source_id: String,
    pub title: String,
    pub link: String,
    pub tags: String,
    pub answer: String,
    pub resolve_date: DateTime<Utc>,
}

/// A fully-formed exercise row ready to be inserted, minus its id.
#[derive(Debug, Clone)]
pub struct NewExercise {
    pub details: ExerciseDetails,
    pub next_review_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating an exercise.
///
/// Scheduling fields sent by a client are not part of this type and are
/// dropped during deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateExerciseInput {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub source_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub answer: String,
    /// Defaults to the creation time.
    pub resolve_date: Option<DateTime<Utc>>,
}

/// Input for replacing the descriptive fields of an exercise.
///
/// Text fields are replaced wholesale; an omitted `resolve_date` keeps the
/// stored one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateExerciseInput {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub source_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub answer: String,
    pub resolve_date: Option<DateTime<Utc>>,
}

/// Response body for a successful creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedExercise {
    pub id: i64,
}
