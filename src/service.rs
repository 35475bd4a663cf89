//! Exercise operations exposed to the request layer.
//!
//! Every operation takes the store it works on and, where time matters, the
//! instant it is evaluated at. Nothing here reads a global handle or the
//! system clock.

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::models::*;
use crate::query::{self, Filter, PageRequest, Snapshot, View};
use crate::scheduler;
use crate::store::ExerciseStore;

/// Create an exercise at stage 0, due one day after its `resolve_date`.
pub fn create<S: ExerciseStore + ?Sized>(
    store: &S,
    input: CreateExerciseInput,
    now: DateTime<Utc>,
) -> Result<i64> {
    validate_title(&input.title)?;

    let resolve_date = input.resolve_date.unwrap_or(now);
    let exercise = NewExercise {
        details: ExerciseDetails {
            source: input.source,
            source_id: input.source_id,
            title: input.title,
            link: input.link,
            tags: input.tags,
            answer: input.answer,
            resolve_date,
        },
        next_review_date: scheduler::first_review_date(resolve_date),
        created_at: now,
    };

    let id = store.insert(exercise)?;
    tracing::info!(id, "Created exercise");
    Ok(id)
}

pub fn get<S: ExerciseStore + ?Sized>(store: &S, id: i64) -> Result<Exercise> {
    store.find_by_id(id)?.ok_or(Error::NotFound(id))
}

/// Replace the descriptive fields of an exercise. Its review schedule is
/// never touched.
pub fn update<S: ExerciseStore + ?Sized>(
    store: &S,
    id: i64,
    input: UpdateExerciseInput,
) -> Result<Exercise> {
    validate_title(&input.title)?;

    let existing = get(store, id)?;
    let details = ExerciseDetails {
        source: input.source,
        source_id: input.source_id,
        title: input.title,
        link: input.link,
        tags: input.tags,
        answer: input.answer,
        resolve_date: input.resolve_date.unwrap_or(existing.resolve_date),
    };

    if !store.update_details(id, &details)? {
        return Err(Error::NotFound(id));
    }
    tracing::info!(id, "Updated exercise");

    get(store, id)
}

pub fn delete<S: ExerciseStore + ?Sized>(store: &S, id: i64) -> Result<()> {
    if !store.delete(id)? {
        return Err(Error::NotFound(id));
    }
    tracing::info!(id, "Deleted exercise");
    Ok(())
}

/// One page of `view`, narrowed by `search`.
pub fn list<S: ExerciseStore + ?Sized>(
    store: &S,
    view: View,
    search: Option<&str>,
    page: PageRequest,
    now: DateTime<Utc>,
) -> Result<ExercisePage> {
    let filter = Filter::new(view, search, Snapshot::new(now));
    let (data, total) = store.query(&filter, page.window())?;

    tracing::debug!(
        view = view.as_str(),
        page = page.number(),
        total,
        "Listed exercises"
    );

    Ok(ExercisePage {
        data,
        total,
        page: page.number(),
        total_pages: query::total_pages(total),
    })
}

/// Record a review of `id` performed at `now`.
pub fn review<S: ExerciseStore + ?Sized>(
    store: &S,
    id: i64,
    now: DateTime<Utc>,
) -> Result<Exercise> {
    let reviewed = store.record_review(id, now)?.ok_or(Error::NotFound(id))?;

    tracing::info!(
        id,
        stage = reviewed.review_stage,
        count = reviewed.review_count,
        next_review_date = %reviewed.next_review_date,
        "Reviewed exercise"
    );
    Ok(reviewed)
}

pub fn stats<S: ExerciseStore + ?Sized>(store: &S, now: DateTime<Utc>) -> Result<Stats> {
    Ok(store.aggregate(&Snapshot::new(now))?)
}

fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::validation("title is required"));
    }
    Ok(())
}
