use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::{DateTime, Utc};

use super::ExerciseStore;
use crate::models::{Exercise, ExerciseDetails, NewExercise, Stats};
use crate::query::{Filter, PageWindow, Snapshot, View};
use crate::scheduler;

/// In-process exercise store backed by a map.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    last_id: i64,
    rows: BTreeMap<i64, Exercise>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExerciseStore for MemoryStore {
    fn insert(&self, exercise: NewExercise) -> Result<i64> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        inner.last_id += 1;
        let id = inner.last_id;
        let details = exercise.details;

        inner.rows.insert(
            id,
            Exercise {
                id,
                source: details.source,
                source_id: details.source_id,
                title: details.title,
                link: details.link,
                tags: details.tags,
                answer: details.answer,
                resolve_date: details.resolve_date,
                next_review_date: exercise.next_review_date,
                review_stage: 0,
                review_count: 0,
                last_reviewed_at: None,
                created_at: exercise.created_at,
            },
        );

        Ok(id)
    }

    fn find_by_id(&self, id: i64) -> Result<Option<Exercise>> {
        let inner = self.inner.lock().expect("store lock poisoned");
        Ok(inner.rows.get(&id).cloned())
    }

    fn update_details(&self, id: i64, details: &ExerciseDetails) -> Result<bool> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        let Some(row) = inner.rows.get_mut(&id) else {
            return Ok(false);
        };

        row.source = details.source.clone();
        row.source_id = details.source_id.clone();
        row.title = details.title.clone();
        row.link = details.link.clone();
        row.tags = details.tags.clone();
        row.answer = details.answer.clone();
        row.resolve_date = details.resolve_date;
        Ok(true)
    }

    fn delete(&self, id: i64) -> Result<bool> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        Ok(inner.rows.remove(&id).is_some())
    }

    fn query(&self, filter: &Filter, window: PageWindow) -> Result<(Vec<Exercise>, u64)> {
        let inner = self.inner.lock().expect("store lock poisoned");
        let mut matching: Vec<&Exercise> =
            inner.rows.values().filter(|e| filter.matches(e)).collect();
        let total = matching.len() as u64;

        let order = filter.order();
        matching.sort_by(|a, b| order.compare(a, b));

        let page = matching
            .into_iter()
            .skip(window.offset as usize)
            .take(window.limit as usize)
            .cloned()
            .collect();

        Ok((page, total))
    }

    fn aggregate(&self, snapshot: &Snapshot) -> Result<Stats> {
        let inner = self.inner.lock().expect("store lock poisoned");
        let mut stats = Stats::default();

        for exercise in inner.rows.values() {
            stats.total_count += 1;
            if View::Pool.matches(exercise, snapshot) {
                stats.pool_count += 1;
            }
            if View::Pending.matches(exercise, snapshot) {
                stats.pending_count += 1;
            }
            if View::ReviewedToday.matches(exercise, snapshot) {
                stats.reviewed_today_count += 1;
            }
            if View::SolvedToday.matches(exercise, snapshot) {
                stats.solved_today_count += 1;
            }
        }

        Ok(stats)
    }

    fn record_review(&self, id: i64, now: DateTime<Utc>) -> Result<Option<Exercise>> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        let Some(row) = inner.rows.get_mut(&id) else {
            return Ok(None);
        };

        let outcome = scheduler::advance(row.review_stage, row.review_count, now);
        row.review_stage = outcome.review_stage;
        row.review_count = outcome.review_count;
        row.next_review_date = outcome.next_review_date;
        row.last_reviewed_at = Some(outcome.last_reviewed_at);

        Ok(Some(row.clone()))
    }
}
