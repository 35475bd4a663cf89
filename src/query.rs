//! View resolution, search and pagination over the exercise set.
//!
//! A list request is a [`View`] (which exercises, in which order), an optional
//! [`Search`] term, and a [`PageRequest`]. Together with a [`Snapshot`] of
//! "now" they form a [`Filter`]. Every store evaluates the same filter for
//! both its count and its page, and the dashboard counts reuse the view
//! predicates through [`View::matches`], so the numbers always agree.

use std::str::FromStr;

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::Exercise;
use crate::scheduler;

/// Fixed number of exercises per page.
pub const PAGE_SIZE: u32 = 10;

/// A named predicate plus ordering over the exercise set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    /// Due and still on the review ladder.
    #[default]
    Pending,
    /// Graduated to the pool stage.
    Pool,
    /// Reviewed on the local calendar day of "now".
    ReviewedToday,
    /// Solved (resolve date) on the local calendar day of "now".
    SolvedToday,
    /// Everything.
    Total,
}

impl View {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Pool => "pool",
            Self::ReviewedToday => "reviewed_today",
            Self::SolvedToday => "solved_today",
            Self::Total => "total",
        }
    }

    /// Resolve a client-supplied filter name. Missing or unknown names fall
    /// back to [`View::Pending`].
    pub fn resolve(name: Option<&str>) -> Self {
        name.and_then(|name| name.trim().parse().ok())
            .unwrap_or_default()
    }

    pub fn order(&self) -> Order {
        match self {
            Self::Pending => Order::NextReviewAsc,
            Self::Pool | Self::ReviewedToday | Self::SolvedToday | Self::Total => {
                Order::CreatedDesc
            }
        }
    }

    /// Whether `exercise` belongs to this view at `snapshot`.
    pub fn matches(&self, exercise: &Exercise, snapshot: &Snapshot) -> bool {
        match self {
            Self::Pending => {
                exercise.next_review_date <= snapshot.now
                    && !scheduler::is_pooled(exercise.review_stage)
            }
            Self::Pool => scheduler::is_pooled(exercise.review_stage),
            Self::ReviewedToday => exercise
                .last_reviewed_at
                .is_some_and(|at| snapshot.today.contains(at)),
            Self::SolvedToday => snapshot.today.contains(exercise.resolve_date),
            Self::Total => true,
        }
    }
}

impl FromStr for View {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "pool" => Ok(Self::Pool),
            "reviewed_today" => Ok(Self::ReviewedToday),
            "solved_today" => Ok(Self::SolvedToday),
            "total" => Ok(Self::Total),
            other => Err(Error::validation(format!("unknown view '{}'", other))),
        }
    }
}

/// Sort order of a view. Ties are broken by id in the same direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    NextReviewAsc,
    CreatedDesc,
}

impl Order {
    pub fn compare(&self, a: &Exercise, b: &Exercise) -> std::cmp::Ordering {
        match self {
            Self::NextReviewAsc => (a.next_review_date, a.id).cmp(&(b.next_review_date, b.id)),
            Self::CreatedDesc => (b.created_at, b.id).cmp(&(a.created_at, a.id)),
        }
    }
}

/// Half-open `[start, end)` UTC range covering one local calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    /// The calendar day in `tz` that contains `now`.
    pub fn containing<Tz: TimeZone>(now: DateTime<Utc>, tz: &Tz) -> Self {
        let date = now.with_timezone(tz).date_naive();
        let start = midnight(date, tz);
        let end = date
            .succ_opt()
            .map(|next| midnight(next, tz))
            .unwrap_or_else(|| start + Duration::days(1));
        Self { start, end }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}

fn midnight<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    if let Some(at) = tz.from_local_datetime(&naive).earliest() {
        return at.with_timezone(&Utc);
    }
    // Midnight skipped by a DST jump: the day starts at the jump itself, which
    // is midnight under the offset in force just before it.
    tz.from_local_datetime(&(naive - Duration::seconds(1)))
        .earliest()
        .map(|before| before.offset().fix())
        .and_then(|offset| offset.from_local_datetime(&naive).single())
        .map(|at| at.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

/// The instant a query is evaluated at, plus the local day it falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub now: DateTime<Utc>,
    pub today: DayWindow,
}

impl Snapshot {
    /// Snapshot using the process-local timezone for "today".
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::in_zone(now, &Local)
    }

    pub fn in_zone<Tz: TimeZone>(now: DateTime<Utc>, tz: &Tz) -> Self {
        Self {
            now,
            today: DayWindow::containing(now, tz),
        }
    }
}

/// Case-insensitive substring search over `source_id`, `title`, `tags` and
/// `answer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Search {
    term: String,
    needle: String,
}

impl Search {
    /// Returns `None` for a blank term.
    pub fn new(term: &str) -> Option<Self> {
        let term = term.trim();
        if term.is_empty() {
            return None;
        }
        Some(Self {
            term: term.to_string(),
            needle: term.to_lowercase(),
        })
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    /// The lower-cased term fields are matched against.
    pub fn needle(&self) -> &str {
        &self.needle
    }

    pub fn matches(&self, exercise: &Exercise) -> bool {
        [
            &exercise.source_id,
            &exercise.title,
            &exercise.tags,
            &exercise.answer,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&self.needle))
    }
}

/// View predicate AND optional search, evaluated at a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub view: View,
    pub search: Option<Search>,
    pub snapshot: Snapshot,
}

impl Filter {
    pub fn new(view: View, search: Option<&str>, snapshot: Snapshot) -> Self {
        Self {
            view,
            search: search.and_then(Search::new),
            snapshot,
        }
    }

    pub fn order(&self) -> Order {
        self.view.order()
    }

    pub fn matches(&self, exercise: &Exercise) -> bool {
        self.view.matches(exercise, &self.snapshot)
            && self.search.as_ref().map_or(true, |s| s.matches(exercise))
    }
}

/// A validated, 1-indexed page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
}

impl PageRequest {
    pub fn new(page: u32) -> Result<Self> {
        if page == 0 {
            return Err(Error::validation("page numbers start at 1"));
        }
        Ok(Self { page })
    }

    pub fn first() -> Self {
        Self { page: 1 }
    }

    pub fn number(&self) -> u32 {
        self.page
    }

    pub fn window(&self) -> PageWindow {
        PageWindow {
            limit: u64::from(PAGE_SIZE),
            offset: u64::from(self.page - 1) * u64::from(PAGE_SIZE),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}

/// `LIMIT`/`OFFSET` pair handed to a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub limit: u64,
    pub offset: u64,
}

/// Number of pages needed for `total` matches; never less than 1.
pub fn total_pages(total: u64) -> u64 {
    total.div_ceil(u64::from(PAGE_SIZE)).max(1)
}
