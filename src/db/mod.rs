mod schema;

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::functions::FunctionFlags;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior};

use crate::models::*;
use crate::query::{Filter, Order, PageWindow, Snapshot, View};
use crate::scheduler::{self, POOL_STAGE};
use crate::store::ExerciseStore;

/// Columns in the order [`exercise_from_row`] reads them.
const EXERCISE_COLUMNS: &str = "id, IFNULL(source, ''), IFNULL(source_id, ''), title, \
     IFNULL(link, ''), IFNULL(tags, ''), IFNULL(answer, ''), resolve_date, next_review_date, \
     IFNULL(review_stage, 0), IFNULL(review_count, 0), last_reviewed_at, created_at";

/// SQLite-backed exercise store. Cloning shares the underlying connection.
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!(
                "Database file '{}' does not exist, creating a new one",
                path.display()
            );
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {}", path.display()))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        register_functions(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        register_functions(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }
}

impl ExerciseStore for Database {
    fn insert(&self, exercise: NewExercise) -> Result<i64> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let details = &exercise.details;

        conn.execute(
            "INSERT INTO exercises (source, source_id, title, link, tags, answer, resolve_date,
                                    next_review_date, review_stage, review_count, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, 0, ?)",
            (
                &details.source,
                &details.source_id,
                &details.title,
                &details.link,
                &details.tags,
                &details.answer,
                format_timestamp(details.resolve_date),
                format_timestamp(exercise.next_review_date),
                format_timestamp(exercise.created_at),
            ),
        )
        .context("Failed to insert exercise")?;

        Ok(conn.last_insert_rowid())
    }

    fn find_by_id(&self, id: i64) -> Result<Option<Exercise>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        select_exercise(&conn, id)
    }

    fn update_details(&self, id: i64, details: &ExerciseDetails) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute(
            "UPDATE exercises SET source = ?, source_id = ?, title = ?, link = ?, tags = ?,
                                  answer = ?, resolve_date = ?
             WHERE id = ?",
            (
                &details.source,
                &details.source_id,
                &details.title,
                &details.link,
                &details.tags,
                &details.answer,
                format_timestamp(details.resolve_date),
                id,
            ),
        )?;
        Ok(rows > 0)
    }

    fn delete(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM exercises WHERE id = ?", [id])?;
        Ok(rows > 0)
    }

    fn query(&self, filter: &Filter, window: PageWindow) -> Result<(Vec<Exercise>, u64)> {
        let conn = self.conn.lock().expect("database lock poisoned");

        // Count and page share the exact same WHERE clause and parameters.
        let mut params = Vec::new();
        let where_clause = filter_clause(filter, &mut params);

        let total: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) FROM exercises WHERE {}", where_clause),
                params_from_iter(params.iter()),
                |row| row.get(0),
            )
            .context("Failed to count exercises")?;

        let order_by = match filter.order() {
            Order::NextReviewAsc => "next_review_date ASC, id ASC",
            Order::CreatedDesc => "created_at DESC, id DESC",
        };

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM exercises WHERE {} ORDER BY {} LIMIT {} OFFSET {}",
            EXERCISE_COLUMNS, where_clause, order_by, window.limit, window.offset
        ))?;

        let exercises = stmt
            .query_map(params_from_iter(params.iter()), exercise_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list exercises")?;

        Ok((exercises, total as u64))
    }

    fn aggregate(&self, snapshot: &Snapshot) -> Result<Stats> {
        let conn = self.conn.lock().expect("database lock poisoned");

        let mut params = Vec::new();
        let pool = view_clause(View::Pool, snapshot, &mut params);
        let pending = view_clause(View::Pending, snapshot, &mut params);
        let reviewed_today = view_clause(View::ReviewedToday, snapshot, &mut params);
        let solved_today = view_clause(View::SolvedToday, snapshot, &mut params);

        let sql = format!(
            "SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN {} THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN {} THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN {} THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN {} THEN 1 ELSE 0 END), 0)
             FROM exercises",
            pool, pending, reviewed_today, solved_today
        );

        let counts = conn
            .query_row(&sql, params_from_iter(params.iter()), |row| {
                Ok([
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                ])
            })
            .context("Failed to aggregate exercise stats")?;

        Ok(Stats {
            total_count: counts[0] as u64,
            pool_count: counts[1] as u64,
            pending_count: counts[2] as u64,
            reviewed_today_count: counts[3] as u64,
            solved_today_count: counts[4] as u64,
        })
    }

    fn record_review(&self, id: i64, now: DateTime<Utc>) -> Result<Option<Exercise>> {
        let mut conn = self.conn.lock().expect("database lock poisoned");

        // IMMEDIATE takes the write lock before the read, so a second writer
        // on the same file cannot interleave between the two.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current = tx
            .query_row(
                "SELECT IFNULL(review_stage, 0), IFNULL(review_count, 0)
                 FROM exercises WHERE id = ?",
                [id],
                |row| Ok((row.get::<_, u32>(0)?, row.get::<_, u32>(1)?)),
            )
            .optional()?;

        let Some((stage, count)) = current else {
            return Ok(None);
        };

        let outcome = scheduler::advance(stage, count, now);
        tx.execute(
            "UPDATE exercises SET review_stage = ?, review_count = ?, next_review_date = ?,
                                  last_reviewed_at = ?
             WHERE id = ?",
            (
                outcome.review_stage,
                outcome.review_count,
                format_timestamp(outcome.next_review_date),
                format_timestamp(outcome.last_reviewed_at),
                id,
            ),
        )
        .with_context(|| format!("Failed to record review of exercise {}", id))?;

        let reviewed = select_exercise(&tx, id)?;
        tx.commit()?;

        Ok(reviewed)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

/// SQLite's built-in `lower()` and `LIKE` only fold ASCII. Search goes
/// through `unicode_lower` so it folds case the same way [`Search`] does.
///
/// [`Search`]: crate::query::Search
fn register_functions(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "unicode_lower",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|s| s.to_lowercase())),
    )
    .context("Failed to register unicode_lower")
}

fn select_exercise(conn: &Connection, id: i64) -> Result<Option<Exercise>> {
    let exercise = conn
        .query_row(
            &format!("SELECT {} FROM exercises WHERE id = ?", EXERCISE_COLUMNS),
            [id],
            exercise_from_row,
        )
        .optional()?;
    Ok(exercise)
}

fn exercise_from_row(row: &Row<'_>) -> rusqlite::Result<Exercise> {
    Ok(Exercise {
        id: row.get(0)?,
        source: row.get(1)?,
        source_id: row.get(2)?,
        title: row.get(3)?,
        link: row.get(4)?,
        tags: row.get(5)?,
        answer: row.get(6)?,
        resolve_date: parse_timestamp(7, row.get(7)?)?,
        next_review_date: parse_timestamp(8, row.get(8)?)?,
        review_stage: row.get(9)?,
        review_count: row.get(10)?,
        last_reviewed_at: row
            .get::<_, Option<String>>(11)?
            .map(|s| parse_timestamp(11, s))
            .transpose()?,
        created_at: parse_timestamp(12, row.get(12)?)?,
    })
}

/// WHERE clause for `filter`, pushing its parameters onto `params` in
/// placeholder order.
fn filter_clause(filter: &Filter, params: &mut Vec<String>) -> String {
    let mut clause = view_clause(filter.view, &filter.snapshot, params);

    if let Some(search) = &filter.search {
        // instr() matches the needle literally, so `%` and `_` need no escaping.
        let fields = ["source_id", "title", "tags", "answer"];
        let matches: Vec<String> = fields
            .iter()
            .map(|field| {
                params.push(search.needle().to_string());
                format!("instr(unicode_lower({}), ?) > 0", field)
            })
            .collect();
        clause = format!("({}) AND ({})", clause, matches.join(" OR "));
    }

    clause
}

fn view_clause(view: View, snapshot: &Snapshot, params: &mut Vec<String>) -> String {
    match view {
        View::Pending => {
            params.push(format_timestamp(snapshot.now));
            format!("next_review_date <= ? AND review_stage < {}", POOL_STAGE)
        }
        View::Pool => format!("review_stage >= {}", POOL_STAGE),
        View::ReviewedToday => day_clause("last_reviewed_at", snapshot, params),
        View::SolvedToday => day_clause("resolve_date", snapshot, params),
        View::Total => "1 = 1".to_string(),
    }
}

fn day_clause(column: &str, snapshot: &Snapshot, params: &mut Vec<String>) -> String {
    params.push(format_timestamp(snapshot.today.start));
    params.push(format_timestamp(snapshot.today.end));
    format!("({0} >= ? AND {0} < ?)", column)
}

/// Fixed-width UTC timestamps compare lexicographically in chronological
/// order, which the view predicates rely on. Migration 007 rewrites older
/// rows into this form.
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(idx: usize, s: String) -> rusqlite::Result<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(&s) {
        return Ok(at.with_timezone(&Utc));
    }
    // Older rows: SQLite CURRENT_TIMESTAMP, or a space-separated offset form.
    if let Ok(at) = DateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S%.f")
        .map(|at| at.and_utc())
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
