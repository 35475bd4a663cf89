use anyhow::{Context, Result};
use rusqlite::Connection;

struct Migration {
    version: &'static str,
    name: &'static str,
    sql: &'static str,
    /// Columns this migration adds to `exercises`. Used to recognise
    /// migrations already applied to an untracked database.
    adds_columns: &'static [&'static str],
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "001",
        name: "initial",
        sql: include_str!("migrations/001_initial.sql"),
        adds_columns: &[],
    },
    Migration {
        version: "002",
        name: "review_count",
        sql: include_str!("migrations/002_review_count.sql"),
        adds_columns: &["review_count"],
    },
    Migration {
        version: "003",
        name: "link",
        sql: include_str!("migrations/003_link.sql"),
        adds_columns: &["link"],
    },
    Migration {
        version: "004",
        name: "tags",
        sql: include_str!("migrations/004_tags.sql"),
        adds_columns: &["tags"],
    },
    Migration {
        version: "005",
        name: "last_reviewed_at",
        sql: include_str!("migrations/005_last_reviewed_at.sql"),
        adds_columns: &["last_reviewed_at"],
    },
    Migration {
        version: "006",
        name: "review_indexes",
        sql: include_str!("migrations/006_review_indexes.sql"),
        adds_columns: &[],
    },
    Migration {
        version: "007",
        name: "normalize_timestamps",
        sql: include_str!("migrations/007_normalize_timestamps.sql"),
        adds_columns: &[],
    },
];

pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
    )
    .context("Failed to create schema_migrations table")?;

    // Databases created before version tracking already have some columns.
    if needs_baseline(conn)? {
        baseline(conn)?;
    }

    let applied = get_applied_migrations(conn)?;

    for migration in MIGRATIONS {
        if !applied.iter().any(|v| v == migration.version) {
            apply_migration(conn, migration)?;
        }
    }

    Ok(())
}

fn needs_baseline(conn: &Connection) -> Result<bool> {
    let migration_count: i64 =
        conn.query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
            row.get(0)
        })?;

    if migration_count > 0 {
        return Ok(false);
    }

    let tables_exist: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='exercises'",
        [],
        |row| row.get(0),
    )?;

    Ok(tables_exist > 0)
}

fn baseline(conn: &Connection) -> Result<()> {
    let columns = existing_columns(conn)?;

    for migration in MIGRATIONS {
        // The table itself proves 001; column migrations count once every
        // column they add is present. Index and data migrations are safe to
        // rerun.
        let applied = migration.version == "001"
            || (!migration.adds_columns.is_empty()
                && migration
                    .adds_columns
                    .iter()
                    .all(|c| columns.iter().any(|existing| existing == c)));
        if !applied {
            continue;
        }

        mark_migration_applied(conn, migration.version, migration.name)?;
        tracing::info!(
            "Detected existing database, marked migration {} as applied",
            migration.version
        );
    }

    Ok(())
}

fn existing_columns(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('exercises')")?;
    let columns = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(columns)
}

fn get_applied_migrations(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT version FROM schema_migrations ORDER BY version")?;
    let versions = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(versions)
}

fn mark_migration_applied(conn: &Connection, version: &str, name: &str) -> Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?, ?, ?)",
        (version, name, &now),
    )?;
    Ok(())
}

fn apply_migration(conn: &Connection, migration: &Migration) -> Result<()> {
    tracing::info!(
        "Applying migration {}: {}",
        migration.version,
        migration.name
    );

    conn.execute_batch(&format!("BEGIN TRANSACTION; {} COMMIT;", migration.sql))
        .with_context(|| {
            format!(
                "Failed to apply migration {}: {}",
                migration.version, migration.name
            )
        })?;

    mark_migration_applied(conn, migration.version, migration.name)?;

    tracing::info!("Migration {} applied successfully", migration.version);
    Ok(())
}
