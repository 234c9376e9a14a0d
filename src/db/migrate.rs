//! Versioned schema migrations for a task list file.
//!
//! Every step is applied at most once. Applied versions are recorded in the
//! `log` table (`operation = 'migration_applied'`, `target = version`), and
//! each step runs in its own transaction together with its marker.

use crate::errors::{AppError, AppResult};
use crate::utils::time::{parse_legacy_local, parse_legacy_utc, to_db};
use rusqlite::{Connection, OptionalExtension, Result, params};
use tracing::{info, warn};

struct Migration {
    version: &'static str,
    description: &'static str,
    apply: fn(&Connection) -> AppResult<()>,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "0001_create_tasks",
        description: "Create tasks table",
        apply: create_tasks_table,
    },
    Migration {
        version: "0002_import_legacy_problems",
        description: "Import rows from the legacy problems table",
        apply: import_legacy_problems,
    },
    Migration {
        version: "0003_add_confirmed",
        description: "Add confirmed flag to tasks",
        apply: add_confirmed_column,
    },
    Migration {
        version: "0004_add_last_notified_at",
        description: "Add last_notified_at to tasks",
        apply: add_last_notified_column,
    },
    Migration {
        version: "0005_index_due",
        description: "Index tasks by (confirmed, due_at)",
        apply: create_due_index,
    },
];

/// Ensure that the `log` table exists.
fn ensure_log_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

pub fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type='table' AND name=?1")?;
    let exists: Option<String> = stmt.query_row([table], |row| row.get(0)).optional()?;
    Ok(exists.is_some())
}

pub fn has_column(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info('{}')", table))?;
    let cols = stmt.query_map([], |row| row.get::<_, String>(1))?;

    for c in cols {
        if c? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Additive migration: append a column only when it is missing.
fn add_column_if_missing(conn: &Connection, table: &str, column: &str, decl: &str) -> Result<()> {
    if has_column(conn, table, column)? {
        return Ok(());
    }
    conn.execute_batch(&format!(
        "ALTER TABLE {} ADD COLUMN {} {};",
        table, column, decl
    ))
}

fn is_applied(conn: &Connection, version: &str) -> Result<bool> {
    let mut chk = conn.prepare(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

fn mark_applied(conn: &Connection, m: &Migration) -> Result<()> {
    conn.execute(
        "INSERT INTO log (date, operation, target, message)
         VALUES (?1, 'migration_applied', ?2, ?3)",
        params![to_db(&chrono::Utc::now()), m.version, m.description],
    )?;
    Ok(())
}

fn create_tasks_table(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS tasks (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            text        TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            due_at      TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn import_legacy_problems(conn: &Connection) -> AppResult<()> {
    if !table_exists(conn, "problems")? {
        return Ok(());
    }

    warn!("legacy 'problems' table detected, importing into 'tasks'");

    let db_path: String = conn
        .query_row("PRAGMA database_list;", [], |row| row.get::<_, String>(2))
        .unwrap_or_default();

    if db_path.is_empty() {
        warn!("could not determine list path, backup skipped");
    } else {
        backup_before_migration(&db_path)?;
    }

    let legacy: Vec<(i64, String, Option<String>, String)> = {
        let mut stmt =
            conn.prepare("SELECT problem_id, problem, time_create, time_send FROM problems")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })?;
        rows.collect::<Result<Vec<_>>>()?
    };

    for (id, text, created, send) in &legacy {
        let due = parse_legacy_local(send).ok_or_else(|| {
            AppError::Migration(format!("legacy row {}: bad time_send '{}'", id, send))
        })?;
        let created = created
            .as_deref()
            .and_then(parse_legacy_utc)
            .unwrap_or(due);

        conn.execute(
            "INSERT INTO tasks (id, text, created_at, due_at) VALUES (?1, ?2, ?3, ?4)",
            params![id, text, to_db(&created), to_db(&due)],
        )?;
    }

    conn.execute_batch("DROP TABLE problems;")?;
    info!(rows = legacy.len(), "legacy rows imported");
    Ok(())
}

fn add_confirmed_column(conn: &Connection) -> AppResult<()> {
    add_column_if_missing(conn, "tasks", "confirmed", "INTEGER NOT NULL DEFAULT 0")?;
    Ok(())
}

fn add_last_notified_column(conn: &Connection) -> AppResult<()> {
    add_column_if_missing(conn, "tasks", "last_notified_at", "TEXT")?;
    Ok(())
}

fn create_due_index(conn: &Connection) -> AppResult<()> {
    conn.execute_batch("CREATE INDEX IF NOT EXISTS idx_tasks_due ON tasks(confirmed, due_at);")?;
    Ok(())
}

fn backup_before_migration(db_path: &str) -> AppResult<()> {
    use chrono::Local;
    use std::fs::{self, File};
    use std::io::Write;
    use zip::CompressionMethod;
    use zip::ZipWriter;
    use zip::write::FileOptions;

    let source = std::path::Path::new(db_path);
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "list".to_string());

    let backup_name = format!(
        "{}-{}-backup_pre_tasks.zip",
        Local::now().format("%Y%m%d_%H%M%S"),
        stem
    );

    let backup_path = match source.parent() {
        Some(dir) => dir.join(&backup_name),
        None => std::path::PathBuf::from(&backup_name),
    };

    let zip_err = |stage: &str, e: &dyn std::fmt::Display| {
        AppError::Migration(format!("Backup failed ({}): {}", stage, e))
    };

    let file = File::create(&backup_path)?;
    let mut zip = ZipWriter::new(file);

    let options: FileOptions<'_, ()> =
        FileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file(format!("{}.sqlite", stem), options)
        .map_err(|e| zip_err("start_file", &e))?;

    let db_content = fs::read(db_path)?;
    zip.write_all(&db_content)?;
    zip.finish().map_err(|e| zip_err("finish", &e))?;

    info!(backup = %backup_path.display(), "backup created");
    Ok(())
}

/// Versions not yet applied to this file, in order.
pub fn pending_migrations(conn: &Connection) -> AppResult<Vec<&'static str>> {
    ensure_log_table(conn)?;
    let mut out = Vec::new();
    for m in MIGRATIONS {
        if !is_applied(conn, m.version)? {
            out.push(m.version);
        }
    }
    Ok(out)
}

pub fn latest_version() -> &'static str {
    MIGRATIONS.last().map(|m| m.version).unwrap_or("none")
}

/// Public entry point: run all pending migrations, returning the versions
/// applied by this call.
pub fn run_pending_migrations(conn: &Connection) -> AppResult<Vec<&'static str>> {
    ensure_log_table(conn)?;

    let mut applied = Vec::new();
    for m in MIGRATIONS {
        if is_applied(conn, m.version)? {
            continue;
        }

        let tx = conn.unchecked_transaction()?;
        (m.apply)(&tx).map_err(|e| match e {
            AppError::Migration(_) => e,
            other => AppError::Migration(format!("{}: {}", m.version, other)),
        })?;
        mark_applied(&tx, m)?;
        tx.commit()?;

        applied.push(m.version);
    }

    Ok(applied)
}
