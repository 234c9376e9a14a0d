use crate::errors::{AppError, AppResult};
use crate::models::Task;
use crate::utils::time::{from_db, to_db};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Result, Row, params};

const TASK_COLUMNS: &str = "id, text, created_at, due_at, confirmed, last_notified_at";

fn parse_ts(col: usize, raw: String) -> Result<DateTime<Utc>> {
    from_db(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            col,
            rusqlite::types::Type::Text,
            Box::new(AppError::InvalidDate(raw)),
        )
    })
}

pub fn map_row(row: &Row) -> Result<Task> {
    let created_raw: String = row.get("created_at")?;
    let due_raw: String = row.get("due_at")?;
    let notified_raw: Option<String> = row.get("last_notified_at")?;

    let last_notified_at = match notified_raw {
        Some(raw) => Some(parse_ts(5, raw)?),
        None => None,
    };

    Ok(Task {
        id: row.get("id")?,
        text: row.get("text")?,
        created_at: parse_ts(2, created_raw)?,
        due_at: parse_ts(3, due_raw)?,
        confirmed: row.get::<_, i64>("confirmed")? != 0,
        last_notified_at,
    })
}

/// Insert a new task and return its id.
pub fn insert_task(conn: &Connection, task: &Task) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO tasks (text, created_at, due_at, confirmed)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            task.text,
            to_db(&task.created_at),
            to_db(&task.due_at),
            task.confirmed as i64
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn load_tasks(conn: &Connection) -> AppResult<Vec<Task>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM tasks ORDER BY due_at ASC, id ASC",
        TASK_COLUMNS
    ))?;

    let rows = stmt.query_map([], map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn load_task(conn: &Connection, id: i64) -> AppResult<Option<Task>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS))?;
    Ok(stmt.query_row([id], map_row).optional()?)
}

/// Unconfirmed tasks whose due time has been reached.
pub fn load_due_tasks(conn: &Connection, now: &DateTime<Utc>) -> AppResult<Vec<Task>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM tasks
         WHERE confirmed = 0 AND due_at <= ?1
         ORDER BY due_at ASC, id ASC",
        TASK_COLUMNS
    ))?;

    let rows = stmt.query_map([to_db(now)], map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Returns the number of deleted rows (0 or 1).
pub fn delete_task(conn: &Connection, id: i64) -> AppResult<usize> {
    Ok(conn.execute("DELETE FROM tasks WHERE id = ?1", [id])?)
}

/// Returns `Some(true)` when the task flipped to confirmed, `Some(false)`
/// when it already was, `None` when it does not exist.
pub fn confirm_task(conn: &Connection, id: i64) -> AppResult<Option<bool>> {
    let changed = conn.execute(
        "UPDATE tasks SET confirmed = 1 WHERE id = ?1 AND confirmed = 0",
        [id],
    )?;
    if changed == 1 {
        return Ok(Some(true));
    }

    let exists: Option<i64> = conn
        .query_row("SELECT id FROM tasks WHERE id = ?1", [id], |row| row.get(0))
        .optional()?;
    Ok(exists.map(|_| false))
}

/// Record a successful send. Only moves `last_notified_at` forward and never
/// touches confirmed rows. Returns the number of updated rows.
pub fn mark_notified(conn: &Connection, id: i64, at: &DateTime<Utc>) -> AppResult<usize> {
    let at = to_db(at);
    Ok(conn.execute(
        "UPDATE tasks SET last_notified_at = ?2
         WHERE id = ?1
           AND confirmed = 0
           AND (last_notified_at IS NULL OR last_notified_at <= ?2)",
        params![id, at],
    )?)
}

pub fn count_tasks(conn: &Connection) -> AppResult<(i64, i64)> {
    Ok(conn.query_row(
        "SELECT COUNT(*), IFNULL(SUM(CASE WHEN confirmed = 0 THEN 1 ELSE 0 END), 0) FROM tasks",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?)
}
