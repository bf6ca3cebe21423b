//! Task CRUD and filtered listing.

use super::{Database, now_timestamp};
use crate::error::{ServiceError, ServiceResult};
use crate::types::{Task, TaskFilters, TaskStats, TaskStatus};
use crate::validation::ValidTask;
use anyhow::anyhow;
use rusqlite::{Connection, OptionalExtension, Row, params};

const TASK_COLUMNS: &str = "id, title, description, status, due_date, created_at, updated_at";

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let status: String = row.get("status")?;
    let status = status.parse::<TaskStatus>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        status,
        due_date: row.get("due_date")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Internal helper to get a task using an existing connection (avoids deadlock).
fn get_task_internal(conn: &Connection, task_id: i64) -> ServiceResult<Option<Task>> {
    let sql = format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS);
    let task = conn
        .query_row(&sql, params![task_id], parse_task_row)
        .optional()?;
    Ok(task)
}

/// Fetch a task that must exist.
fn require_task(conn: &Connection, task_id: i64) -> ServiceResult<Task> {
    get_task_internal(conn, task_id)?.ok_or(ServiceError::NotFound(task_id))
}

fn task_exists(conn: &Connection, task_id: i64) -> ServiceResult<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM tasks WHERE id = ?1", params![task_id], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(found.is_some())
}

impl Database {
    /// List tasks matching the filters, newest first.
    ///
    /// Status and search combine with AND. Search is a literal substring of
    /// title or description, compared after Unicode case folding.
    pub fn list_tasks(&self, filters: &TaskFilters) -> ServiceResult<Vec<Task>> {
        self.with_conn(|conn| {
            let mut sql = format!("SELECT {} FROM tasks t WHERE 1 = 1", TASK_COLUMNS);
            let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
            let mut param_idx = 1;

            if let Some(status) = filters.status() {
                sql.push_str(&format!(" AND t.status = ?{}", param_idx));
                params_vec.push(Box::new(status.to_string()));
                param_idx += 1;
            }

            if let Some(search) = filters.search() {
                sql.push_str(&format!(
                    " AND (instr(fold_case(t.title), ?{idx}) > 0 \
                     OR instr(fold_case(t.description), ?{idx}) > 0)",
                    idx = param_idx
                ));
                params_vec.push(Box::new(search.to_lowercase()));
            }

            sql.push_str(" ORDER BY t.created_at DESC, t.id DESC");

            let params_refs: Vec<&dyn rusqlite::ToSql> =
                params_vec.iter().map(|b| b.as_ref()).collect();
            let mut stmt = conn.prepare(&sql)?;
            let tasks = stmt
                .query_map(params_refs.as_slice(), parse_task_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(tasks)
        })
    }

    /// Get a task by id.
    pub fn get_task(&self, task_id: i64) -> ServiceResult<Task> {
        self.with_conn(|conn| require_task(conn, task_id))
    }

    /// Insert a validated task. The database assigns id and timestamps.
    pub fn create_task(&self, task: &ValidTask) -> ServiceResult<Task> {
        let now = now_timestamp();
        let status = task.status.unwrap_or_default();

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tasks (title, description, status, due_date, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![
                    task.title,
                    task.description,
                    status.as_str(),
                    task.due_date,
                    now
                ],
            )?;
            let id = conn.last_insert_rowid();
            get_task_internal(conn, id)?
                .ok_or_else(|| ServiceError::Internal(anyhow!("inserted task {} vanished", id)))
        })
    }

    /// Replace title, description, status and due date of an existing task.
    ///
    /// Omitted fields take their create-time defaults (status `pending`);
    /// `id` and `created_at` never change.
    pub fn update_task(&self, task_id: i64, task: &ValidTask) -> ServiceResult<Task> {
        let now = now_timestamp();
        let status = task.status.unwrap_or_default();

        self.with_conn(|conn| {
            if !task_exists(conn, task_id)? {
                return Err(ServiceError::NotFound(task_id));
            }

            conn.execute(
                "UPDATE tasks SET
                    title = ?1,
                    description = ?2,
                    status = ?3,
                    due_date = ?4,
                    updated_at = MAX(?5, updated_at)
                 WHERE id = ?6",
                params![
                    task.title,
                    task.description,
                    status.as_str(),
                    task.due_date,
                    now,
                    task_id
                ],
            )?;

            require_task(conn, task_id)
        })
    }

    /// Change only the status (and `updated_at`) of an existing task.
    pub fn patch_task_status(&self, task_id: i64, status: TaskStatus) -> ServiceResult<Task> {
        let now = now_timestamp();

        self.with_conn(|conn| {
            let rows_affected = conn.execute(
                "UPDATE tasks SET status = ?1, updated_at = MAX(?2, updated_at) WHERE id = ?3",
                params![status.as_str(), now, task_id],
            )?;

            if rows_affected == 0 {
                return Err(ServiceError::NotFound(task_id));
            }

            require_task(conn, task_id)
        })
    }

    /// Permanently remove a task.
    pub fn delete_task(&self, task_id: i64) -> ServiceResult<()> {
        self.with_conn(|conn| {
            let rows_affected = conn.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;

            if rows_affected == 0 {
                return Err(ServiceError::NotFound(task_id));
            }

            Ok(())
        })
    }

    /// Count tasks per status.
    pub fn get_task_stats(&self) -> ServiceResult<TaskStats> {
        self.with_conn(|conn| {
            let mut stats = TaskStats::default();
            let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM tasks GROUP BY status")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;

            for row in rows {
                let (status, count) = row?;
                stats.total += count;
                match status.parse::<TaskStatus>() {
                    Ok(TaskStatus::Pending) => stats.pending = count,
                    Ok(TaskStatus::InProgress) => stats.in_progress = count,
                    Ok(TaskStatus::Completed) => stats.completed = count,
                    Ok(TaskStatus::Cancelled) => stats.cancelled = count,
                    Err(e) => return Err(ServiceError::Internal(e.into())),
                }
            }

            Ok(stats)
        })
    }
}
