/// Task model and database operations
///
/// Tasks are created by admin-rank users and assigned to a worker. Each task
/// carries a human-readable `TASK-NNNNN` identifier alongside its opaque row
/// id.
///
/// # Status
///
/// Three states, all mutually reachable (a completed task may be reopened);
/// creation always starts at `pending`.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('pending', 'in-progress', 'completed');
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     task_id VARCHAR(16) NOT NULL UNIQUE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     status task_status NOT NULL DEFAULT 'pending',
///     priority task_priority NOT NULL,
///     due_date VARCHAR(32) NOT NULL,
///     assigned_to UUID NOT NULL REFERENCES users(id),
///     assigned_by UUID NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::task_id::{random_task_id, TaskIdError, MAX_ATTEMPTS};

/// Task workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Not yet started; the status every task is created with
    Pending,

    /// Being worked on
    InProgress,

    /// Finished; may still be reopened
    Completed,
}

impl TaskStatus {
    /// Converts status to its wire/database string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

/// Task model representing an assignable task
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task row ID
    pub id: Uuid,

    /// Human-readable identifier (TASK-NNNNN), unique among all tasks
    pub task_id: String,

    /// Short title
    pub title: String,

    /// Longer description of the work
    pub description: String,

    /// Current workflow status
    pub status: TaskStatus,

    /// Priority level
    pub priority: TaskPriority,

    /// Due date (string-encoded calendar date, e.g. "2026-09-15")
    pub due_date: String,

    /// User the task is assigned to
    pub assigned_to: Uuid,

    /// User who created the task; captured at creation, immutable
    pub assigned_by: Uuid,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
///
/// Status is not an input: every task starts at `pending`. The creator
/// becomes `assigned_by`.
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: String,
    pub assigned_to: Uuid,
    pub assigned_by: Uuid,
    pub due_date: String,
    pub priority: TaskPriority,
}

/// Input for a full-field task update
#[derive(Debug, Clone)]
pub struct UpdateTask {
    pub title: String,
    pub description: String,
    pub assigned_to: Uuid,
    pub due_date: String,
    pub priority: TaskPriority,
    pub status: TaskStatus,
}

const TASK_COLUMNS: &str = "id, task_id, title, description, status, priority, due_date, \
                            assigned_to, assigned_by, created_at, updated_at";

impl Task {
    /// Creates a new task in pending status, allocating a unique task id
    ///
    /// A fresh random `TASK-NNNNN` candidate is generated for each insert
    /// attempt; collisions with the unique constraint on `task_id` retry the
    /// insert itself, so concurrent creations cannot both claim the same
    /// identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskIdError::Exhausted`] when every attempt collided, or
    /// [`TaskIdError::Database`] for any other database failure.
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, TaskIdError> {
        for _ in 0..MAX_ATTEMPTS {
            let candidate = random_task_id();

            let result = sqlx::query_as::<_, Task>(&format!(
                r#"
                INSERT INTO tasks (task_id, title, description, priority, due_date,
                                   assigned_to, assigned_by)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING {TASK_COLUMNS}
                "#,
            ))
            .bind(&candidate)
            .bind(&data.title)
            .bind(&data.description)
            .bind(data.priority)
            .bind(&data.due_date)
            .bind(data.assigned_to)
            .bind(data.assigned_by)
            .fetch_one(pool)
            .await;

            match result {
                Ok(task) => return Ok(task),
                Err(e) if is_task_id_collision(&e) => {
                    tracing::debug!(task_id = %candidate, "Task id collision, retrying");
                    continue;
                }
                Err(e) => return Err(TaskIdError::Database(e)),
            }
        }

        Err(TaskIdError::Exhausted(MAX_ATTEMPTS))
    }

    /// Finds a task by row ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists tasks with keyset pagination
    ///
    /// Rows are ordered by id ascending; `cursor` is the last-seen id from
    /// the previous page.
    pub async fn list(
        pool: &PgPool,
        limit: i64,
        cursor: Option<Uuid>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE ($1::uuid IS NULL OR id > $1)
            ORDER BY id ASC
            LIMIT $2
            "#,
        ))
        .bind(cursor)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Lists all tasks assigned to a user
    pub async fn list_by_assignee(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE assigned_to = $1",
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Full-field replace of a task's editable fields
    ///
    /// `task_id` and `assigned_by` are immutable and untouched. Returns
    /// `None` if the task does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET title = $2,
                description = $3,
                assigned_to = $4,
                due_date = $5,
                priority = $6,
                status = $7,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.assigned_to)
        .bind(data.due_date)
        .bind(data.priority)
        .bind(data.status)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Updates only the status field
    ///
    /// Any status may move to any other status; there is no forward-only
    /// ordering. Returns `None` if the task does not exist.
    pub async fn set_status(
        pool: &PgPool,
        id: Uuid,
        status: TaskStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Deletes a task
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Whether a database error is a unique violation on the task_id constraint
fn is_task_id_collision(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err
            .constraint()
            .map(|c| c.contains("task_id"))
            .unwrap_or(false),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(TaskStatus::Pending.as_str(), "pending");
        assert_eq!(TaskStatus::InProgress.as_str(), "in-progress");
        assert_eq!(TaskStatus::Completed.as_str(), "completed");
    }

    #[test]
    fn test_status_serde_wire_format() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"in-progress\""
        );

        let status: TaskStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(status, TaskStatus::Completed);
    }

    #[test]
    fn test_priority_as_str() {
        assert_eq!(TaskPriority::Low.as_str(), "low");
        assert_eq!(TaskPriority::Medium.as_str(), "medium");
        assert_eq!(TaskPriority::High.as_str(), "high");
    }

    #[test]
    fn test_priority_serde_wire_format() {
        assert_eq!(serde_json::to_string(&TaskPriority::High).unwrap(), "\"high\"");

        let priority: TaskPriority = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(priority, TaskPriority::Medium);
    }

    // Integration tests for database operations require a running database
}
