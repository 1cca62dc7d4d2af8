/// Task item model and database operations
///
/// A task item belongs to exactly one user. The owner is fixed at creation;
/// updates only touch title, description, due date and priority.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_priority AS ENUM ('Low', 'Medium', 'High');
///
/// CREATE TABLE task_items (
///     id SERIAL PRIMARY KEY,
///     title VARCHAR(200) NOT NULL,
///     description VARCHAR(1000) NOT NULL,
///     due_date TIMESTAMPTZ NOT NULL,
///     priority task_priority NOT NULL,
///     user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::task_item::{CreateTaskItem, Priority, TaskItem};
/// use chrono::{TimeZone, Utc};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let task = TaskItem::create(&pool, CreateTaskItem {
///     title: "Ship report".to_string(),
///     description: "Q3 report".to_string(),
///     due_date: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
///     priority: Priority::Medium,
///     user_id: 1,
/// }).await?;
///
/// let with_owner = TaskItem::find_by_id_with_user(&pool, task.id).await?;
/// # Ok(())
/// # }
/// ```

use super::user::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// Error returned when text or an ordinal does not name a priority
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Priority must be a valid value (Low, Medium, High)")]
pub struct InvalidPriority;

impl Priority {
    /// All priorities in ordinal order
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    /// Name used in storage and over the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }

    /// Maps the ordinals 0, 1 and 2 to Low, Medium and High
    pub fn from_ordinal(ordinal: i64) -> Result<Self, InvalidPriority> {
        usize::try_from(ordinal)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
            .ok_or(InvalidPriority)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a priority name, ignoring case
impl FromStr for Priority {
    type Err = InvalidPriority;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|priority| priority.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or(InvalidPriority)
    }
}

/// A task item as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskItem {
    /// Generated identifier
    pub id: i32,

    /// Short title (at most 200 characters)
    pub title: String,

    /// Free text (at most 1000 characters)
    pub description: String,

    /// When the task is due
    pub due_date: DateTime<Utc>,

    pub priority: Priority,

    /// Owning user
    pub user_id: i32,
}

/// A task item joined with its owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskItemWithUser {
    #[serde(flatten)]
    pub task: TaskItem,

    pub user: User,
}

/// Input for creating a task item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTaskItem {
    pub title: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub priority: Priority,
    pub user_id: i32,
}

/// Input for updating a task item (the owner cannot change)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTaskItem {
    pub title: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub priority: Priority,
}

/// Flat row produced by the task/owner join
#[derive(Debug, sqlx::FromRow)]
struct TaskItemUserRow {
    id: i32,
    title: String,
    description: String,
    due_date: DateTime<Utc>,
    priority: Priority,
    user_id: i32,
    owner_full_name: String,
    owner_telephone: String,
    owner_email: String,
}

impl From<TaskItemUserRow> for TaskItemWithUser {
    fn from(row: TaskItemUserRow) -> Self {
        TaskItemWithUser {
            user: User {
                id: row.user_id,
                full_name: row.owner_full_name,
                telephone: row.owner_telephone,
                email: row.owner_email,
            },
            task: TaskItem {
                id: row.id,
                title: row.title,
                description: row.description,
                due_date: row.due_date,
                priority: row.priority,
                user_id: row.user_id,
            },
        }
    }
}

const SELECT_WITH_USER: &str = r#"
    SELECT t.id, t.title, t.description, t.due_date, t.priority, t.user_id,
           u.full_name AS owner_full_name,
           u.telephone AS owner_telephone,
           u.email AS owner_email
    FROM task_items t
    INNER JOIN users u ON u.id = t.user_id
"#;

impl TaskItem {
    /// Inserts a task item
    ///
    /// # Errors
    ///
    /// Returns a foreign key violation when `user_id` references no user.
    pub async fn create(pool: &PgPool, data: CreateTaskItem) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, TaskItem>(
            r#"
            INSERT INTO task_items (title, description, due_date, priority, user_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, description, due_date, priority, user_id
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.due_date)
        .bind(data.priority)
        .bind(data.user_id)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task item by ID without its owner
    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, TaskItem>(
            r#"
            SELECT id, title, description, due_date, priority, user_id
            FROM task_items
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task item by ID with its owner joined
    pub async fn find_by_id_with_user(
        pool: &PgPool,
        id: i32,
    ) -> Result<Option<TaskItemWithUser>, sqlx::Error> {
        let query = format!("{} WHERE t.id = $1", SELECT_WITH_USER);

        let row = sqlx::query_as::<_, TaskItemUserRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(TaskItemWithUser::from))
    }

    /// Lists all task items with their owners, ordered by task ID
    pub async fn list_with_user(pool: &PgPool) -> Result<Vec<TaskItemWithUser>, sqlx::Error> {
        let query = format!("{} ORDER BY t.id", SELECT_WITH_USER);

        let rows = sqlx::query_as::<_, TaskItemUserRow>(&query)
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(TaskItemWithUser::from).collect())
    }

    /// Checks whether a task item with this ID exists
    pub async fn exists(pool: &PgPool, id: i32) -> Result<bool, sqlx::Error> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM task_items WHERE id = $1)")
                .bind(id)
                .fetch_one(pool)
                .await?;

        Ok(exists)
    }

    /// Overwrites the four mutable fields
    ///
    /// # Returns
    ///
    /// The updated task item, or None when no row has this ID
    pub async fn update(
        pool: &PgPool,
        id: i32,
        data: UpdateTaskItem,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, TaskItem>(
            r#"
            UPDATE task_items
            SET title = $2, description = $3, due_date = $4, priority = $5
            WHERE id = $1
            RETURNING id, title, description, due_date, priority, user_id
            "#,
        )
        .bind(id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.due_date)
        .bind(data.priority)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Deletes a task item
    ///
    /// # Returns
    ///
    /// True if a row was deleted
    pub async fn delete(pool: &PgPool, id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM task_items WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
