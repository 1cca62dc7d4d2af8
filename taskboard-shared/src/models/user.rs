/// User model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id SERIAL PRIMARY KEY,
///     full_name VARCHAR(200) NOT NULL,
///     telephone VARCHAR(20) NOT NULL,
///     email VARCHAR(200) NOT NULL
/// );
///
/// CREATE UNIQUE INDEX users_email_lower_key ON users (LOWER(email));
/// ```
///
/// Deleting a user removes its task items through `ON DELETE CASCADE` on
/// `task_items.user_id`.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::user::{User, CreateUser};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, CreateUser {
///     full_name: "Ann Lee".to_string(),
///     telephone: "+1-555-0100".to_string(),
///     email: "ann@x.com".to_string(),
/// }).await?;
///
/// // Lookups on email ignore case
/// assert!(User::email_exists(&pool, "ANN@X.COM", None).await?);
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Name of the case-insensitive unique index on `users.email`
pub const EMAIL_UNIQUE_INDEX: &str = "users_email_lower_key";

/// A user who owns task items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Generated identifier
    pub id: i32,

    /// Display name (at most 200 characters)
    pub full_name: String,

    /// Telephone number as entered
    pub telephone: String,

    /// Email address, unique across users ignoring case
    pub email: String,
}

/// Input for creating a new user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateUser {
    pub full_name: String,
    pub telephone: String,
    pub email: String,
}

/// Input for updating a user
///
/// Updates overwrite all three mutable fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateUser {
    pub full_name: String,
    pub telephone: String,
    pub email: String,
}

impl User {
    /// Inserts a new user and returns it with its generated ID
    ///
    /// # Errors
    ///
    /// Returns a database error carrying `users_email_lower_key` when the
    /// email is already taken.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (full_name, telephone, email)
            VALUES ($1, $2, $3)
            RETURNING id, full_name, telephone, email
            "#,
        )
        .bind(data.full_name)
        .bind(data.telephone)
        .bind(data.email)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, full_name, telephone, email
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Lists all users ordered by ID
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, full_name, telephone, email
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Checks whether a user with this ID exists
    pub async fn exists(pool: &PgPool, id: i32) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await?;

        Ok(exists)
    }

    /// Checks whether an email is taken, ignoring case
    ///
    /// `exclude_id` skips one user, so an update can test a new address
    /// without matching its own row.
    pub async fn email_exists(
        pool: &PgPool,
        email: &str,
        exclude_id: Option<i32>,
    ) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM users
                WHERE LOWER(email) = LOWER($1)
                  AND ($2::INTEGER IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(email)
        .bind(exclude_id)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Overwrites name, telephone and email of an existing user
    ///
    /// # Returns
    ///
    /// The updated user, or None when no row has this ID (it never existed
    /// or was deleted concurrently)
    pub async fn update(
        pool: &PgPool,
        id: i32,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET full_name = $2, telephone = $3, email = $4
            WHERE id = $1
            RETURNING id, full_name, telephone, email
            "#,
        )
        .bind(id)
        .bind(data.full_name)
        .bind(data.telephone)
        .bind(data.email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Deletes a user and, through the foreign key cascade, its task items
    ///
    /// # Returns
    ///
    /// True if a row was deleted
    pub async fn delete(pool: &PgPool, id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Case-insensitive email comparison used by the pre-write checks
    pub fn has_email(&self, email: &str) -> bool {
        self.email.to_lowercase() == email.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ann() -> User {
        User {
            id: 1,
            full_name: "Ann Lee".to_string(),
            telephone: "+1-555-0100".to_string(),
            email: "Ann@X.com".to_string(),
        }
    }

    #[test]
    fn test_has_email_ignores_case() {
        let user = ann();
        assert!(user.has_email("ann@x.com"));
        assert!(user.has_email("ANN@X.COM"));
        assert!(!user.has_email("bob@x.com"));
    }

    #[test]
    fn test_user_serializes_all_fields() {
        let value = serde_json::to_value(ann()).unwrap();
        assert_eq!(value["id"], 1);
        assert_eq!(value["full_name"], "Ann Lee");
        assert_eq!(value["email"], "Ann@X.com");
    }

    // Queries against PostgreSQL are covered in tests/pg_repository_tests.rs
}
