/// Database models for Taskboard
///
/// This module contains the two persisted entities and their queries.
///
/// # Models
///
/// - `user`: Users who own task items
/// - `task_item`: Task items, each owned by exactly one user
///
/// Relationships are plain foreign keys. Queries that need the owner join it
/// explicitly and return [`task_item::TaskItemWithUser`].
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::user::{User, CreateUser};
/// use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let new_user = CreateUser {
///     full_name: "Ann Lee".to_string(),
///     telephone: "+1-555-0100".to_string(),
///     email: "ann@x.com".to_string(),
/// };
///
/// let user = User::create(&pool, new_user).await?;
/// # Ok(())
/// # }
/// ```

pub mod task_item;
pub mod user;
