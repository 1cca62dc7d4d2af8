/// Repository traits
///
/// Services talk to storage only through these traits, so the same business
/// rules run against PostgreSQL in production and against the in-memory
/// store in tests.
///
/// Every method takes a [`CancellationToken`]. When the token fires before
/// the store answers, the pending query future is dropped and the method
/// returns [`RepositoryError::Cancelled`](crate::error::RepositoryError::Cancelled).
///
/// # Implementations
///
/// - [`postgres::PgUserRepository`] / [`postgres::PgTaskItemRepository`]
/// - [`memory::InMemoryStore`] (implements both traits over one shared state
///   so the foreign key and cascade rules hold)

pub mod memory;
pub mod postgres;

use crate::error::RepositoryResult;
use crate::models::task_item::{CreateTaskItem, TaskItem, TaskItemWithUser, UpdateTaskItem};
use crate::models::user::{CreateUser, UpdateUser, User};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

pub use memory::InMemoryStore;
pub use postgres::{PgTaskItemRepository, PgUserRepository};

/// Persistence for users
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// All users, ordered by ID
    async fn list(&self, cancel: &CancellationToken) -> RepositoryResult<Vec<User>>;

    async fn find_by_id(&self, id: i32, cancel: &CancellationToken)
        -> RepositoryResult<Option<User>>;

    async fn exists(&self, id: i32, cancel: &CancellationToken) -> RepositoryResult<bool>;

    /// Case-insensitive email lookup, optionally ignoring one user
    async fn email_exists(
        &self,
        email: &str,
        exclude_id: Option<i32>,
        cancel: &CancellationToken,
    ) -> RepositoryResult<bool>;

    /// Fails with `UniqueViolation` when the email is taken
    async fn insert(&self, data: CreateUser, cancel: &CancellationToken) -> RepositoryResult<User>;

    /// Returns None when the row does not exist
    async fn update(
        &self,
        id: i32,
        data: UpdateUser,
        cancel: &CancellationToken,
    ) -> RepositoryResult<Option<User>>;

    /// Deletes the user and its task items; false when nothing was deleted
    async fn delete(&self, id: i32, cancel: &CancellationToken) -> RepositoryResult<bool>;
}

/// Persistence for task items
#[async_trait]
pub trait TaskItemRepository: Send + Sync {
    /// All task items with owners, ordered by ID
    async fn list_with_user(
        &self,
        cancel: &CancellationToken,
    ) -> RepositoryResult<Vec<TaskItemWithUser>>;

    async fn find_by_id_with_user(
        &self,
        id: i32,
        cancel: &CancellationToken,
    ) -> RepositoryResult<Option<TaskItemWithUser>>;

    async fn find_by_id(
        &self,
        id: i32,
        cancel: &CancellationToken,
    ) -> RepositoryResult<Option<TaskItem>>;

    async fn exists(&self, id: i32, cancel: &CancellationToken) -> RepositoryResult<bool>;

    async fn user_exists(&self, user_id: i32, cancel: &CancellationToken)
        -> RepositoryResult<bool>;

    /// Fails with `ForeignKeyViolation` when the owner does not exist
    async fn insert(
        &self,
        data: CreateTaskItem,
        cancel: &CancellationToken,
    ) -> RepositoryResult<TaskItem>;

    /// Returns None when the row does not exist
    async fn update(
        &self,
        id: i32,
        data: UpdateTaskItem,
        cancel: &CancellationToken,
    ) -> RepositoryResult<Option<TaskItem>>;

    /// False when nothing was deleted
    async fn delete(&self, id: i32, cancel: &CancellationToken) -> RepositoryResult<bool>;
}
