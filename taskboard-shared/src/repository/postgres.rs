/// PostgreSQL repositories
///
/// Thin adapters from the repository traits onto the model queries. Each
/// query races the caller's cancellation token; losing the race drops the
/// query future, which releases the connection back to the pool.

use super::{TaskItemRepository, UserRepository};
use crate::error::{RepositoryError, RepositoryResult};
use crate::models::task_item::{CreateTaskItem, TaskItem, TaskItemWithUser, UpdateTaskItem};
use crate::models::user::{CreateUser, UpdateUser, User};
use async_trait::async_trait;
use sqlx::PgPool;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Awaits a query unless the token fires first
async fn cancellable<T, F>(cancel: &CancellationToken, query: F) -> RepositoryResult<T>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::debug!("Query aborted by cancellation");
            Err(RepositoryError::Cancelled)
        }
        result = query => result.map_err(RepositoryError::from),
    }
}

/// User repository backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn list(&self, cancel: &CancellationToken) -> RepositoryResult<Vec<User>> {
        cancellable(cancel, User::list(&self.pool)).await
    }

    async fn find_by_id(
        &self,
        id: i32,
        cancel: &CancellationToken,
    ) -> RepositoryResult<Option<User>> {
        cancellable(cancel, User::find_by_id(&self.pool, id)).await
    }

    async fn exists(&self, id: i32, cancel: &CancellationToken) -> RepositoryResult<bool> {
        cancellable(cancel, User::exists(&self.pool, id)).await
    }

    async fn email_exists(
        &self,
        email: &str,
        exclude_id: Option<i32>,
        cancel: &CancellationToken,
    ) -> RepositoryResult<bool> {
        cancellable(cancel, User::email_exists(&self.pool, email, exclude_id)).await
    }

    async fn insert(&self, data: CreateUser, cancel: &CancellationToken) -> RepositoryResult<User> {
        cancellable(cancel, User::create(&self.pool, data)).await
    }

    async fn update(
        &self,
        id: i32,
        data: UpdateUser,
        cancel: &CancellationToken,
    ) -> RepositoryResult<Option<User>> {
        cancellable(cancel, User::update(&self.pool, id, data)).await
    }

    async fn delete(&self, id: i32, cancel: &CancellationToken) -> RepositoryResult<bool> {
        cancellable(cancel, User::delete(&self.pool, id)).await
    }
}

/// Task item repository backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PgTaskItemRepository {
    pool: PgPool,
}

impl PgTaskItemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskItemRepository for PgTaskItemRepository {
    async fn list_with_user(
        &self,
        cancel: &CancellationToken,
    ) -> RepositoryResult<Vec<TaskItemWithUser>> {
        cancellable(cancel, TaskItem::list_with_user(&self.pool)).await
    }

    async fn find_by_id_with_user(
        &self,
        id: i32,
        cancel: &CancellationToken,
    ) -> RepositoryResult<Option<TaskItemWithUser>> {
        cancellable(cancel, TaskItem::find_by_id_with_user(&self.pool, id)).await
    }

    async fn find_by_id(
        &self,
        id: i32,
        cancel: &CancellationToken,
    ) -> RepositoryResult<Option<TaskItem>> {
        cancellable(cancel, TaskItem::find_by_id(&self.pool, id)).await
    }

    async fn exists(&self, id: i32, cancel: &CancellationToken) -> RepositoryResult<bool> {
        cancellable(cancel, TaskItem::exists(&self.pool, id)).await
    }

    async fn user_exists(
        &self,
        user_id: i32,
        cancel: &CancellationToken,
    ) -> RepositoryResult<bool> {
        cancellable(cancel, User::exists(&self.pool, user_id)).await
    }

    async fn insert(
        &self,
        data: CreateTaskItem,
        cancel: &CancellationToken,
    ) -> RepositoryResult<TaskItem> {
        cancellable(cancel, TaskItem::create(&self.pool, data)).await
    }

    async fn update(
        &self,
        id: i32,
        data: UpdateTaskItem,
        cancel: &CancellationToken,
    ) -> RepositoryResult<Option<TaskItem>> {
        cancellable(cancel, TaskItem::update(&self.pool, id, data)).await
    }

    async fn delete(&self, id: i32, cancel: &CancellationToken) -> RepositoryResult<bool> {
        cancellable(cancel, TaskItem::delete(&self.pool, id)).await
    }
}
