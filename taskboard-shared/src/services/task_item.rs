/// Task item service
///
/// A task item can only be created for an existing user; the owner is never
/// reassigned afterwards. Reads always return the owner joined in.

use crate::error::{RepositoryError, ServiceError, ServiceResult};
use crate::models::task_item::{CreateTaskItem, TaskItemWithUser, UpdateTaskItem};
use crate::repository::TaskItemRepository;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct TaskItemService {
    task_items: Arc<dyn TaskItemRepository>,
}

impl TaskItemService {
    pub fn new(task_items: Arc<dyn TaskItemRepository>) -> Self {
        Self { task_items }
    }

    /// Lists every task item with its owner
    pub async fn list_tasks(
        &self,
        cancel: &CancellationToken,
    ) -> ServiceResult<Vec<TaskItemWithUser>> {
        let tasks = self.task_items.list_with_user(cancel).await?;
        debug!(count = tasks.len(), "Listed task items");
        Ok(tasks)
    }

    /// Gets one task item with its owner
    ///
    /// # Errors
    ///
    /// `NotFound` when no task item has this ID
    pub async fn get_task(
        &self,
        id: i32,
        cancel: &CancellationToken,
    ) -> ServiceResult<TaskItemWithUser> {
        self.task_items
            .find_by_id_with_user(id, cancel)
            .await?
            .ok_or_else(|| ServiceError::task_item_not_found(id))
    }

    /// Creates a task item for an existing user
    ///
    /// # Errors
    ///
    /// - `BadArgument` when `user_id` is not positive
    /// - `NotFound` when the user does not exist, including when it is
    ///   deleted between the check and the insert
    pub async fn create_task(
        &self,
        data: CreateTaskItem,
        cancel: &CancellationToken,
    ) -> ServiceResult<TaskItemWithUser> {
        let user_id = data.user_id;
        if user_id <= 0 {
            return Err(ServiceError::BadArgument(
                "User ID must be greater than 0".to_string(),
            ));
        }

        if !self.task_items.user_exists(user_id, cancel).await? {
            warn!(user_id, "Rejected task item for missing user");
            return Err(ServiceError::user_not_found(user_id));
        }

        let task = self
            .task_items
            .insert(data, cancel)
            .await
            .map_err(|err| match err {
                RepositoryError::ForeignKeyViolation(_) => {
                    warn!(user_id, "Owner removed before task item insert");
                    ServiceError::user_not_found(user_id)
                }
                other => other.into(),
            })?;

        info!(task_item_id = task.id, user_id, "Task item created");

        // The owner can be deleted (cascading this row) before the reload
        self.task_items
            .find_by_id_with_user(task.id, cancel)
            .await?
            .ok_or_else(|| ServiceError::user_not_found(user_id))
    }

    /// Overwrites title, description, due date and priority
    ///
    /// # Errors
    ///
    /// `NotFound` when no task item has this ID
    pub async fn update_task(
        &self,
        id: i32,
        data: UpdateTaskItem,
        cancel: &CancellationToken,
    ) -> ServiceResult<()> {
        if !self.task_items.exists(id, cancel).await? {
            return Err(ServiceError::task_item_not_found(id));
        }

        match self.task_items.update(id, data, cancel).await? {
            Some(_) => {
                info!(task_item_id = id, "Task item updated");
                Ok(())
            }
            None => Err(self.vanished(id, cancel).await),
        }
    }

    /// Deletes a task item
    ///
    /// # Errors
    ///
    /// `NotFound` when no task item has this ID
    pub async fn delete_task(&self, id: i32, cancel: &CancellationToken) -> ServiceResult<()> {
        if !self.task_items.exists(id, cancel).await? {
            return Err(ServiceError::task_item_not_found(id));
        }

        if !self.task_items.delete(id, cancel).await? {
            return Err(self.vanished(id, cancel).await);
        }

        info!(task_item_id = id, "Task item deleted");
        Ok(())
    }

    async fn vanished(&self, id: i32, cancel: &CancellationToken) -> ServiceError {
        match self.task_items.exists(id, cancel).await {
            Ok(false) => {
                debug!(task_item_id = id, "Task item removed concurrently");
                ServiceError::task_item_not_found(id)
            }
            Ok(true) => ServiceError::Unexpected(format!(
                "Task item with ID {} exists but the write matched no row.",
                id
            )),
            Err(err) => err.into(),
        }
    }
}
