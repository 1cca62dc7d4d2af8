//! In-memory repository implementation.
//!
//! [`InMemoryStore`] keeps users and task items in two ordered maps behind a
//! single `tokio::sync::RwLock`. It enforces the same rules the PostgreSQL
//! schema does:
//!
//! - emails are unique ignoring case (`users_email_lower_key`)
//! - a task item must reference an existing user (`task_items_user_id_fkey`)
//! - deleting a user deletes its task items in the same critical section
//!
//! Clones share state, so one store can back both repository traits.

use super::{TaskItemRepository, UserRepository};
use crate::error::{RepositoryError, RepositoryResult};
use crate::models::task_item::{CreateTaskItem, TaskItem, TaskItemWithUser, UpdateTaskItem};
use crate::models::user::{CreateUser, UpdateUser, User, EMAIL_UNIQUE_INDEX};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

/// Name of the foreign key from task items to users
const USER_FOREIGN_KEY: &str = "task_items_user_id_fkey";

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i32, User>,
    task_items: BTreeMap<i32, TaskItem>,
    last_user_id: i32,
    last_task_item_id: i32,
}

impl Tables {
    fn email_taken(&self, email: &str, exclude_id: Option<i32>) -> bool {
        self.users
            .values()
            .any(|user| Some(user.id) != exclude_id && user.has_email(email))
    }

    fn with_user(&self, task: &TaskItem) -> Option<TaskItemWithUser> {
        self.users.get(&task.user_id).map(|user| TaskItemWithUser {
            task: task.clone(),
            user: user.clone(),
        })
    }
}

/// Shared in-memory backend for both repositories
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    /// Creates an empty store; IDs start at 1
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of task items owned by a user
    pub async fn count_task_items_for(&self, user_id: i32) -> usize {
        self.tables
            .read()
            .await
            .task_items
            .values()
            .filter(|task| task.user_id == user_id)
            .count()
    }
}

fn ensure_live(cancel: &CancellationToken) -> RepositoryResult<()> {
    if cancel.is_cancelled() {
        Err(RepositoryError::Cancelled)
    } else {
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn list(&self, cancel: &CancellationToken) -> RepositoryResult<Vec<User>> {
        ensure_live(cancel)?;
        Ok(self.tables.read().await.users.values().cloned().collect())
    }

    async fn find_by_id(
        &self,
        id: i32,
        cancel: &CancellationToken,
    ) -> RepositoryResult<Option<User>> {
        ensure_live(cancel)?;
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn exists(&self, id: i32, cancel: &CancellationToken) -> RepositoryResult<bool> {
        ensure_live(cancel)?;
        Ok(self.tables.read().await.users.contains_key(&id))
    }

    async fn email_exists(
        &self,
        email: &str,
        exclude_id: Option<i32>,
        cancel: &CancellationToken,
    ) -> RepositoryResult<bool> {
        ensure_live(cancel)?;
        Ok(self.tables.read().await.email_taken(email, exclude_id))
    }

    async fn insert(&self, data: CreateUser, cancel: &CancellationToken) -> RepositoryResult<User> {
        ensure_live(cancel)?;
        let mut tables = self.tables.write().await;

        if tables.email_taken(&data.email, None) {
            return Err(RepositoryError::UniqueViolation(EMAIL_UNIQUE_INDEX.to_string()));
        }

        tables.last_user_id += 1;
        let user = User {
            id: tables.last_user_id,
            full_name: data.full_name,
            telephone: data.telephone,
            email: data.email,
        };
        tables.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn update(
        &self,
        id: i32,
        data: UpdateUser,
        cancel: &CancellationToken,
    ) -> RepositoryResult<Option<User>> {
        ensure_live(cancel)?;
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&id) {
            return Ok(None);
        }
        if tables.email_taken(&data.email, Some(id)) {
            return Err(RepositoryError::UniqueViolation(EMAIL_UNIQUE_INDEX.to_string()));
        }

        let user = User {
            id,
            full_name: data.full_name,
            telephone: data.telephone,
            email: data.email,
        };
        tables.users.insert(id, user.clone());

        Ok(Some(user))
    }

    async fn delete(&self, id: i32, cancel: &CancellationToken) -> RepositoryResult<bool> {
        ensure_live(cancel)?;
        let mut tables = self.tables.write().await;

        if tables.users.remove(&id).is_none() {
            return Ok(false);
        }
        tables.task_items.retain(|_, task| task.user_id != id);

        Ok(true)
    }
}

#[async_trait]
impl TaskItemRepository for InMemoryStore {
    async fn list_with_user(
        &self,
        cancel: &CancellationToken,
    ) -> RepositoryResult<Vec<TaskItemWithUser>> {
        ensure_live(cancel)?;
        let tables = self.tables.read().await;

        Ok(tables
            .task_items
            .values()
            .filter_map(|task| tables.with_user(task))
            .collect())
    }

    async fn find_by_id_with_user(
        &self,
        id: i32,
        cancel: &CancellationToken,
    ) -> RepositoryResult<Option<TaskItemWithUser>> {
        ensure_live(cancel)?;
        let tables = self.tables.read().await;

        Ok(tables.task_items.get(&id).and_then(|task| tables.with_user(task)))
    }

    async fn find_by_id(
        &self,
        id: i32,
        cancel: &CancellationToken,
    ) -> RepositoryResult<Option<TaskItem>> {
        ensure_live(cancel)?;
        Ok(self.tables.read().await.task_items.get(&id).cloned())
    }

    async fn exists(&self, id: i32, cancel: &CancellationToken) -> RepositoryResult<bool> {
        ensure_live(cancel)?;
        Ok(self.tables.read().await.task_items.contains_key(&id))
    }

    async fn user_exists(
        &self,
        user_id: i32,
        cancel: &CancellationToken,
    ) -> RepositoryResult<bool> {
        ensure_live(cancel)?;
        Ok(self.tables.read().await.users.contains_key(&user_id))
    }

    async fn insert(
        &self,
        data: CreateTaskItem,
        cancel: &CancellationToken,
    ) -> RepositoryResult<TaskItem> {
        ensure_live(cancel)?;
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&data.user_id) {
            return Err(RepositoryError::ForeignKeyViolation(USER_FOREIGN_KEY.to_string()));
        }

        tables.last_task_item_id += 1;
        let task = TaskItem {
            id: tables.last_task_item_id,
            title: data.title,
            description: data.description,
            due_date: data.due_date,
            priority: data.priority,
            user_id: data.user_id,
        };
        tables.task_items.insert(task.id, task.clone());

        Ok(task)
    }

    async fn update(
        &self,
        id: i32,
        data: UpdateTaskItem,
        cancel: &CancellationToken,
    ) -> RepositoryResult<Option<TaskItem>> {
        ensure_live(cancel)?;
        let mut tables = self.tables.write().await;

        Ok(tables.task_items.get_mut(&id).map(|task| {
            task.title = data.title;
            task.description = data.description;
            task.due_date = data.due_date;
            task.priority = data.priority;
            task.clone()
        }))
    }

    async fn delete(&self, id: i32, cancel: &CancellationToken) -> RepositoryResult<bool> {
        ensure_live(cancel)?;
        Ok(self.tables.write().await.task_items.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task_item::Priority;
    use chrono::{TimeZone, Utc};

    fn new_user(email: &str) -> CreateUser {
        CreateUser {
            full_name: "Ann Lee".to_string(),
            telephone: "+1-555-0100".to_string(),
            email: email.to_string(),
        }
    }

    fn new_task(user_id: i32) -> CreateTaskItem {
        CreateTaskItem {
            title: "Ship report".to_string(),
            description: "Q3 report".to_string(),
            due_date: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            priority: Priority::Medium,
            user_id,
        }
    }

    #[tokio::test]
    async fn test_ids_are_generated_sequentially() {
        let store = InMemoryStore::new();
        let cancel = CancellationToken::new();

        let first = UserRepository::insert(&store, new_user("a@x.com"), &cancel).await.unwrap();
        let second = UserRepository::insert(&store, new_user("b@x.com"), &cancel).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn test_unique_email_ignores_case() {
        let store = InMemoryStore::new();
        let cancel = CancellationToken::new();

        UserRepository::insert(&store, new_user("ann@x.com"), &cancel).await.unwrap();
        let err = UserRepository::insert(&store, new_user("ANN@x.com"), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::UniqueViolation(ref name) if name == EMAIL_UNIQUE_INDEX));
    }

    #[tokio::test]
    async fn test_task_requires_existing_user() {
        let store = InMemoryStore::new();
        let cancel = CancellationToken::new();

        let err = TaskItemRepository::insert(&store, new_task(99), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::ForeignKeyViolation(_)));
        assert!(TaskItemRepository::list_with_user(&store, &cancel).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_user_delete_cascades() {
        let store = InMemoryStore::new();
        let cancel = CancellationToken::new();

        let ann = UserRepository::insert(&store, new_user("ann@x.com"), &cancel).await.unwrap();
        let bob = UserRepository::insert(&store, new_user("bob@x.com"), &cancel).await.unwrap();
        TaskItemRepository::insert(&store, new_task(ann.id), &cancel).await.unwrap();
        TaskItemRepository::insert(&store, new_task(ann.id), &cancel).await.unwrap();
        let kept = TaskItemRepository::insert(&store, new_task(bob.id), &cancel).await.unwrap();

        assert!(UserRepository::delete(&store, ann.id, &cancel).await.unwrap());

        assert_eq!(store.count_task_items_for(ann.id).await, 0);
        let remaining = TaskItemRepository::list_with_user(&store, &cancel).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].task.id, kept.id);
    }

    #[tokio::test]
    async fn test_cancelled_token_short_circuits() {
        let store = InMemoryStore::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = UserRepository::list(&store, &cancel).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Cancelled));
    }

    #[tokio::test]
    async fn test_update_missing_rows_return_none() {
        let store = InMemoryStore::new();
        let cancel = CancellationToken::new();

        let user = UserRepository::update(
            &store,
            5,
            UpdateUser {
                full_name: "Nobody".to_string(),
                telephone: "555".to_string(),
                email: "nobody@x.com".to_string(),
            },
            &cancel,
        )
        .await
        .unwrap();
        assert!(user.is_none());

        assert!(!TaskItemRepository::delete(&store, 5, &cancel).await.unwrap());
    }
}
