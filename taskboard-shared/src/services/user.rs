/// User service
///
/// # Rules
///
/// - Emails are unique ignoring case. The service checks before writing and
///   also maps a unique-index rejection from the store to `Conflict`, since
///   two concurrent requests can both pass the check.
/// - Updating a user to its own email (in any case) is never a conflict.
/// - An update or delete that finds no row re-checks existence and reports
///   `NotFound`.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskboard_shared::models::user::CreateUser;
/// use taskboard_shared::repository::InMemoryStore;
/// use taskboard_shared::services::UserService;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let service = UserService::new(Arc::new(InMemoryStore::new()));
/// let cancel = CancellationToken::new();
///
/// let user = service
///     .create_user(
///         CreateUser {
///             full_name: "Ann Lee".to_string(),
///             telephone: "+1-555-0100".to_string(),
///             email: "ann@x.com".to_string(),
///         },
///         &cancel,
///     )
///     .await?;
/// # Ok(())
/// # }
/// ```

use crate::error::{RepositoryError, ServiceError, ServiceResult};
use crate::models::user::{CreateUser, UpdateUser, User};
use crate::repository::UserRepository;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Lists every user
    pub async fn list_users(&self, cancel: &CancellationToken) -> ServiceResult<Vec<User>> {
        let users = self.users.list(cancel).await?;
        debug!(count = users.len(), "Listed users");
        Ok(users)
    }

    /// Gets one user
    ///
    /// # Errors
    ///
    /// `NotFound` when no user has this ID
    pub async fn get_user(&self, id: i32, cancel: &CancellationToken) -> ServiceResult<User> {
        self.users
            .find_by_id(id, cancel)
            .await?
            .ok_or_else(|| ServiceError::user_not_found(id))
    }

    /// Creates a user
    ///
    /// # Errors
    ///
    /// `Conflict` when the email (ignoring case) already belongs to a user
    pub async fn create_user(
        &self,
        data: CreateUser,
        cancel: &CancellationToken,
    ) -> ServiceResult<User> {
        if self.users.email_exists(&data.email, None, cancel).await? {
            warn!(email = %data.email, "Rejected user with duplicate email");
            return Err(ServiceError::email_taken(&data.email));
        }

        let email = data.email.clone();
        let user = self
            .users
            .insert(data, cancel)
            .await
            .map_err(|err| conflict_on_unique(err, &email))?;

        info!(user_id = user.id, "User created");
        Ok(user)
    }

    /// Overwrites a user's name, telephone and email
    ///
    /// # Errors
    ///
    /// - `NotFound` when no user has this ID
    /// - `Conflict` when the email changes to one held by another user
    pub async fn update_user(
        &self,
        id: i32,
        data: UpdateUser,
        cancel: &CancellationToken,
    ) -> ServiceResult<User> {
        let current = self.get_user(id, cancel).await?;

        if !current.has_email(&data.email)
            && self.users.email_exists(&data.email, Some(id), cancel).await?
        {
            warn!(user_id = id, email = %data.email, "Rejected email change to a taken address");
            return Err(ServiceError::email_taken(&data.email));
        }

        let email = data.email.clone();
        let updated = self
            .users
            .update(id, data, cancel)
            .await
            .map_err(|err| conflict_on_unique(err, &email))?;

        match updated {
            Some(user) => {
                info!(user_id = id, "User updated");
                Ok(user)
            }
            None => Err(self.vanished(id, cancel).await),
        }
    }

    /// Deletes a user together with its task items
    ///
    /// # Errors
    ///
    /// `NotFound` when no user has this ID
    pub async fn delete_user(&self, id: i32, cancel: &CancellationToken) -> ServiceResult<()> {
        if !self.users.exists(id, cancel).await? {
            return Err(ServiceError::user_not_found(id));
        }

        if !self.users.delete(id, cancel).await? {
            return Err(self.vanished(id, cancel).await);
        }

        info!(user_id = id, "User deleted with its task items");
        Ok(())
    }

    /// Explains a write that matched no row after the existence check passed
    async fn vanished(&self, id: i32, cancel: &CancellationToken) -> ServiceError {
        match self.users.exists(id, cancel).await {
            Ok(false) => {
                debug!(user_id = id, "User removed concurrently");
                ServiceError::user_not_found(id)
            }
            Ok(true) => ServiceError::Unexpected(format!(
                "User with ID {} exists but the write matched no row.",
                id
            )),
            Err(err) => err.into(),
        }
    }
}

fn conflict_on_unique(err: RepositoryError, email: &str) -> ServiceError {
    match err {
        RepositoryError::UniqueViolation(_) => {
            warn!(email = %email, "Unique index rejected duplicate email");
            ServiceError::email_taken(email)
        }
        other => other.into(),
    }
}
