/// Error types for the persistence and service layers
///
/// Two layers, two enums:
///
/// - [`RepositoryError`] describes what the store reported (constraint
///   violations, cancellation, driver failures).
/// - [`ServiceError`] describes the business outcome (not found, conflict,
///   bad argument, cancelled, unexpected).
///
/// Services translate the former into the latter. Neither type knows about
/// HTTP; the API crate owns the mapping to status codes.

use thiserror::Error;

/// Result alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Result alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failures reported by a repository backend
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A unique index rejected the write (constraint name attached)
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A foreign key rejected the write (constraint name attached)
    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    /// The caller's cancellation token fired before the store answered
    #[error("Storage operation cancelled")]
    Cancelled,

    /// Any other driver or connection failure
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err.constraint().unwrap_or_default().to_string();

            if db_err.is_unique_violation() {
                return RepositoryError::UniqueViolation(constraint);
            }
            if db_err.is_foreign_key_violation() {
                return RepositoryError::ForeignKeyViolation(constraint);
            }
        }

        RepositoryError::Database(err)
    }
}

/// Business-level failures raised by the services
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The addressed entity does not exist
    #[error("{0}")]
    NotFound(String),

    /// A uniqueness rule would be broken (duplicate email)
    #[error("{0}")]
    Conflict(String),

    /// An argument is outside the accepted domain
    #[error("{0}")]
    BadArgument(String),

    /// The operation was aborted through its cancellation token
    #[error("Operation cancelled")]
    Cancelled,

    /// A state the service cannot explain (e.g. a row vanished mid-request
    /// and then reappeared)
    #[error("Unexpected failure: {0}")]
    Unexpected(String),

    /// A repository failure with no business meaning
    #[error(transparent)]
    Repository(RepositoryError),
}

impl ServiceError {
    /// `User with ID {id} not found.`
    pub fn user_not_found(id: i32) -> Self {
        ServiceError::NotFound(format!("User with ID {} not found.", id))
    }

    /// `Task item with ID {id} not found.`
    pub fn task_item_not_found(id: i32) -> Self {
        ServiceError::NotFound(format!("Task item with ID {} not found.", id))
    }

    /// `User with email {email} already exists.`
    pub fn email_taken(email: &str) -> Self {
        ServiceError::Conflict(format!("User with email {} already exists.", email))
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Cancelled => ServiceError::Cancelled,
            other => ServiceError::Repository(other),
        }
    }
}
