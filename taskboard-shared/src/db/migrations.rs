/// Database migration runner
///
/// Migrations live in the workspace `migrations/` directory and are embedded
/// into the binary at compile time with `sqlx::migrate!`. The API server runs
/// them once at startup, before it accepts requests.

use sqlx::{migrate::MigrateDatabase, postgres::PgPool, Postgres};
use tracing::{debug, info, warn};

/// Applied-migration summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Number of successfully applied migrations
    pub applied_migrations: usize,

    /// Highest applied version
    pub latest_version: Option<i64>,

    /// Number of migrations embedded in this build
    pub embedded_migrations: usize,
}

impl MigrationStatus {
    /// True when every embedded migration has been applied
    pub fn is_up_to_date(&self) -> bool {
        self.applied_migrations >= self.embedded_migrations
    }
}

/// Applies all pending migrations
///
/// # Errors
///
/// Returns an error if a migration fails; sqlx rolls back the failing one.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Running database migrations");

    match sqlx::migrate!("../migrations").run(pool).await {
        Ok(()) => {
            info!("Database schema is up to date");
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "Migration failed");
            Err(e)
        }
    }
}

/// Reads how many migrations have been applied
pub async fn migration_status(pool: &PgPool) -> Result<MigrationStatus, sqlx::Error> {
    let embedded_migrations = sqlx::migrate!("../migrations").iter().count();

    let table_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (
            SELECT FROM information_schema.tables
            WHERE table_schema = current_schema()
            AND table_name = '_sqlx_migrations'
        )",
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        debug!("Migrations table does not exist yet");
        return Ok(MigrationStatus {
            applied_migrations: 0,
            latest_version: None,
            embedded_migrations,
        });
    }

    let (count, latest_version): (i64, Option<i64>) = sqlx::query_as(
        "SELECT COUNT(*), MAX(version) FROM _sqlx_migrations WHERE success = true",
    )
    .fetch_one(pool)
    .await?;

    Ok(MigrationStatus {
        applied_migrations: count as usize,
        latest_version,
        embedded_migrations,
    })
}

/// Creates the database named in the URL if it is missing
///
/// Meant for development; production databases are provisioned separately.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    if !Postgres::database_exists(database_url).await? {
        info!("Database does not exist, creating it");
        Postgres::create_database(database_url).await?;
    } else {
        debug!("Database already exists");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_up_to_date() {
        let status = MigrationStatus {
            applied_migrations: 2,
            latest_version: Some(20250101000002),
            embedded_migrations: 2,
        };
        assert!(status.is_up_to_date());

        let behind = MigrationStatus {
            applied_migrations: 1,
            ..status
        };
        assert!(!behind.is_up_to_date());
    }

    #[test]
    fn test_embedded_migrations_present() {
        assert_eq!(sqlx::migrate!("../migrations").iter().count(), 2);
    }
}
