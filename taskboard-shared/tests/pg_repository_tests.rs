/// PostgreSQL repository tests
///
/// These run against a real database and are ignored by default:
///
/// ```bash
/// DATABASE_URL=postgresql://localhost/taskboard_test \
///     cargo test -p taskboard-shared --test pg_repository_tests -- --ignored --test-threads=1
/// ```
///
/// Each test creates its own rows with unique emails and removes them at the end.

use chrono::{TimeZone, Utc};
use sqlx::PgPool;
use std::time::{SystemTime, UNIX_EPOCH};
use taskboard_shared::db::migrations::{migration_status, run_migrations};
use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
use taskboard_shared::error::RepositoryError;
use taskboard_shared::models::task_item::{CreateTaskItem, Priority, UpdateTaskItem};
use taskboard_shared::models::user::{CreateUser, UpdateUser, User, EMAIL_UNIQUE_INDEX};
use taskboard_shared::repository::{
    PgTaskItemRepository, PgUserRepository, TaskItemRepository, UserRepository,
};
use tokio_util::sync::CancellationToken;

async fn connect() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = create_pool(DatabaseConfig {
        url,
        ..Default::default()
    })
    .await
    .expect("failed to connect to PostgreSQL");
    run_migrations(&pool).await.expect("migrations failed");
    pool
}

async fn count_users(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn count_task_items_for(pool: &PgPool, user_id: i32) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM task_items WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

fn unique_email(tag: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{}@example.com", tag, nanos)
}

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
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_user_crud_round_trip() {
    let pool = connect().await;
    let repo = PgUserRepository::new(pool.clone());
    let cancel = CancellationToken::new();
    let email = unique_email("crud");

    let created = repo.insert(new_user(&email), &cancel).await.unwrap();
    let fetched = repo.find_by_id(created.id, &cancel).await.unwrap();
    assert_eq!(fetched, Some(created.clone()));

    let updated = repo
        .update(
            created.id,
            UpdateUser {
                full_name: "Ann B. Lee".to_string(),
                telephone: "555 0199".to_string(),
                email: email.to_uppercase(),
            },
            &cancel,
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.full_name, "Ann B. Lee");
    assert_eq!(updated.email, email.to_uppercase());

    assert!(repo.delete(created.id, &cancel).await.unwrap());
    assert!(!repo.exists(created.id, &cancel).await.unwrap());
    assert!(!repo.delete(created.id, &cancel).await.unwrap());
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_email_index_ignores_case() {
    let pool = connect().await;
    let repo = PgUserRepository::new(pool.clone());
    let cancel = CancellationToken::new();
    let email = unique_email("dup");

    let first = repo.insert(new_user(&email), &cancel).await.unwrap();
    assert!(repo.email_exists(&email.to_uppercase(), None, &cancel).await.unwrap());
    assert!(!repo
        .email_exists(&email, Some(first.id), &cancel)
        .await
        .unwrap());

    let err = repo
        .insert(new_user(&email.to_uppercase()), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::UniqueViolation(ref name) if name == EMAIL_UNIQUE_INDEX));

    User::delete(&pool, first.id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_task_items_join_owner_and_cascade() {
    let pool = connect().await;
    let users = PgUserRepository::new(pool.clone());
    let tasks = PgTaskItemRepository::new(pool.clone());
    let cancel = CancellationToken::new();

    let owner = users
        .insert(new_user(&unique_email("owner")), &cancel)
        .await
        .unwrap();
    let task = tasks.insert(new_task(owner.id), &cancel).await.unwrap();

    let joined = tasks
        .find_by_id_with_user(task.id, &cancel)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(joined.task, task);
    assert_eq!(joined.user, owner);

    let due = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
    let updated = tasks
        .update(
            task.id,
            UpdateTaskItem {
                title: "Ship final report".to_string(),
                description: "Q3 report, final".to_string(),
                due_date: due,
                priority: Priority::High,
            },
            &cancel,
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.priority, Priority::High);
    assert_eq!(updated.due_date, due);
    assert_eq!(updated.user_id, owner.id);

    assert!(users.delete(owner.id, &cancel).await.unwrap());
    assert_eq!(count_task_items_for(&pool, owner.id).await, 0);
    assert!(tasks.find_by_id(task.id, &cancel).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_task_for_missing_user_violates_foreign_key() {
    let pool = connect().await;
    let tasks = PgTaskItemRepository::new(pool);
    let cancel = CancellationToken::new();

    let err = tasks.insert(new_task(i32::MAX), &cancel).await.unwrap_err();
    assert!(matches!(err, RepositoryError::ForeignKeyViolation(_)));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_cancelled_token_aborts_query() {
    let pool = connect().await;
    let repo = PgUserRepository::new(pool);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = repo.list(&cancel).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Cancelled));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_migrations_are_up_to_date() {
    let pool = connect().await;

    let status = migration_status(&pool).await.unwrap();
    assert!(status.is_up_to_date());
    assert_eq!(status.embedded_migrations, 2);

    let user = User::create(&pool, new_user(&unique_email("count"))).await.unwrap();
    assert!(count_users(&pool).await >= 1);
    User::delete(&pool, user.id).await.unwrap();
}
