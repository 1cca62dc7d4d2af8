/// Business logic for users and task items
///
/// Services own the rules that sit between the HTTP layer and storage:
/// existence checks, email uniqueness, owner validation, and translation of
/// store-level failures into [`ServiceError`](crate::error::ServiceError).
/// They never produce HTTP statuses.
///
/// Both services are cheap to clone; they hold an `Arc` to their repository.

pub mod task_item;
pub mod user;

pub use task_item::TaskItemService;
pub use user::UserService;
