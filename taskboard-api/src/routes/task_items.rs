/// Task item endpoints
///
/// # Endpoints
///
/// - `GET /api/taskitems` - List task items with owners
/// - `GET /api/taskitems/:id` - Get one task item with its owner
/// - `POST /api/taskitems` - Create task item for an existing user (201 + `Location`)
/// - `PUT /api/taskitems/:id` - Replace title, description, due date and priority (204)
/// - `DELETE /api/taskitems/:id` - Delete task item (204)
///
/// # Priority
///
/// Responses always carry the name (`"Low"`, `"Medium"`, `"High"`). Requests
/// also accept any letter case and the ordinals `0`, `1` and `2`.
///
/// `dueDate`, `priority` and `userId` arrive as raw JSON values and are parsed
/// during validation, so a wrong type is reported in `errors` next to every
/// other failing field instead of rejecting the whole body.

use super::{created, invalid, not_blank, users::UserResponse};
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{EntityId, ValidatedJson},
};
use axum::{extract::State, http::StatusCode, response::Response, Json};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use taskboard_shared::models::task_item::{
    CreateTaskItem, InvalidPriority, Priority, TaskItemWithUser, UpdateTaskItem,
};
use validator::{Validate, ValidationError};

const PRIORITY_MESSAGE: &str = "Priority must be a valid value (Low, Medium, High)";
const DUE_DATE_MESSAGE: &str = "Due date must be a valid date";
const USER_ID_MESSAGE: &str = "User ID must be greater than 0";

/// Create task item request
///
/// ```json
/// {
///   "title": "Ship report",
///   "description": "Q3 report",
///   "dueDate": "2025-01-01T00:00:00Z",
///   "priority": "Medium",
///   "userId": 1
/// }
/// ```
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskItemRequest {
    #[validate(
        required(message = "Title is required"),
        custom(function = "title_present"),
        length(max = 200, message = "Title must not exceed 200 characters")
    )]
    pub title: Option<String>,

    #[validate(
        required(message = "Description is required"),
        custom(function = "description_present"),
        length(max = 1000, message = "Description must not exceed 1000 characters")
    )]
    pub description: Option<String>,

    #[validate(
        required(message = "Due date is required"),
        custom(function = "valid_due_date")
    )]
    pub due_date: Option<Value>,

    #[validate(
        required(message = "Priority is required"),
        custom(function = "valid_priority")
    )]
    pub priority: Option<Value>,

    #[validate(
        required(message = "User ID is required"),
        custom(function = "valid_user_id")
    )]
    pub user_id: Option<Value>,
}

/// Update task item request; the owner cannot change
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskItemRequest {
    #[validate(
        required(message = "Title is required"),
        custom(function = "title_present"),
        length(max = 200, message = "Title must not exceed 200 characters")
    )]
    pub title: Option<String>,

    #[validate(
        required(message = "Description is required"),
        custom(function = "description_present"),
        length(max = 1000, message = "Description must not exceed 1000 characters")
    )]
    pub description: Option<String>,

    #[validate(
        required(message = "Due date is required"),
        custom(function = "valid_due_date")
    )]
    pub due_date: Option<Value>,

    #[validate(
        required(message = "Priority is required"),
        custom(function = "valid_priority")
    )]
    pub priority: Option<Value>,
}

impl TryFrom<CreateTaskItemRequest> for CreateTaskItem {
    type Error = ApiError;

    fn try_from(req: CreateTaskItemRequest) -> Result<Self, Self::Error> {
        Ok(CreateTaskItem {
            title: req.title.unwrap_or_default(),
            description: req.description.unwrap_or_default(),
            due_date: required_due_date(req.due_date.as_ref())?,
            priority: required_priority(req.priority.as_ref())?,
            user_id: required_user_id(req.user_id.as_ref())?,
        })
    }
}

impl TryFrom<UpdateTaskItemRequest> for UpdateTaskItem {
    type Error = ApiError;

    fn try_from(req: UpdateTaskItemRequest) -> Result<Self, Self::Error> {
        Ok(UpdateTaskItem {
            title: req.title.unwrap_or_default(),
            description: req.description.unwrap_or_default(),
            due_date: required_due_date(req.due_date.as_ref())?,
            priority: required_priority(req.priority.as_ref())?,
        })
    }
}

/// Task item as returned by the API, owner embedded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskItemResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub priority: Priority,
    pub user_id: i32,
    pub user: UserResponse,
}

impl From<TaskItemWithUser> for TaskItemResponse {
    fn from(item: TaskItemWithUser) -> Self {
        let TaskItemWithUser { task, user } = item;
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            due_date: task.due_date,
            priority: task.priority,
            user_id: task.user_id,
            user: user.into(),
        }
    }
}

/// Reads a priority given by name (any case) or by ordinal
pub fn parse_priority(value: &Value) -> Result<Priority, InvalidPriority> {
    match value {
        Value::String(name) => name.parse(),
        Value::Number(n) => n
            .as_i64()
            .ok_or(InvalidPriority)
            .and_then(Priority::from_ordinal),
        _ => Err(InvalidPriority),
    }
}

/// Reads an RFC 3339 timestamp, rejecting the default timestamps
pub fn parse_due_date(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|text| text.parse::<DateTime<Utc>>().ok())
        .filter(|due| !is_default_timestamp(due))
}

/// Reads a positive integer that fits an `INTEGER` column
pub fn parse_user_id(value: &Value) -> Option<i32> {
    value
        .as_i64()
        .and_then(|id| i32::try_from(id).ok())
        .filter(|id| *id > 0)
}

/// Unix epoch or 0001-01-01T00:00:00Z
fn is_default_timestamp(value: &DateTime<Utc>) -> bool {
    let epoch = Utc.timestamp_opt(0, 0).single();
    let year_one = Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 0).single();

    Some(*value) == epoch || Some(*value) == year_one
}

fn title_present(value: &str) -> Result<(), ValidationError> {
    not_blank(value, "Title is required")
}

fn description_present(value: &str) -> Result<(), ValidationError> {
    not_blank(value, "Description is required")
}

fn valid_due_date(value: &Value) -> Result<(), ValidationError> {
    parse_due_date(value)
        .map(|_| ())
        .ok_or_else(|| invalid("due_date", DUE_DATE_MESSAGE))
}

fn valid_user_id(value: &Value) -> Result<(), ValidationError> {
    parse_user_id(value)
        .map(|_| ())
        .ok_or_else(|| invalid("user_id", USER_ID_MESSAGE))
}

fn valid_priority(value: &Value) -> Result<(), ValidationError> {
    parse_priority(value)
        .map(|_| ())
        .map_err(|_| invalid("priority", PRIORITY_MESSAGE))
}

fn missing(field: &str) -> ApiError {
    ApiError::BadRequest(format!("{} is required", field))
}

fn required_due_date(value: Option<&Value>) -> ApiResult<DateTime<Utc>> {
    let value = value.ok_or_else(|| missing("dueDate"))?;
    parse_due_date(value).ok_or_else(|| ApiError::BadRequest(DUE_DATE_MESSAGE.to_string()))
}

fn required_user_id(value: Option<&Value>) -> ApiResult<i32> {
    let value = value.ok_or_else(|| missing("userId"))?;
    parse_user_id(value).ok_or_else(|| ApiError::BadRequest(USER_ID_MESSAGE.to_string()))
}

fn required_priority(value: Option<&Value>) -> ApiResult<Priority> {
    let value = value.ok_or_else(|| missing("priority"))?;
    parse_priority(value).map_err(|_| ApiError::BadRequest(PRIORITY_MESSAGE.to_string()))
}

/// List task items with their owners
pub async fn list_task_items(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<TaskItemResponse>>> {
    let cancel = state.request_token();
    let tasks = state.task_items.list_tasks(&cancel).await?;

    Ok(Json(tasks.into_iter().map(TaskItemResponse::from).collect()))
}

/// Get one task item
///
/// # Errors
///
/// - `400 Bad Request`: ID is not an integer
/// - `404 Not Found`: No task item with this ID
pub async fn get_task_item(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> ApiResult<Json<TaskItemResponse>> {
    let cancel = state.request_token();
    let task = state.task_items.get_task(id, &cancel).await?;

    Ok(Json(task.into()))
}

/// Create task item
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed or malformed JSON
/// - `404 Not Found`: `userId` does not reference an existing user
pub async fn create_task_item(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateTaskItemRequest>,
) -> ApiResult<Response> {
    let cancel = state.request_token();
    let task = state
        .task_items
        .create_task(CreateTaskItem::try_from(req)?, &cancel)
        .await?;

    Ok(created(
        format!("/api/taskitems/{}", task.task.id),
        TaskItemResponse::from(task),
    ))
}

/// Update task item
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed, malformed JSON or bad ID
/// - `404 Not Found`: No task item with this ID
pub async fn update_task_item(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    ValidatedJson(req): ValidatedJson<UpdateTaskItemRequest>,
) -> ApiResult<StatusCode> {
    let cancel = state.request_token();
    state
        .task_items
        .update_task(id, UpdateTaskItem::try_from(req)?, &cancel)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Delete task item
///
/// # Errors
///
/// - `400 Bad Request`: ID is not an integer
/// - `404 Not Found`: No task item with this ID
pub async fn delete_task_item(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> ApiResult<StatusCode> {
    let cancel = state.request_token();
    state.task_items.delete_task(id, &cancel).await?;

    Ok(StatusCode::NO_CONTENT)
}
