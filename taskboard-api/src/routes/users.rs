/// User endpoints
///
/// # Endpoints
///
/// - `GET /api/users` - List users
/// - `GET /api/users/:id` - Get one user
/// - `POST /api/users` - Create user (201 + `Location`)
/// - `PUT /api/users/:id` - Replace name, telephone and email (204)
/// - `DELETE /api/users/:id` - Delete user and its task items (204)

use super::{created, invalid, not_blank};
use crate::{
    app::AppState,
    error::ApiResult,
    extract::{EntityId, ValidatedJson},
};
use axum::{
    extract::State,
    http::StatusCode,
    response::Response,
    Json,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use taskboard_shared::models::user::{CreateUser, UpdateUser, User};
use validator::{Validate, ValidationError};

/// Optional leading `+`, up to three digit groups with optional brackets
/// around the first two and `-`, space or `.` between them
static TELEPHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?\(?[0-9]{1,4}\)?[-\s.]?\(?[0-9]{1,4}\)?[-\s.]?[0-9]{1,9}$")
        .expect("Invalid telephone regex pattern")
});

/// Create or update user request
///
/// ```json
/// { "fullName": "Ann Lee", "telephone": "+1-555-0100", "email": "ann@x.com" }
/// ```
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    #[validate(
        required(message = "Full name is required"),
        custom(function = "full_name_present"),
        length(max = 200, message = "Full name must not exceed 200 characters")
    )]
    pub full_name: Option<String>,

    #[validate(
        required(message = "Telephone is required"),
        custom(function = "valid_telephone"),
        length(max = 20, message = "Telephone must not exceed 20 characters")
    )]
    pub telephone: Option<String>,

    #[validate(
        required(message = "Email is required"),
        custom(function = "email_present"),
        email(message = "Email must be in a valid format"),
        length(max = 200, message = "Email must not exceed 200 characters")
    )]
    pub email: Option<String>,
}

impl UserRequest {
    fn into_parts(self) -> (String, String, String) {
        (
            self.full_name.unwrap_or_default(),
            self.telephone.unwrap_or_default(),
            self.email.unwrap_or_default(),
        )
    }
}

impl From<UserRequest> for CreateUser {
    fn from(req: UserRequest) -> Self {
        let (full_name, telephone, email) = req.into_parts();
        CreateUser {
            full_name,
            telephone,
            email,
        }
    }
}

impl From<UserRequest> for UpdateUser {
    fn from(req: UserRequest) -> Self {
        let (full_name, telephone, email) = req.into_parts();
        UpdateUser {
            full_name,
            telephone,
            email,
        }
    }
}

/// User as returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i32,
    pub full_name: String,
    pub telephone: String,
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name,
            telephone: user.telephone,
            email: user.email,
        }
    }
}

fn full_name_present(value: &str) -> Result<(), ValidationError> {
    not_blank(value, "Full name is required")
}

fn email_present(value: &str) -> Result<(), ValidationError> {
    not_blank(value, "Email is required")
}

fn valid_telephone(value: &str) -> Result<(), ValidationError> {
    not_blank(value, "Telephone is required")?;
    if !TELEPHONE_PATTERN.is_match(value) {
        return Err(invalid("telephone", "Telephone must be in a valid format"));
    }
    Ok(())
}

/// List users
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<UserResponse>>> {
    let cancel = state.request_token();
    let users = state.users.list_users(&cancel).await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Get one user
///
/// # Errors
///
/// - `400 Bad Request`: ID is not an integer
/// - `404 Not Found`: No user with this ID
pub async fn get_user(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> ApiResult<Json<UserResponse>> {
    let cancel = state.request_token();
    let user = state.users.get_user(id, &cancel).await?;

    Ok(Json(user.into()))
}

/// Create user
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed or malformed JSON
/// - `409 Conflict`: Email already taken (ignoring case)
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<UserRequest>,
) -> ApiResult<Response> {
    let cancel = state.request_token();
    let user = state.users.create_user(req.into(), &cancel).await?;

    Ok(created(
        format!("/api/users/{}", user.id),
        UserResponse::from(user),
    ))
}

/// Update user
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed, malformed JSON or bad ID
/// - `404 Not Found`: No user with this ID
/// - `409 Conflict`: New email belongs to another user
pub async fn update_user(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    ValidatedJson(req): ValidatedJson<UserRequest>,
) -> ApiResult<StatusCode> {
    let cancel = state.request_token();
    state.users.update_user(id, req.into(), &cancel).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Delete user together with its task items
///
/// # Errors
///
/// - `400 Bad Request`: ID is not an integer
/// - `404 Not Found`: No user with this ID
pub async fn delete_user(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> ApiResult<StatusCode> {
    let cancel = state.request_token();
    state.users.delete_user(id, &cancel).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(full_name: &str, telephone: &str, email: &str) -> UserRequest {
        UserRequest {
            full_name: Some(full_name.to_string()),
            telephone: Some(telephone.to_string()),
            email: Some(email.to_string()),
        }
    }

    #[test]
    fn test_valid_request() {
        assert!(request("Ann Lee", "+1-555-0100", "ann@x.com").validate().is_ok());
        assert!(request("Ann Lee", "(555) 123.4567", "ann@x.com").validate().is_ok());
        assert!(request("Ann Lee", "5551234", "ann@x.com").validate().is_ok());
    }

    #[test]
    fn test_telephone_pattern() {
        assert!(valid_telephone("+44 20 7946").is_ok());
        assert!(valid_telephone("phone").is_err());
        assert!(valid_telephone("+1-555-0100-99-88").is_err());
        let err = valid_telephone("   ").unwrap_err();
        assert_eq!(err.message.as_deref(), Some("Telephone is required"));
    }

    #[test]
    fn test_blank_and_missing_fields_fail() {
        let blank = request("   ", "", "");
        let errors = blank.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("full_name"));
        assert!(fields.contains_key("telephone"));
        assert!(fields.contains_key("email"));

        let missing = UserRequest {
            full_name: None,
            telephone: None,
            email: None,
        };
        assert_eq!(missing.validate().unwrap_err().field_errors().len(), 3);
    }

    #[test]
    fn test_telephone_fits_column() {
        assert!(request("Ann Lee", "+(1234)-(1234)-12345", "ann@x.com").validate().is_ok());

        let errors = request("Ann Lee", "+(1234)-(1234)-123456", "ann@x.com")
            .validate()
            .unwrap_err();
        let failures = &errors.field_errors()["telephone"];
        assert_eq!(failures.len(), 1);
        assert_eq!(
            failures[0].message.as_deref(),
            Some("Telephone must not exceed 20 characters")
        );
    }

    #[test]
    fn test_length_counts_characters() {
        let name: String = "é".repeat(200);
        assert!(request(&name, "555", "ann@x.com").validate().is_ok());

        let name: String = "é".repeat(201);
        assert!(request(&name, "555", "ann@x.com").validate().is_err());
    }

    #[test]
    fn test_response_uses_camel_case() {
        let body = serde_json::to_value(UserResponse {
            id: 1,
            full_name: "Ann Lee".to_string(),
            telephone: "+1-555-0100".to_string(),
            email: "ann@x.com".to_string(),
        })
        .unwrap();

        assert_eq!(body["fullName"], "Ann Lee");
        assert!(body.get("full_name").is_none());
    }
}
