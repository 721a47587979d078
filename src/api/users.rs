//! User management endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::user::{User, UserId};
use crate::domain::DomainError;
use crate::infrastructure::user::CreateUserRequest;

/// Request to create a new user
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserApiRequest {
    pub login: String,
}

/// User response
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub login: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().value(),
            login: user.login().to_string(),
            created_at: user.created_at().to_rfc3339(),
            updated_at: user.updated_at().to_rfc3339(),
        }
    }
}

/// List users response
#[derive(Debug, Clone, Serialize)]
pub struct ListUsersResponse {
    pub users: Vec<UserResponse>,
    pub total: usize,
}

/// Full detail goes to the log; the response body only ever carries what
/// `ApiError::from` exposes.
fn log_failure(operation: &str, err: &DomainError) {
    match err {
        DomainError::OperationFailed { .. } => error!(error = ?err, "{operation} failed"),
        _ => warn!(error = %err, "{operation} failed"),
    }
}

/// GET /users
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<ListUsersResponse>, ApiError> {
    debug!("listing users");

    let users = state.user_service.list().await.map_err(|err| {
        log_failure("user listing", &err);
        ApiError::from(err)
    })?;

    let user_responses: Vec<UserResponse> = users.iter().map(UserResponse::from).collect();
    let total = user_responses.len();

    Ok(Json(ListUsersResponse {
        users: user_responses,
        total,
    }))
}

/// POST /users
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserApiRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    debug!(login = %request.login, "creating user");

    let user = state
        .user_service
        .create(CreateUserRequest {
            login: request.login,
        })
        .await
        .map_err(|err| {
            log_failure("user creation", &err);
            ApiError::from(err)
        })?;

    Ok(Json(UserResponse::from(&user)))
}

/// GET /users/{user_id}
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    debug!(user_id, "getting user");

    let user = state
        .user_service
        .get(UserId::new(user_id))
        .await
        .map_err(|err| {
            log_failure("user lookup", &err);
            ApiError::from(err)
        })?
        .ok_or_else(|| ApiError::not_found(format!("User with id {user_id} not found.")))?;

    Ok(Json(UserResponse::from(&user)))
}

/// DELETE /users/{user_id}
///
/// 204 on success, 404 with the not-found message when the id has no record,
/// 500 with a generic body on any other failure.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    debug!(user_id, "deleting user");

    match state.user_service.delete(UserId::new(user_id)).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(err) => {
            log_failure("user deletion", &err);
            Err(ApiError::from(err))
        }
    }
}
