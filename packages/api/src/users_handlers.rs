// ABOUTME: HTTP request handlers for account operations
// ABOUTME: Registration, login, profile, password and admin role changes

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Form, Json,
};
use serde::Deserialize;
use tracing::info;

use taskhive_auth::{hash_password, verify_password};
use taskhive_core::{patch_field, DomainError, SystemRole, User, UserSummary};

use crate::activity;
use crate::auth::CurrentUser;
use crate::response::{ApiError, ApiResponse};
use crate::state::AppState;

/// Request body for registration. An unknown role silently falls back to
/// the default instead of failing the request.
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Registering user: {}", request.username);

    if state
        .db
        .users
        .find_by_username(&request.username)
        .await?
        .is_some()
    {
        return Err(DomainError::validation("Username already registered").into());
    }
    if state.db.users.find_by_email(&request.email).await?.is_some() {
        return Err(DomainError::validation("Email already registered").into());
    }

    let role = request
        .role
        .as_deref()
        .and_then(SystemRole::parse)
        .unwrap_or_default();
    let hashed = hash_password(&request.password)
        .map_err(|e| DomainError::internal(e.to_string()))?;

    let user = state
        .db
        .users
        .insert(&request.username, &request.email, &hashed, role)
        .await?;

    activity::record(
        &user.username,
        "registered account",
        "auth/register",
        201,
        &[("username", user.username.clone())],
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.db.users.find_by_username(&form.username).await?;
    let user = match user {
        Some(user) if verify_password(&form.password, &user.hashed_password) => user,
        _ => return Err(DomainError::unauthenticated("Invalid credentials").into()),
    };

    state.db.users.touch_last_login(user.id).await?;
    let token = state
        .tokens
        .issue(&user.username, user.id, user.role.as_str())
        .map_err(|e| DomainError::internal(e.to_string()))?;

    activity::record(
        &user.username,
        "attempted login",
        "auth/login",
        200,
        &[("username", user.username.clone())],
    );

    Ok(Json(ApiResponse::success(serde_json::json!({
        "access_token": token,
        "token_type": "bearer",
        "role": user.role,
    }))))
}

pub async fn read_me(CurrentUser(user): CurrentUser) -> Json<ApiResponse<User>> {
    Json(ApiResponse::success(user))
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default, deserialize_with = "patch_field")]
    pub display_name: Option<Option<String>>,
    #[serde(default)]
    pub email: Option<String>,
}

pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Updating profile for user: {}", user.username);

    let email = match request.email {
        Some(email) => {
            if let Some(existing) = state.db.users.find_by_email(&email).await? {
                if existing.id != user.id {
                    return Err(DomainError::validation("Email already registered").into());
                }
            }
            email
        }
        None => user.email.clone(),
    };
    let display_name = match request.display_name {
        Some(value) => value,
        None => user.display_name.clone(),
    };

    let updated = state
        .db
        .users
        .update_profile(user.id, display_name, &email)
        .await?;

    activity::record(
        &user.username,
        "updated profile",
        "users/me",
        200,
        &[("email", email.clone())],
    );

    Ok(Json(ApiResponse::success(updated)))
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !verify_password(&request.current_password, &user.hashed_password) {
        return Err(DomainError::validation("Current password is incorrect").into());
    }

    let hashed = hash_password(&request.new_password)
        .map_err(|e| DomainError::internal(e.to_string()))?;
    state.db.users.update_password(user.id, &hashed).await?;

    activity::record(&user.username, "changed password", "users/me/password", 200, &[]);

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Password updated successfully"
    }))))
}

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
}

/// Active-user search for member pickers.
pub async fn search_users(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = params.q.unwrap_or_default();
    let users = state.db.users.search_active(&query, 20).await?;
    let summaries: Vec<UserSummary> = users.iter().map(UserSummary::from).collect();
    Ok(Json(ApiResponse::success(summaries)))
}

/// Admin only: full account list.
pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    if !user.is_admin() {
        return Err(DomainError::forbidden("Admin privileges required").into());
    }
    let users = state.db.users.list_all().await?;
    Ok(Json(ApiResponse::success(users)))
}

#[derive(Deserialize)]
pub struct RoleChangeRequest {
    pub role: SystemRole,
}

/// Admin only: change another account's system role.
pub async fn set_role(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(user_id): Path<i64>,
    Json(request): Json<RoleChangeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !user.is_admin() {
        return Err(DomainError::forbidden("Admin privileges required").into());
    }
    if state.db.users.find_by_id(user_id).await?.is_none() {
        return Err(DomainError::not_found("User not found").into());
    }

    let updated = state.db.users.update_role(user_id, request.role).await?;

    activity::record(
        &user.username,
        "changed user role",
        &format!("users/{user_id}"),
        200,
        &[("role", request.role.as_str().to_string())],
    );

    Ok(Json(ApiResponse::success(updated)))
}
