// ABOUTME: HTTP request handlers for project operations
// ABOUTME: Thin adapters over the project manager's authorization rules

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::info;

use taskhive_core::{
    MemberAddInput, ProjectCreateInput, ProjectListFilter, ProjectRole, ProjectUpdateInput,
};

use crate::activity;
use crate::auth::CurrentUser;
use crate::response::{ApiError, ApiResponse};
use crate::state::AppState;

pub async fn create_project(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<ProjectCreateInput>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Creating project '{}'", request.name);

    let name = request.name.clone();
    let color = request.color.clone().unwrap_or_default();
    let view = state.projects.create_project(&user, request).await?;

    activity::record(
        &user.username,
        "created project",
        &name,
        201,
        &[("name", name.clone()), ("color", color)],
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::success(view))))
}

pub async fn list_projects(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(filter): Query<ProjectListFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let views = state.projects.list_projects(&user, &filter).await?;
    Ok(Json(ApiResponse::success(views)))
}

pub async fn get_project(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(project_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state.projects.get_project(&user, project_id).await?;
    Ok(Json(ApiResponse::success(view)))
}

pub async fn update_project(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(project_id): Path<i64>,
    Json(request): Json<ProjectUpdateInput>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Updating project: {}", project_id);

    let mut changes: Vec<(&str, String)> = Vec::new();
    if let Some(name) = &request.name {
        changes.push(("name", name.clone()));
    }
    if let Some(archived) = request.archived {
        changes.push(("archived", archived.to_string()));
    }

    let view = state
        .projects
        .update_project(&user, project_id, request)
        .await?;

    activity::record(
        &user.username,
        "updated project",
        &format!("projects/{project_id}"),
        200,
        &changes,
    );

    Ok(Json(ApiResponse::success(view)))
}

pub async fn delete_project(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(project_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Deleting project: {}", project_id);

    state.projects.delete_project(&user, project_id).await?;

    activity::record(
        &user.username,
        "deleted project",
        &format!("projects/{project_id}"),
        200,
        &[],
    );

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": format!("Project {} deleted successfully", project_id)
    }))))
}

pub async fn add_member(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(project_id): Path<i64>,
    Json(request): Json<MemberAddInput>,
) -> Result<impl IntoResponse, ApiError> {
    let member_id = request.user_id;
    let view = state.projects.add_member(&user, project_id, request).await?;

    activity::record(
        &user.username,
        "added project member",
        &format!("projects/{project_id}"),
        200,
        &[("user_id", member_id.to_string())],
    );

    Ok(Json(ApiResponse::success(view)))
}

#[derive(Deserialize)]
pub struct MemberRoleRequest {
    pub role: ProjectRole,
}

pub async fn update_member_role(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((project_id, user_id)): Path<(i64, i64)>,
    Json(request): Json<MemberRoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .projects
        .update_member_role(&user, project_id, user_id, request.role)
        .await?;

    activity::record(
        &user.username,
        "changed member role",
        &format!("projects/{project_id}"),
        200,
        &[("user_id", user_id.to_string())],
    );

    Ok(Json(ApiResponse::success(view)))
}

pub async fn remove_member(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((project_id, user_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .projects
        .remove_member(&user, project_id, user_id)
        .await?;

    activity::record(
        &user.username,
        "removed project member",
        &format!("projects/{project_id}"),
        200,
        &[("user_id", user_id.to_string())],
    );

    Ok(Json(ApiResponse::success(view)))
}

pub async fn archive_project(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(project_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state.projects.set_archived(&user, project_id, true).await?;

    activity::record(
        &user.username,
        "archived project",
        &format!("projects/{project_id}"),
        200,
        &[],
    );

    Ok(Json(ApiResponse::success(view)))
}

pub async fn restore_project(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(project_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state.projects.set_archived(&user, project_id, false).await?;

    activity::record(
        &user.username,
        "restored project",
        &format!("projects/{project_id}"),
        200,
        &[],
    );

    Ok(Json(ApiResponse::success(view)))
}
