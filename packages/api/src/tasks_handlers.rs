// ABOUTME: HTTP request handlers for task operations
// ABOUTME: Thin adapters over the task manager's lifecycle rules

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::info;

use taskhive_core::{TaskCreateInput, TaskListFilter, TaskUpdateInput};

use crate::activity;
use crate::auth::CurrentUser;
use crate::response::{ApiError, ApiResponse};
use crate::state::AppState;

pub async fn create_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<TaskCreateInput>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Creating task '{}'", request.title);

    let (action, target) = if request.is_personal {
        ("created personal task", format!("personal:{}", request.title))
    } else {
        (
            "created project task",
            format!(
                "project:{}",
                request
                    .project_id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string())
            ),
        )
    };
    let mut changes = vec![("title", request.title.clone())];
    if let Some(assignee_id) = request.assignee_id {
        changes.push(("assignee_id", assignee_id.to_string()));
    }

    let view = state.tasks.create_task(&user, request).await?;

    activity::record(&user.username, action, &target, 201, &changes);

    Ok((StatusCode::CREATED, Json(ApiResponse::success(view))))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(filter): Query<TaskListFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let views = state.tasks.list_tasks(&user, &filter).await?;
    Ok(Json(ApiResponse::success(views)))
}

#[derive(Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub skip: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

pub async fn list_personal_tasks(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(page): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let views = state
        .tasks
        .personal_tasks(&user, page.skip, page.limit)
        .await?;
    Ok(Json(ApiResponse::success(views)))
}

pub async fn get_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(task_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state.tasks.get_task(&user, task_id).await?;
    Ok(Json(ApiResponse::success(view)))
}

pub async fn update_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(task_id): Path<i64>,
    Json(request): Json<TaskUpdateInput>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Updating task: {}", task_id);

    let changes = describe_patch(&request);
    let view = state.tasks.update_task(&user, task_id, request).await?;

    activity::record(
        &user.username,
        "updated task",
        &format!("tasks/{task_id}"),
        200,
        &changes,
    );

    Ok(Json(ApiResponse::success(view)))
}

pub async fn delete_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(task_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Deleting task: {}", task_id);

    let view = state.tasks.delete_task(&user, task_id).await?;

    activity::record(
        &user.username,
        "deleted task",
        &format!("tasks/{task_id}"),
        200,
        &[],
    );

    Ok(Json(ApiResponse::success(view)))
}

/// Board view of a project's tasks bucketed by status.
pub async fn grouped_tasks(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(project_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let grouped = state.tasks.grouped_by_status(&user, project_id).await?;
    Ok(Json(ApiResponse::success(grouped)))
}

fn describe_patch(patch: &TaskUpdateInput) -> Vec<(&'static str, String)> {
    let mut changes = Vec::new();
    if let Some(title) = &patch.title {
        changes.push(("title", title.clone()));
    }
    if let Some(status) = &patch.status {
        changes.push(("status", format!("{status:?}")));
    }
    if let Some(completed) = patch.completed {
        changes.push(("completed", completed.to_string()));
    }
    if let Some(priority) = &patch.priority {
        changes.push(("priority", format!("{priority:?}")));
    }
    if let Some(assignee) = &patch.assignee_id {
        changes.push((
            "assignee_id",
            assignee
                .map(|id| id.to_string())
                .unwrap_or_else(|| "null".to_string()),
        ));
    }
    if patch.due_date.is_some() {
        changes.push(("due_date", "changed".to_string()));
    }
    changes
}
