// ABOUTME: HTTP request handlers for team reference data
// ABOUTME: Admin-gated CRUD plus a public summary listing

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::info;

use taskhive_core::{DomainError, TeamCreateInput, TeamSummary, TeamUpdateInput, User};

use crate::activity;
use crate::auth::CurrentUser;
use crate::response::{ApiError, ApiResponse};
use crate::state::AppState;

fn ensure_admin(user: &User, message: &str) -> Result<(), ApiError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(DomainError::forbidden(message).into())
    }
}

/// Unauthenticated summary listing, used by the registration screen.
pub async fn list_public_teams(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let teams = state.db.teams.list_ordered().await?;
    let summaries: Vec<TeamSummary> = teams.iter().map(TeamSummary::from).collect();
    Ok(Json(ApiResponse::success(summaries)))
}

pub async fn list_teams(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    ensure_admin(&user, "Only admin can view full team details")?;
    let teams = state.db.teams.list_ordered().await?;
    Ok(Json(ApiResponse::success(teams)))
}

pub async fn create_team(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<TeamCreateInput>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_admin(&user, "Only admin can create teams")?;

    let clean_name = request.name.trim();
    if clean_name.is_empty() {
        return Err(DomainError::validation("Team name cannot be empty").into());
    }
    if state.db.teams.find_by_name_ci(clean_name, None).await?.is_some() {
        return Err(DomainError::validation("Team name already exists").into());
    }

    let team = state
        .db
        .teams
        .insert(clean_name, request.description.as_deref(), &user.username)
        .await?;

    info!("Created team '{}' with id {}", team.name, team.id);
    activity::record(
        &user.username,
        "created team",
        &team.name,
        201,
        &[("name", team.name.clone())],
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::success(team))))
}

pub async fn update_team(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(team_id): Path<i64>,
    Json(request): Json<TeamUpdateInput>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_admin(&user, "Only admin can update teams")?;

    let team = state
        .db
        .teams
        .find_by_id(team_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Team not found"))?;

    let name = match &request.name {
        Some(name) => {
            let clean_name = name.trim();
            if clean_name.is_empty() {
                return Err(DomainError::validation("Team name cannot be empty").into());
            }
            if state
                .db
                .teams
                .find_by_name_ci(clean_name, Some(team_id))
                .await?
                .is_some()
            {
                return Err(DomainError::validation("Team name already exists").into());
            }
            clean_name.to_string()
        }
        None => team.name.clone(),
    };
    let description = match &request.description {
        Some(description) => {
            let trimmed = description.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        None => team.description.clone(),
    };

    let updated = state
        .db
        .teams
        .update(team_id, &name, description.as_deref())
        .await?;

    activity::record(
        &user.username,
        "updated team",
        &format!("teams/{team_id}"),
        200,
        &[("name", name.clone())],
    );

    Ok(Json(ApiResponse::success(updated)))
}

pub async fn delete_team(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(team_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_admin(&user, "Only admin can delete teams")?;

    if state.db.teams.find_by_id(team_id).await?.is_none() {
        return Err(DomainError::not_found("Team not found").into());
    }
    state.db.teams.delete(team_id).await?;

    activity::record(
        &user.username,
        "deleted team",
        &format!("teams/{team_id}"),
        200,
        &[],
    );

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": format!("Team {} deleted successfully", team_id)
    }))))
}

/// Assigns each listed user to the team. Any unknown id fails the whole
/// request before anything is written.
pub async fn add_team_members(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(team_id): Path<i64>,
    Json(user_ids): Json<Vec<i64>>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_admin(&user, "Only admin can assign members")?;

    let team = state
        .db
        .teams
        .find_by_id(team_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Team not found"))?;

    let existing = state.db.teams.count_existing_users(&user_ids).await?;
    if existing != user_ids.len() as i64 {
        return Err(DomainError::validation("One or more users not found").into());
    }

    let assigned = state.db.teams.assign_members(team_id, &user_ids).await?;

    activity::record(
        &user.username,
        "assigned team members",
        &format!("teams/{team_id}"),
        200,
        &[("count", assigned.to_string())],
    );

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": format!("Added {} members to team {}", assigned, team.name)
    }))))
}
