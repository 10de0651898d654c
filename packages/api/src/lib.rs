// ABOUTME: HTTP API layer for Taskhive providing REST endpoints and routing
// ABOUTME: Integration layer that depends on all domain packages

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};

pub mod activity;
pub mod auth;
pub mod logging;
pub mod projects_handlers;
pub mod response;
pub mod state;
pub mod tasks_handlers;
pub mod teams_handlers;
pub mod users_handlers;
pub mod ws;

pub use state::AppState;

use response::ApiResponse;

/// Assembles the full application router with request logging attached.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .nest("/api/v1", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            logging::log_requests,
        ))
        .with_state(state)
}

async fn root() -> Json<ApiResponse<serde_json::Value>> {
    Json(ApiResponse::success(serde_json::json!({
        "message": "Welcome to the Taskhive API"
    })))
}

fn api_router() -> Router<AppState> {
    Router::new()
        .merge(create_users_router())
        .merge(create_teams_router())
        .merge(create_projects_router())
        .merge(create_tasks_router())
        .route("/ws/tasks/{client_id}", get(ws::task_feed))
}

/// Creates the users API router
pub fn create_users_router() -> Router<AppState> {
    Router::new()
        .route("/register/", post(users_handlers::register))
        .route("/login/", post(users_handlers::login))
        .route("/me/", get(users_handlers::read_me))
        .route("/me/", put(users_handlers::update_me))
        .route("/me/password/", put(users_handlers::change_password))
        .route("/users/", get(users_handlers::list_users))
        .route("/users/search/", get(users_handlers::search_users))
        .route("/users/{user_id}/role/", put(users_handlers::set_role))
}

/// Creates the teams API router
pub fn create_teams_router() -> Router<AppState> {
    Router::new()
        .route("/teams/public/", get(teams_handlers::list_public_teams))
        .route("/teams/", get(teams_handlers::list_teams))
        .route("/teams/", post(teams_handlers::create_team))
        .route("/teams/{team_id}/", put(teams_handlers::update_team))
        .route("/teams/{team_id}/", delete(teams_handlers::delete_team))
        .route(
            "/teams/{team_id}/members/",
            post(teams_handlers::add_team_members),
        )
}

/// Creates the projects API router
pub fn create_projects_router() -> Router<AppState> {
    Router::new()
        .route("/projects/", get(projects_handlers::list_projects))
        .route("/projects/", post(projects_handlers::create_project))
        .route("/projects/{project_id}", get(projects_handlers::get_project))
        .route(
            "/projects/{project_id}",
            put(projects_handlers::update_project),
        )
        .route(
            "/projects/{project_id}",
            delete(projects_handlers::delete_project),
        )
        .route(
            "/projects/{project_id}/members/",
            post(projects_handlers::add_member),
        )
        .route(
            "/projects/{project_id}/members/{user_id}/",
            put(projects_handlers::update_member_role),
        )
        .route(
            "/projects/{project_id}/members/{user_id}/",
            delete(projects_handlers::remove_member),
        )
        .route(
            "/projects/{project_id}/archive/",
            post(projects_handlers::archive_project),
        )
        .route(
            "/projects/{project_id}/restore/",
            post(projects_handlers::restore_project),
        )
        .route(
            "/projects/{project_id}/tasks/grouped/",
            get(tasks_handlers::grouped_tasks),
        )
}

/// Creates the tasks API router
pub fn create_tasks_router() -> Router<AppState> {
    Router::new()
        .route("/tasks/", get(tasks_handlers::list_tasks))
        .route("/tasks/", post(tasks_handlers::create_task))
        .route(
            "/tasks/personal/",
            get(tasks_handlers::list_personal_tasks),
        )
        .route("/tasks/{task_id}", get(tasks_handlers::get_task))
        .route("/tasks/{task_id}", put(tasks_handlers::update_task))
        .route("/tasks/{task_id}", delete(tasks_handlers::delete_task))
}
