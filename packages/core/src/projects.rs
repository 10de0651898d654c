// ABOUTME: Project and membership types
// ABOUTME: Membership rows are the single source of truth for project roles

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::users::UserSummary;

/// Role held within a single project. Exactly one membership per project
/// carries `Owner`, and ownership is not reassignable through the normal
/// member operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProjectRole {
    Owner,
    Manager,
    #[default]
    Member,
}

#[derive(Debug, Clone, Serialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub owner_id: i64,
    pub archived: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct ProjectMember {
    pub project_id: i64,
    pub user_id: i64,
    pub role: ProjectRole,
    pub joined_at: NaiveDateTime,
}

/// Membership as rendered in project detail responses.
#[derive(Debug, Clone, Serialize)]
pub struct MembershipView {
    pub user: UserSummary,
    pub role: ProjectRole,
    pub joined_at: NaiveDateTime,
}

/// Project detail with owner and memberships eagerly loaded.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectView {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub archived: bool,
    pub owner: UserSummary,
    pub memberships: Vec<MembershipView>,
    pub member_count: usize,
    pub task_count: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ProjectView {
    /// Role the given user holds in this project, if any.
    pub fn role_of(&self, user_id: i64) -> Option<ProjectRole> {
        self.memberships
            .iter()
            .find(|m| m.user.id == user_id)
            .map(|m| m.role)
    }
}

/// Compact project representation embedded in task views.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectSlim {
    pub id: i64,
    pub name: String,
    pub color: Option<String>,
    pub archived: bool,
    pub owner_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectCreateInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub member_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectUpdateInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub archived: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemberAddInput {
    pub user_id: i64,
    #[serde(default)]
    pub role: ProjectRole,
}

/// Filters for project listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectListFilter {
    #[serde(default)]
    pub archived: Option<bool>,
    #[serde(default)]
    pub search: Option<String>,
}
