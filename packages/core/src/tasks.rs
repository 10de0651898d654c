// ABOUTME: Task types and the status/completion state machine vocabulary
// ABOUTME: status, completed and end_date are three views of one concept

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::patch::patch_field;
use crate::projects::ProjectSlim;
use crate::time::LocalTimestamp;
use crate::users::UserSummary;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    ToDo,
    InProgress,
    Done,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    pub due_date: Option<NaiveDateTime>,
    pub tags: Option<String>,
    pub creator_id: i64,
    pub assignee_id: Option<i64>,
    pub project_id: Option<i64>,
    pub is_personal: bool,
    pub parent_task_id: Option<i64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Task detail with project, creator and assignee eagerly loaded.
#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    pub due_date: Option<NaiveDateTime>,
    pub tags: Option<String>,
    pub project: Option<ProjectSlim>,
    pub creator: UserSummary,
    pub assignee: Option<UserSummary>,
    pub is_personal: bool,
    pub parent_task_id: Option<i64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskCreateInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub start_date: Option<LocalTimestamp>,
    #[serde(default)]
    pub due_date: Option<LocalTimestamp>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub assignee_id: Option<i64>,
    #[serde(default)]
    pub parent_task_id: Option<i64>,
    #[serde(default)]
    pub is_personal: bool,
}

/// Partial task update. Patch fields distinguish "absent" from "null":
/// `end_date` is deliberately not accepted, it is owned by the state
/// machine.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskUpdateInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "patch_field")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default, deserialize_with = "patch_field")]
    pub start_date: Option<Option<LocalTimestamp>>,
    #[serde(default, deserialize_with = "patch_field")]
    pub due_date: Option<Option<LocalTimestamp>>,
    #[serde(default, deserialize_with = "patch_field")]
    pub tags: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_field")]
    pub assignee_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "patch_field")]
    pub parent_task_id: Option<Option<i64>>,
}

impl TaskUpdateInput {
    /// True when the request touches nothing beyond `status`/`completed`.
    /// Assignees without further roles are limited to exactly that set.
    pub fn is_status_only(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.start_date.is_none()
            && self.due_date.is_none()
            && self.tags.is_none()
            && self.assignee_id.is_none()
            && self.parent_task_id.is_none()
    }
}

/// Filters for task listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskListFilter {
    #[serde(default)]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub skip: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Board view: a project's tasks bucketed by status.
#[derive(Debug, Clone, Serialize)]
pub struct TasksByStatus {
    pub to_do: Vec<TaskView>,
    pub in_progress: Vec<TaskView>,
    pub done: Vec<TaskView>,
}
