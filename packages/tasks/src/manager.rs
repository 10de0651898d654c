use chrono::NaiveDateTime;
use tracing::info;

use taskhive_core::time::now_local;
use taskhive_core::{
    DomainError, DomainResult, ProjectRole, ProjectView, Task, TaskCreateInput, TaskListFilter,
    TaskStatus, TaskUpdateInput, TaskView, TasksByStatus, User,
};
use taskhive_storage::DbState;

const DEFAULT_PAGE: i64 = 20;
const PERSONAL_PAGE: i64 = 50;

/// Task lifecycle operations. Couples the authorization tiers (admin,
/// creator, project manager/owner, assignee, member) with the
/// status/completed/end_date state machine.
#[derive(Clone)]
pub struct TaskManager {
    db: DbState,
}

impl TaskManager {
    pub fn new(db: DbState) -> Self {
        Self { db }
    }

    pub async fn create_task(
        &self,
        requester: &User,
        input: TaskCreateInput,
    ) -> DomainResult<TaskView> {
        let now = now_local();
        let mut task = Task {
            id: 0,
            title: input.title,
            description: input.description,
            completed: false,
            status: input.status.unwrap_or_default(),
            priority: input.priority.unwrap_or_default(),
            start_date: Some(input.start_date.map(Into::into).unwrap_or(now)),
            end_date: None,
            due_date: input.due_date.map(Into::into),
            tags: input.tags,
            creator_id: requester.id,
            assignee_id: input.assignee_id,
            project_id: input.project_id,
            is_personal: input.is_personal,
            parent_task_id: input.parent_task_id,
            created_at: now,
            updated_at: now,
        };

        if task.is_personal {
            if task.project_id.is_some() {
                return Err(DomainError::validation(
                    "Personal tasks cannot belong to a project",
                ));
            }
            if task.parent_task_id.is_some() {
                return Err(DomainError::validation(
                    "Personal tasks do not support subtasks yet",
                ));
            }
            if let Some(assignee_id) = task.assignee_id {
                if assignee_id != requester.id {
                    return Err(DomainError::forbidden(
                        "Personal tasks can only be assigned to yourself",
                    ));
                }
            }
            task.assignee_id = Some(requester.id);
        } else {
            let project_id = task
                .project_id
                .ok_or_else(|| DomainError::validation("Project is required for team tasks"))?;
            let project = self.require_project(project_id).await?;
            if project.archived {
                return Err(DomainError::validation(
                    "Cannot create tasks in an archived project",
                ));
            }
            self.ensure_member(requester, &project)?;

            if let Some(assignee_id) = task.assignee_id {
                self.ensure_assignable(assignee_id, &project).await?;
            }
            if let Some(parent_id) = task.parent_task_id {
                self.ensure_valid_parent(parent_id, Some(project_id), None).await?;
            }
        }

        // A task born done runs the same terminal transition as an update,
        // so completed/status/end_date agree from the first write.
        if task.status == TaskStatus::Done {
            apply_done_transition(&mut task, now)?;
        }

        let task_id = self.db.tasks.insert(&task).await?;
        info!("Created task '{}' with id {}", task.title, task_id);
        self.require_view(task_id).await
    }

    pub async fn list_tasks(
        &self,
        requester: &User,
        filter: &TaskListFilter,
    ) -> DomainResult<Vec<TaskView>> {
        let skip = filter.skip.unwrap_or(0).max(0);
        let limit = filter.limit.unwrap_or(DEFAULT_PAGE);

        if let Some(project_id) = filter.project_id {
            let project = self.require_project(project_id).await?;
            if !requester.is_admin() && project.role_of(requester.id).is_none() {
                return Err(DomainError::forbidden("Project access denied"));
            }
            Ok(self
                .db
                .tasks
                .list_views_for_project(project_id, skip, limit)
                .await?)
        } else {
            Ok(self
                .db
                .tasks
                .list_views_visible(requester.id, skip, limit)
                .await?)
        }
    }

    pub async fn personal_tasks(
        &self,
        requester: &User,
        skip: Option<i64>,
        limit: Option<i64>,
    ) -> DomainResult<Vec<TaskView>> {
        Ok(self
            .db
            .tasks
            .list_personal_views(
                requester.id,
                skip.unwrap_or(0).max(0),
                limit.unwrap_or(PERSONAL_PAGE),
            )
            .await?)
    }

    pub async fn get_task(&self, requester: &User, task_id: i64) -> DomainResult<TaskView> {
        let view = self.require_view(task_id).await?;

        if view.is_personal {
            if view.creator.id != requester.id {
                return Err(DomainError::forbidden("You cannot view this personal task"));
            }
            return Ok(view);
        }

        let project = self.require_task_project(&view).await?;
        self.ensure_member(requester, &project)?;
        Ok(view)
    }

    /// Board view: a project's tasks bucketed by status.
    pub async fn grouped_by_status(
        &self,
        requester: &User,
        project_id: i64,
    ) -> DomainResult<TasksByStatus> {
        let project = self.require_project(project_id).await?;
        if !requester.is_admin() && project.role_of(requester.id).is_none() {
            return Err(DomainError::forbidden("Project access denied"));
        }

        let tasks = self
            .db
            .tasks
            .list_views_for_project(project_id, 0, -1)
            .await?;

        let mut grouped = TasksByStatus {
            to_do: Vec::new(),
            in_progress: Vec::new(),
            done: Vec::new(),
        };
        for task in tasks {
            match task.status {
                TaskStatus::ToDo => grouped.to_do.push(task),
                TaskStatus::InProgress => grouped.in_progress.push(task),
                TaskStatus::Done => grouped.done.push(task),
            }
        }
        Ok(grouped)
    }

    pub async fn update_task(
        &self,
        requester: &User,
        task_id: i64,
        patch: TaskUpdateInput,
    ) -> DomainResult<TaskView> {
        let mut task = self
            .db
            .tasks
            .find(task_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Task not found"))?;

        let project = if task.is_personal {
            if task.creator_id != requester.id {
                return Err(DomainError::forbidden(
                    "You cannot modify this personal task",
                ));
            }
            None
        } else {
            let project = self.require_task_project_raw(&task).await?;
            self.authorize_update(requester, &task, &project, &patch)?;
            Some(project)
        };

        let now = now_local();

        // Merge the deadline first so the state machine always judges
        // against the value this request puts in effect.
        if let Some(due_date) = patch.due_date {
            task.due_date = due_date.map(Into::into);
        }

        if let Some(change) = patch.assignee_id {
            match change {
                None => task.assignee_id = None,
                Some(assignee_id) => {
                    if task.is_personal {
                        if assignee_id != requester.id {
                            return Err(DomainError::forbidden(
                                "Personal tasks can only be assigned to yourself",
                            ));
                        }
                        task.assignee_id = Some(assignee_id);
                    } else {
                        let project = project.as_ref().ok_or_else(|| {
                            DomainError::internal("project task without project context")
                        })?;
                        self.ensure_assignable(assignee_id, project).await?;
                        task.assignee_id = Some(assignee_id);
                    }
                }
            }
        }

        if let Some(change) = patch.parent_task_id {
            match change {
                None => task.parent_task_id = None,
                Some(parent_id) => {
                    if task.is_personal {
                        return Err(DomainError::validation(
                            "Personal tasks do not support subtasks yet",
                        ));
                    }
                    self.ensure_valid_parent(parent_id, task.project_id, Some(task.id))
                        .await?;
                    task.parent_task_id = Some(parent_id);
                }
            }
        }

        // completed and status are two views of one concept: a bare
        // completed flag defaults the status, and status decides the
        // terminal state when both are present.
        let mut effective_status = patch.status;
        if let Some(flag) = patch.completed {
            task.completed = flag;
            if flag {
                if effective_status.is_none() {
                    effective_status = Some(TaskStatus::Done);
                }
            } else if task.status == TaskStatus::Done && effective_status.is_none() {
                effective_status = Some(TaskStatus::ToDo);
            }
        }

        if let Some(new_status) = effective_status {
            if new_status == TaskStatus::Done {
                apply_done_transition(&mut task, now)?;
            } else {
                task.status = new_status;
                task.completed = false;
                task.end_date = None;
            }
        } else if patch.due_date.is_some() && task.status == TaskStatus::Done {
            if let (Some(due), Some(end)) = (task.due_date, task.end_date) {
                if end > due {
                    return Err(DomainError::invalid_state(
                        "Due date must be later than the completion time.",
                    ));
                }
            }
        }

        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = description;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(start_date) = patch.start_date {
            task.start_date = start_date.map(Into::into);
        }
        if let Some(tags) = patch.tags {
            task.tags = tags;
        }
        task.updated_at = now;

        self.db.tasks.update_row(&task).await?;
        self.require_view(task.id).await
    }

    /// Deletes a task. Personal tasks: creator only. Project tasks: admin
    /// or a manager/owner-role member.
    pub async fn delete_task(&self, requester: &User, task_id: i64) -> DomainResult<TaskView> {
        let view = self.require_view(task_id).await?;

        if view.is_personal {
            if view.creator.id != requester.id {
                return Err(DomainError::forbidden(
                    "Only the creator can delete this personal task",
                ));
            }
        } else {
            let project = self.require_task_project(&view).await?;
            if !requester.is_admin() {
                match project.role_of(requester.id) {
                    Some(ProjectRole::Owner) | Some(ProjectRole::Manager) => {}
                    Some(ProjectRole::Member) => {
                        return Err(DomainError::forbidden(
                            "Only project managers or the owner can delete this task",
                        ));
                    }
                    None => {
                        return Err(DomainError::forbidden(
                            "You are not a member of this project",
                        ));
                    }
                }
            }
        }

        self.db.tasks.delete(task_id).await?;
        info!("Deleted task {}", task_id);
        Ok(view)
    }

    /// Update authorization tiers for project tasks, most to least
    /// permissive. The assignee tier is all-or-nothing: a restricted
    /// request naming any other field is rejected wholesale.
    fn authorize_update(
        &self,
        requester: &User,
        task: &Task,
        project: &ProjectView,
        patch: &TaskUpdateInput,
    ) -> DomainResult<()> {
        if requester.is_admin() {
            return Ok(());
        }

        let role = project.role_of(requester.id);
        let full_edit = task.creator_id == requester.id
            || matches!(role, Some(ProjectRole::Owner) | Some(ProjectRole::Manager));
        if full_edit {
            return Ok(());
        }

        if role.is_none() {
            return Err(DomainError::forbidden(
                "You are not a member of this project",
            ));
        }
        if task.assignee_id != Some(requester.id) {
            return Err(DomainError::forbidden("You cannot modify this task"));
        }
        if !patch.is_status_only() {
            return Err(DomainError::forbidden(
                "Assignees may only update status and completion",
            ));
        }
        Ok(())
    }

    fn ensure_member(&self, user: &User, project: &ProjectView) -> DomainResult<()> {
        if user.is_admin() || project.role_of(user.id).is_some() {
            Ok(())
        } else {
            Err(DomainError::forbidden(
                "You are not a member of this project",
            ))
        }
    }

    /// Assignees must be active users holding a membership in the task's
    /// project. Checked identically at creation and on every reassignment.
    async fn ensure_assignable(&self, user_id: i64, project: &ProjectView) -> DomainResult<()> {
        match self.db.users.find_by_id(user_id).await? {
            Some(user) if user.is_active => {}
            _ => return Err(DomainError::not_found("Assignee not found")),
        }
        if project.role_of(user_id).is_none() {
            return Err(DomainError::forbidden(
                "Assignee is not a member of this project",
            ));
        }
        Ok(())
    }

    /// A parent must exist in the same project, and a task cannot be its
    /// own parent.
    async fn ensure_valid_parent(
        &self,
        parent_id: i64,
        project_id: Option<i64>,
        task_id: Option<i64>,
    ) -> DomainResult<()> {
        if task_id == Some(parent_id) {
            return Err(DomainError::validation("Invalid parent task"));
        }
        match self.db.tasks.find(parent_id).await? {
            Some(parent) if parent.project_id == project_id => Ok(()),
            _ => Err(DomainError::validation("Invalid parent task")),
        }
    }

    async fn require_view(&self, task_id: i64) -> DomainResult<TaskView> {
        self.db
            .tasks
            .find_view(task_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Task not found"))
    }

    async fn require_project(&self, project_id: i64) -> DomainResult<ProjectView> {
        self.db
            .projects
            .find_view(project_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Project not found"))
    }

    async fn require_task_project(&self, view: &TaskView) -> DomainResult<ProjectView> {
        let project_id = view
            .project
            .as_ref()
            .map(|p| p.id)
            .ok_or_else(|| DomainError::internal("project task without project context"))?;
        self.require_project(project_id).await
    }

    async fn require_task_project_raw(&self, task: &Task) -> DomainResult<ProjectView> {
        let project_id = task
            .project_id
            .ok_or_else(|| DomainError::internal("project task without project context"))?;
        self.require_project(project_id).await
    }
}

/// Terminal transition shared by creation and update: stamps the
/// completion time, flips the completed flag, and enforces the deadline.
fn apply_done_transition(task: &mut Task, now: NaiveDateTime) -> DomainResult<()> {
    if let Some(due) = task.due_date {
        if now > due {
            return Err(DomainError::invalid_state(
                "Cannot mark task as done after its due date. Adjust the due date first.",
            ));
        }
    }
    task.status = TaskStatus::Done;
    task.completed = true;
    task.end_date = Some(now);
    Ok(())
}
