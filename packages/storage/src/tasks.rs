// ABOUTME: Task storage layer using SQLite
// ABOUTME: Views join project, creator and assignee in one query

use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::debug;

use taskhive_core::{ProjectSlim, Task, TaskView, UserSummary};

use crate::error::StorageResult;

const VIEW_SELECT: &str = r#"
    SELECT t.*,
           p.name AS project_name,
           p.color AS project_color,
           p.archived AS project_archived,
           p.owner_id AS project_owner_id,
           c.username AS creator_username,
           c.email AS creator_email,
           c.role AS creator_role,
           a.username AS assignee_username,
           a.email AS assignee_email,
           a.role AS assignee_role
    FROM tasks t
    LEFT JOIN projects p ON t.project_id = p.id
    JOIN users c ON t.creator_id = c.id
    LEFT JOIN users a ON t.assignee_id = a.id
"#;

pub struct TaskStorage {
    pool: SqlitePool,
}

impl TaskStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, task_id: i64) -> StorageResult<Option<Task>> {
        let row = sqlx::query("SELECT * FROM tasks WHERE id = ?")
            .bind(task_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| row_to_task(&r)).transpose()
    }

    pub async fn find_view(&self, task_id: i64) -> StorageResult<Option<TaskView>> {
        debug!("Fetching task: {}", task_id);

        let sql = format!("{VIEW_SELECT} WHERE t.id = ?");
        let row = sqlx::query(&sql)
            .bind(task_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| row_to_task_view(&r)).transpose()
    }

    /// Tasks of one project, oldest first. A negative limit means no limit.
    pub async fn list_views_for_project(
        &self,
        project_id: i64,
        skip: i64,
        limit: i64,
    ) -> StorageResult<Vec<TaskView>> {
        let sql = format!(
            "{VIEW_SELECT} WHERE t.project_id = ? ORDER BY t.created_at, t.id LIMIT ? OFFSET ?"
        );
        let rows = sqlx::query(&sql)
            .bind(project_id)
            .bind(limit)
            .bind(skip)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_task_view).collect()
    }

    /// Everything the user can see: tasks in projects they belong to plus
    /// their own personal tasks. Due dates first, undated tasks last.
    pub async fn list_views_visible(
        &self,
        user_id: i64,
        skip: i64,
        limit: i64,
    ) -> StorageResult<Vec<TaskView>> {
        let sql = format!(
            r#"{VIEW_SELECT}
            WHERE t.project_id IN (SELECT project_id FROM project_members WHERE user_id = ?)
               OR (t.is_personal = 1 AND t.creator_id = ?)
            ORDER BY t.due_date IS NULL, t.due_date ASC, t.id
            LIMIT ? OFFSET ?"#
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(user_id)
            .bind(limit)
            .bind(skip)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_task_view).collect()
    }

    pub async fn list_personal_views(
        &self,
        user_id: i64,
        skip: i64,
        limit: i64,
    ) -> StorageResult<Vec<TaskView>> {
        let sql = format!(
            r#"{VIEW_SELECT}
            WHERE t.is_personal = 1 AND t.creator_id = ?
            ORDER BY t.due_date IS NULL, t.due_date ASC, t.id
            LIMIT ? OFFSET ?"#
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(limit)
            .bind(skip)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_task_view).collect()
    }

    /// Inserts a task and returns its id. The caller has already resolved
    /// every date and flag on the struct; `task.id` is ignored.
    pub async fn insert(&self, task: &Task) -> StorageResult<i64> {
        debug!("Creating task: {}", task.title);

        let result = sqlx::query(
            r#"
            INSERT INTO tasks (
                title, description, completed, status, priority,
                start_date, end_date, due_date, tags,
                creator_id, assignee_id, project_id, is_personal, parent_task_id,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.completed)
        .bind(task.status)
        .bind(task.priority)
        .bind(task.start_date)
        .bind(task.end_date)
        .bind(task.due_date)
        .bind(&task.tags)
        .bind(task.creator_id)
        .bind(task.assignee_id)
        .bind(task.project_id)
        .bind(task.is_personal)
        .bind(task.parent_task_id)
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Writes back every mutable column. Creator, project and the
    /// personal flag are immutable after creation.
    pub async fn update_row(&self, task: &Task) -> StorageResult<()> {
        debug!("Updating task: {}", task.id);

        sqlx::query(
            r#"
            UPDATE tasks SET
                title = ?, description = ?, completed = ?, status = ?, priority = ?,
                start_date = ?, end_date = ?, due_date = ?, tags = ?,
                assignee_id = ?, parent_task_id = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.completed)
        .bind(task.status)
        .bind(task.priority)
        .bind(task.start_date)
        .bind(task.end_date)
        .bind(task.due_date)
        .bind(&task.tags)
        .bind(task.assignee_id)
        .bind(task.parent_task_id)
        .bind(task.updated_at)
        .bind(task.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete(&self, task_id: i64) -> StorageResult<()> {
        sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(task_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Clears the assignee on every task in the project currently assigned
    /// to the given user. Runs inside the caller's transaction alongside
    /// the membership removal.
    pub async fn clear_project_assignments_tx(
        conn: &mut SqliteConnection,
        project_id: i64,
        user_id: i64,
    ) -> StorageResult<u64> {
        let result =
            sqlx::query("UPDATE tasks SET assignee_id = NULL WHERE project_id = ? AND assignee_id = ?")
                .bind(project_id)
                .bind(user_id)
                .execute(conn)
                .await?;
        Ok(result.rows_affected())
    }
}

fn row_to_task(row: &sqlx::sqlite::SqliteRow) -> StorageResult<Task> {
    Ok(Task {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        completed: row.try_get("completed")?,
        status: row.try_get("status")?,
        priority: row.try_get("priority")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        due_date: row.try_get("due_date")?,
        tags: row.try_get("tags")?,
        creator_id: row.try_get("creator_id")?,
        assignee_id: row.try_get("assignee_id")?,
        project_id: row.try_get("project_id")?,
        is_personal: row.try_get("is_personal")?,
        parent_task_id: row.try_get("parent_task_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_task_view(row: &sqlx::sqlite::SqliteRow) -> StorageResult<TaskView> {
    let project_id: Option<i64> = row.try_get("project_id")?;
    let project = match project_id {
        Some(id) => Some(ProjectSlim {
            id,
            name: row.try_get("project_name")?,
            color: row.try_get("project_color")?,
            archived: row.try_get("project_archived")?,
            owner_id: row.try_get("project_owner_id")?,
        }),
        None => None,
    };

    let assignee_id: Option<i64> = row.try_get("assignee_id")?;
    let assignee = match assignee_id {
        Some(id) => Some(UserSummary {
            id,
            username: row.try_get("assignee_username")?,
            email: row.try_get("assignee_email")?,
            role: row.try_get("assignee_role")?,
        }),
        None => None,
    };

    Ok(TaskView {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        completed: row.try_get("completed")?,
        status: row.try_get("status")?,
        priority: row.try_get("priority")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        due_date: row.try_get("due_date")?,
        tags: row.try_get("tags")?,
        project,
        creator: UserSummary {
            id: row.try_get("creator_id")?,
            username: row.try_get("creator_username")?,
            email: row.try_get("creator_email")?,
            role: row.try_get("creator_role")?,
        },
        assignee,
        is_personal: row.try_get("is_personal")?,
        parent_task_id: row.try_get("parent_task_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
