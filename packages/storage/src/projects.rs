// ABOUTME: Project and membership storage layer using SQLite
// ABOUTME: Detail views load owner, memberships and task counts eagerly

use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::debug;

use taskhive_core::time::now_local;
use taskhive_core::{
    MembershipView, Project, ProjectListFilter, ProjectMember, ProjectRole, ProjectView,
    UserSummary,
};

use crate::error::StorageResult;

pub struct ProjectStorage {
    pool: SqlitePool,
}

impl ProjectStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, project_id: i64) -> StorageResult<Option<Project>> {
        let row = sqlx::query("SELECT * FROM projects WHERE id = ?")
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| row_to_project(&r)).transpose()
    }

    /// Project detail with owner summary, memberships and task count.
    pub async fn find_view(&self, project_id: i64) -> StorageResult<Option<ProjectView>> {
        debug!("Fetching project: {}", project_id);

        let row = sqlx::query(
            r#"
            SELECT p.*,
                   u.username AS owner_username,
                   u.email AS owner_email,
                   u.role AS owner_role
            FROM projects p
            JOIN users u ON p.owner_id = u.id
            WHERE p.id = ?
            "#,
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?;

        let base = match row {
            Some(row) => view_base(&row)?,
            None => return Ok(None),
        };
        Ok(Some(self.enrich_view(base).await?))
    }

    /// Lists project views, newest activity first. `visible_to` restricts
    /// the listing to projects where that user holds a membership; `None`
    /// lists everything (admin).
    pub async fn list_views(
        &self,
        visible_to: Option<i64>,
        filter: &ProjectListFilter,
    ) -> StorageResult<Vec<ProjectView>> {
        let mut sql = String::from(
            r#"
            SELECT p.*,
                   u.username AS owner_username,
                   u.email AS owner_email,
                   u.role AS owner_role
            FROM projects p
            JOIN users u ON p.owner_id = u.id
            WHERE 1 = 1
            "#,
        );

        if visible_to.is_some() {
            sql.push_str(
                " AND EXISTS (SELECT 1 FROM project_members m WHERE m.project_id = p.id AND m.user_id = ?)",
            );
        }
        if filter.archived.is_some() {
            sql.push_str(" AND p.archived = ?");
        }
        if filter.search.is_some() {
            sql.push_str(" AND p.name LIKE ?");
        }
        sql.push_str(" ORDER BY p.updated_at DESC");

        let mut query = sqlx::query(&sql);
        if let Some(user_id) = visible_to {
            query = query.bind(user_id);
        }
        if let Some(archived) = filter.archived {
            query = query.bind(archived);
        }
        if let Some(search) = &filter.search {
            query = query.bind(format!("%{}%", search));
        }

        let rows = query.fetch_all(&self.pool).await?;
        let bases: Vec<ProjectView> = rows
            .iter()
            .map(view_base)
            .collect::<StorageResult<Vec<_>>>()?;
        drop(rows);

        let mut views = Vec::with_capacity(bases.len());
        for base in bases {
            views.push(self.enrich_view(base).await?);
        }
        Ok(views)
    }

    pub async fn membership_of(
        &self,
        project_id: i64,
        user_id: i64,
    ) -> StorageResult<Option<ProjectMember>> {
        let row = sqlx::query(
            "SELECT * FROM project_members WHERE project_id = ? AND user_id = ?",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| row_to_membership(&r)).transpose()
    }

    pub async fn update_fields(
        &self,
        project_id: i64,
        name: &str,
        description: Option<&str>,
        color: Option<&str>,
        archived: bool,
    ) -> StorageResult<()> {
        debug!("Updating project: {}", project_id);

        sqlx::query(
            "UPDATE projects SET name = ?, description = ?, color = ?, archived = ?, updated_at = ? WHERE id = ?",
        )
        .bind(name)
        .bind(description)
        .bind(color)
        .bind(archived)
        .bind(now_local())
        .bind(project_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn set_archived(&self, project_id: i64, archived: bool) -> StorageResult<()> {
        sqlx::query("UPDATE projects SET archived = ?, updated_at = ? WHERE id = ?")
            .bind(archived)
            .bind(now_local())
            .bind(project_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn update_membership_role(
        &self,
        project_id: i64,
        user_id: i64,
        role: ProjectRole,
    ) -> StorageResult<()> {
        sqlx::query("UPDATE project_members SET role = ? WHERE project_id = ? AND user_id = ?")
            .bind(role)
            .bind(project_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Inserts a project row inside a caller-owned transaction.
    pub async fn insert_tx(
        conn: &mut SqliteConnection,
        name: &str,
        description: Option<&str>,
        color: Option<&str>,
        owner_id: i64,
    ) -> StorageResult<i64> {
        let now = now_local();
        let result = sqlx::query(
            r#"
            INSERT INTO projects (name, description, color, owner_id, archived, created_at, updated_at)
            VALUES (?, ?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(color)
        .bind(owner_id)
        .bind(now)
        .bind(now)
        .execute(conn)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn insert_membership_tx(
        conn: &mut SqliteConnection,
        project_id: i64,
        user_id: i64,
        role: ProjectRole,
    ) -> StorageResult<()> {
        sqlx::query(
            "INSERT INTO project_members (project_id, user_id, role, joined_at) VALUES (?, ?, ?, ?)",
        )
        .bind(project_id)
        .bind(user_id)
        .bind(role)
        .bind(now_local())
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn delete_membership_tx(
        conn: &mut SqliteConnection,
        project_id: i64,
        user_id: i64,
    ) -> StorageResult<()> {
        sqlx::query("DELETE FROM project_members WHERE project_id = ? AND user_id = ?")
            .bind(project_id)
            .bind(user_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Deletes a project and everything hanging off it. The explicit
    /// child deletes keep the cascade deterministic regardless of the
    /// connection's foreign-key mode.
    pub async fn delete_tx(conn: &mut SqliteConnection, project_id: i64) -> StorageResult<()> {
        sqlx::query("DELETE FROM tasks WHERE project_id = ?")
            .bind(project_id)
            .execute(&mut *conn)
            .await?;
        sqlx::query("DELETE FROM project_members WHERE project_id = ?")
            .bind(project_id)
            .execute(&mut *conn)
            .await?;
        sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(project_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Fills in the relationship data the base row cannot carry.
    async fn enrich_view(&self, mut view: ProjectView) -> StorageResult<ProjectView> {
        view.memberships = self.memberships_view(view.id).await?;
        view.member_count = view.memberships.len();
        view.task_count = sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE project_id = ?")
            .bind(view.id)
            .fetch_one(&self.pool)
            .await?;
        Ok(view)
    }

    async fn memberships_view(&self, project_id: i64) -> StorageResult<Vec<MembershipView>> {
        let rows = sqlx::query(
            r#"
            SELECT m.role AS member_role, m.joined_at,
                   u.id, u.username, u.email, u.role
            FROM project_members m
            JOIN users u ON m.user_id = u.id
            WHERE m.project_id = ?
            ORDER BY m.joined_at, u.id
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(MembershipView {
                    user: UserSummary {
                        id: row.try_get("id")?,
                        username: row.try_get("username")?,
                        email: row.try_get("email")?,
                        role: row.try_get("role")?,
                    },
                    role: row.try_get("member_role")?,
                    joined_at: row.try_get("joined_at")?,
                })
            })
            .collect()
    }
}

fn view_base(row: &sqlx::sqlite::SqliteRow) -> StorageResult<ProjectView> {
    Ok(ProjectView {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        color: row.try_get("color")?,
        archived: row.try_get("archived")?,
        owner: UserSummary {
            id: row.try_get("owner_id")?,
            username: row.try_get("owner_username")?,
            email: row.try_get("owner_email")?,
            role: row.try_get("owner_role")?,
        },
        memberships: Vec::new(),
        member_count: 0,
        task_count: 0,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_project(row: &sqlx::sqlite::SqliteRow) -> StorageResult<Project> {
    Ok(Project {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        color: row.try_get("color")?,
        owner_id: row.try_get("owner_id")?,
        archived: row.try_get("archived")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_membership(row: &sqlx::sqlite::SqliteRow) -> StorageResult<ProjectMember> {
    Ok(ProjectMember {
        project_id: row.try_get("project_id")?,
        user_id: row.try_get("user_id")?,
        role: row.try_get("role")?,
        joined_at: row.try_get("joined_at")?,
    })
}
