use tracing::info;

use taskhive_core::{
    DomainError, DomainResult, MemberAddInput, ProjectCreateInput, ProjectListFilter, ProjectRole,
    ProjectUpdateInput, ProjectView, SystemRole, User,
};
use taskhive_storage::{DbState, ProjectStorage, StorageError, TaskStorage};

/// Project and membership operations. System-role admins bypass every
/// project-role check; everyone else is judged strictly by their
/// membership row.
#[derive(Clone)]
pub struct ProjectManager {
    db: DbState,
}

impl ProjectManager {
    pub fn new(db: DbState) -> Self {
        Self { db }
    }

    /// Creates a project with the requester as owner. Requires system role
    /// manager or admin. The member batch is validated up front and the
    /// whole creation aborts on the first invalid id.
    pub async fn create_project(
        &self,
        requester: &User,
        input: ProjectCreateInput,
    ) -> DomainResult<ProjectView> {
        if !matches!(requester.role, SystemRole::Manager | SystemRole::Admin) {
            return Err(DomainError::forbidden(
                "Only managers or administrators can create projects",
            ));
        }

        let mut member_ids = input.member_ids.clone();
        member_ids.sort_unstable();
        member_ids.dedup();
        member_ids.retain(|id| *id != requester.id);

        for member_id in &member_ids {
            match self.db.users.find_by_id(*member_id).await? {
                Some(user) if user.is_active => {}
                _ => {
                    return Err(DomainError::validation("One or more members do not exist"));
                }
            }
        }

        let mut tx = self.db.pool.begin().await.map_err(StorageError::from)?;
        let project_id = ProjectStorage::insert_tx(
            &mut tx,
            &input.name,
            input.description.as_deref(),
            input.color.as_deref(),
            requester.id,
        )
        .await?;
        ProjectStorage::insert_membership_tx(&mut tx, project_id, requester.id, ProjectRole::Owner)
            .await?;
        for member_id in &member_ids {
            ProjectStorage::insert_membership_tx(&mut tx, project_id, *member_id, ProjectRole::Member)
                .await?;
        }
        tx.commit().await.map_err(StorageError::from)?;

        info!("Created project '{}' with id {}", input.name, project_id);
        self.require_view(project_id).await
    }

    /// Lists projects visible to the requester: admins see all, everyone
    /// else only projects where they hold a membership.
    pub async fn list_projects(
        &self,
        requester: &User,
        filter: &ProjectListFilter,
    ) -> DomainResult<Vec<ProjectView>> {
        let visible_to = if requester.is_admin() {
            None
        } else {
            Some(requester.id)
        };
        Ok(self.db.projects.list_views(visible_to, filter).await?)
    }

    pub async fn get_project(&self, requester: &User, project_id: i64) -> DomainResult<ProjectView> {
        let view = self.require_view(project_id).await?;
        if !requester.is_admin() && view.role_of(requester.id).is_none() {
            return Err(DomainError::forbidden(
                "You are not a member of this project",
            ));
        }
        Ok(view)
    }

    /// Partial update of name/description/color/archived. Admin or the
    /// project owner.
    pub async fn update_project(
        &self,
        requester: &User,
        project_id: i64,
        input: ProjectUpdateInput,
    ) -> DomainResult<ProjectView> {
        let view = self.require_view(project_id).await?;
        if !requester.is_admin() && view.owner.id != requester.id {
            return Err(DomainError::forbidden(
                "Only the project owner can perform this action",
            ));
        }

        let name = input.name.unwrap_or_else(|| view.name.clone());
        let description = input.description.or_else(|| view.description.clone());
        let color = input.color.or_else(|| view.color.clone());
        let archived = input.archived.unwrap_or(view.archived);

        self.db
            .projects
            .update_fields(
                project_id,
                &name,
                description.as_deref(),
                color.as_deref(),
                archived,
            )
            .await?;

        self.require_view(project_id).await
    }

    /// Adds a member. Admin, owner or a manager-role member may do this;
    /// ownership is not grantable here.
    pub async fn add_member(
        &self,
        requester: &User,
        project_id: i64,
        input: MemberAddInput,
    ) -> DomainResult<ProjectView> {
        let view = self.require_view(project_id).await?;
        self.ensure_can_manage_members(requester, &view)?;

        if input.role == ProjectRole::Owner {
            return Err(DomainError::validation("Ownership is not grantable"));
        }
        if view.role_of(input.user_id).is_some() {
            return Err(DomainError::validation(
                "User is already a member of this project",
            ));
        }
        match self.db.users.find_by_id(input.user_id).await? {
            Some(user) if user.is_active => {}
            _ => {
                return Err(DomainError::validation(
                    "User does not exist or is inactive",
                ));
            }
        }

        let mut conn = self.db.pool.acquire().await.map_err(StorageError::from)?;
        ProjectStorage::insert_membership_tx(&mut conn, project_id, input.user_id, input.role)
            .await?;
        drop(conn);

        info!(
            "Added user {} to project {} as {:?}",
            input.user_id, project_id, input.role
        );
        self.require_view(project_id).await
    }

    /// Changes a member's role. Admin or owner only. Ownership transfer is
    /// out of scope: the owner keeps the owner role and nobody else may
    /// receive it.
    pub async fn update_member_role(
        &self,
        requester: &User,
        project_id: i64,
        user_id: i64,
        new_role: ProjectRole,
    ) -> DomainResult<ProjectView> {
        let view = self.require_view(project_id).await?;
        if !requester.is_admin() && view.role_of(requester.id) != Some(ProjectRole::Owner) {
            return Err(DomainError::forbidden(
                "Only the project owner can change member roles",
            ));
        }

        let current = view
            .role_of(user_id)
            .ok_or_else(|| DomainError::not_found("Membership not found"))?;

        if current == ProjectRole::Owner && new_role != ProjectRole::Owner {
            return Err(DomainError::validation(
                "Ownership transfer is not supported",
            ));
        }
        if current != ProjectRole::Owner && new_role == ProjectRole::Owner {
            return Err(DomainError::validation(
                "Ownership transfer is not supported",
            ));
        }

        self.db
            .projects
            .update_membership_role(project_id, user_id, new_role)
            .await?;

        self.require_view(project_id).await
    }

    /// Removes a member and clears their task assignments within the
    /// project, atomically. The owner cannot be removed.
    pub async fn remove_member(
        &self,
        requester: &User,
        project_id: i64,
        user_id: i64,
    ) -> DomainResult<ProjectView> {
        let view = self.require_view(project_id).await?;
        self.ensure_can_manage_members(requester, &view)?;

        let role = view
            .role_of(user_id)
            .ok_or_else(|| DomainError::not_found("Membership not found"))?;
        if role == ProjectRole::Owner {
            return Err(DomainError::validation("The project owner cannot be removed"));
        }

        let mut tx = self.db.pool.begin().await.map_err(StorageError::from)?;
        ProjectStorage::delete_membership_tx(&mut tx, project_id, user_id).await?;
        let cleared = TaskStorage::clear_project_assignments_tx(&mut tx, project_id, user_id).await?;
        tx.commit().await.map_err(StorageError::from)?;

        info!(
            "Removed user {} from project {} ({} assignments cleared)",
            user_id, project_id, cleared
        );
        self.require_view(project_id).await
    }

    /// Archives or restores a project. Strictly the owner project role (a
    /// manager-role member is not enough), or admin.
    pub async fn set_archived(
        &self,
        requester: &User,
        project_id: i64,
        archived: bool,
    ) -> DomainResult<ProjectView> {
        let view = self.require_view(project_id).await?;
        if !requester.is_admin() && view.role_of(requester.id) != Some(ProjectRole::Owner) {
            return Err(DomainError::forbidden(
                "Only the project owner can archive or restore it",
            ));
        }

        self.db.projects.set_archived(project_id, archived).await?;
        self.require_view(project_id).await
    }

    /// Deletes a project with its memberships and tasks. Admin or the
    /// owning user.
    pub async fn delete_project(&self, requester: &User, project_id: i64) -> DomainResult<()> {
        let view = self.require_view(project_id).await?;
        if !requester.is_admin() && view.owner.id != requester.id {
            return Err(DomainError::forbidden(
                "Only the project owner can perform this action",
            ));
        }

        let mut tx = self.db.pool.begin().await.map_err(StorageError::from)?;
        ProjectStorage::delete_tx(&mut tx, project_id).await?;
        tx.commit().await.map_err(StorageError::from)?;

        info!("Deleted project {}", project_id);
        Ok(())
    }

    async fn require_view(&self, project_id: i64) -> DomainResult<ProjectView> {
        self.db
            .projects
            .find_view(project_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Project not found"))
    }

    fn ensure_can_manage_members(&self, requester: &User, view: &ProjectView) -> DomainResult<()> {
        if requester.is_admin() {
            return Ok(());
        }
        match view.role_of(requester.id) {
            Some(ProjectRole::Owner) | Some(ProjectRole::Manager) => Ok(()),
            _ => Err(DomainError::forbidden(
                "Only project managers or the owner can manage members",
            )),
        }
    }
}
