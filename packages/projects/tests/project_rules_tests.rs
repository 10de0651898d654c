// ABOUTME: Integration tests for project and membership authorization
// ABOUTME: Covers the role gate, visibility, the owner invariant and removal side effects

use taskhive_core::time::now_local;
use taskhive_core::{
    DomainError, MemberAddInput, ProjectCreateInput, ProjectListFilter, ProjectRole,
    ProjectUpdateInput, SystemRole, Task, TaskPriority, TaskStatus, User,
};
use taskhive_projects::ProjectManager;
use taskhive_storage::DbState;

async fn setup() -> (DbState, ProjectManager) {
    let db = DbState::init_in_memory().await.unwrap();
    let manager = ProjectManager::new(db.clone());
    (db, manager)
}

async fn seed_user(db: &DbState, name: &str, role: SystemRole) -> User {
    db.users
        .insert(name, &format!("{name}@example.com"), "hashed", role)
        .await
        .unwrap()
}

fn create_input(name: &str, member_ids: Vec<i64>) -> ProjectCreateInput {
    ProjectCreateInput {
        name: name.to_string(),
        description: Some("workspace".to_string()),
        color: Some("#ffaa00".to_string()),
        member_ids,
    }
}

fn project_task(creator: &User, project_id: i64, assignee_id: Option<i64>) -> Task {
    let now = now_local();
    Task {
        id: 0,
        title: "Design schema".to_string(),
        description: None,
        completed: false,
        status: TaskStatus::ToDo,
        priority: TaskPriority::Medium,
        start_date: Some(now),
        end_date: None,
        due_date: None,
        tags: None,
        creator_id: creator.id,
        assignee_id,
        project_id: Some(project_id),
        is_personal: false,
        parent_task_id: None,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn user_role_cannot_create_projects() {
    let (db, manager) = setup().await;
    let alice = seed_user(&db, "alice", SystemRole::User).await;

    let result = manager
        .create_project(&alice, create_input("X", vec![]))
        .await;
    assert!(matches!(result, Err(DomainError::Forbidden(_))));
}

#[tokio::test]
async fn creation_inserts_owner_and_member_rows() {
    let (db, manager) = setup().await;
    let bob = seed_user(&db, "bob", SystemRole::Manager).await;
    let alice = seed_user(&db, "alice", SystemRole::User).await;

    let view = manager
        .create_project(&bob, create_input("X", vec![alice.id, alice.id, bob.id]))
        .await
        .unwrap();

    // Duplicates and the owner are weeded out of the member batch.
    assert_eq!(view.member_count, 2);
    assert_eq!(view.role_of(bob.id), Some(ProjectRole::Owner));
    assert_eq!(view.role_of(alice.id), Some(ProjectRole::Member));
    assert_eq!(view.owner.id, bob.id);
}

#[tokio::test]
async fn invalid_member_id_aborts_the_whole_creation() {
    let (db, manager) = setup().await;
    let bob = seed_user(&db, "bob", SystemRole::Manager).await;

    let result = manager
        .create_project(&bob, create_input("X", vec![9999]))
        .await;
    assert!(matches!(result, Err(DomainError::Validation(_))));

    // No partial rows survive the failed creation.
    let all = db
        .projects
        .list_views(None, &ProjectListFilter::default())
        .await
        .unwrap();
    assert!(all.is_empty());
}

#[tokio::test]
async fn inactive_member_id_is_rejected() {
    let (db, manager) = setup().await;
    let bob = seed_user(&db, "bob", SystemRole::Manager).await;
    let sleeper = seed_user(&db, "sleeper", SystemRole::User).await;
    sqlx::query("UPDATE users SET is_active = 0 WHERE id = ?")
        .bind(sleeper.id)
        .execute(&db.pool)
        .await
        .unwrap();

    let result = manager
        .create_project(&bob, create_input("X", vec![sleeper.id]))
        .await;
    assert!(matches!(result, Err(DomainError::Validation(_))));
}

#[tokio::test]
async fn listing_is_scoped_to_memberships_and_admins_see_all() {
    let (db, manager) = setup().await;
    let bob = seed_user(&db, "bob", SystemRole::Manager).await;
    let alice = seed_user(&db, "alice", SystemRole::User).await;
    let outsider = seed_user(&db, "mallory", SystemRole::User).await;
    let admin = seed_user(&db, "root", SystemRole::Admin).await;

    manager
        .create_project(&bob, create_input("X", vec![alice.id]))
        .await
        .unwrap();

    let filter = ProjectListFilter::default();
    assert_eq!(manager.list_projects(&bob, &filter).await.unwrap().len(), 1);
    assert_eq!(manager.list_projects(&alice, &filter).await.unwrap().len(), 1);
    assert!(manager
        .list_projects(&outsider, &filter)
        .await
        .unwrap()
        .is_empty());
    assert_eq!(manager.list_projects(&admin, &filter).await.unwrap().len(), 1);
}

#[tokio::test]
async fn get_project_requires_membership() {
    let (db, manager) = setup().await;
    let bob = seed_user(&db, "bob", SystemRole::Manager).await;
    let outsider = seed_user(&db, "mallory", SystemRole::User).await;
    let admin = seed_user(&db, "root", SystemRole::Admin).await;

    let view = manager
        .create_project(&bob, create_input("X", vec![]))
        .await
        .unwrap();

    let result = manager.get_project(&outsider, view.id).await;
    assert!(matches!(result, Err(DomainError::Forbidden(_))));
    assert!(manager.get_project(&admin, view.id).await.is_ok());
}

#[tokio::test]
async fn owner_role_is_never_reassigned() {
    let (db, manager) = setup().await;
    let bob = seed_user(&db, "bob", SystemRole::Manager).await;
    let alice = seed_user(&db, "alice", SystemRole::User).await;

    let view = manager
        .create_project(&bob, create_input("X", vec![alice.id]))
        .await
        .unwrap();

    // Demoting the owner is rejected.
    let demote = manager
        .update_member_role(&bob, view.id, bob.id, ProjectRole::Member)
        .await;
    assert!(matches!(demote, Err(DomainError::Validation(_))));

    // Granting owner to anyone else is rejected.
    let promote = manager
        .update_member_role(&bob, view.id, alice.id, ProjectRole::Owner)
        .await;
    assert!(matches!(promote, Err(DomainError::Validation(_))));

    // Ordinary promotions work.
    let promoted = manager
        .update_member_role(&bob, view.id, alice.id, ProjectRole::Manager)
        .await
        .unwrap();
    assert_eq!(promoted.role_of(alice.id), Some(ProjectRole::Manager));

    // The project still has exactly one owner.
    let owners = promoted
        .memberships
        .iter()
        .filter(|m| m.role == ProjectRole::Owner)
        .count();
    assert_eq!(owners, 1);
}

#[tokio::test]
async fn member_role_changes_require_owner_or_admin() {
    let (db, manager) = setup().await;
    let bob = seed_user(&db, "bob", SystemRole::Manager).await;
    let alice = seed_user(&db, "alice", SystemRole::User).await;
    let carol = seed_user(&db, "carol", SystemRole::User).await;

    let view = manager
        .create_project(&bob, create_input("X", vec![alice.id, carol.id]))
        .await
        .unwrap();

    // Even a manager-role member may not change roles.
    manager
        .update_member_role(&bob, view.id, alice.id, ProjectRole::Manager)
        .await
        .unwrap();
    let result = manager
        .update_member_role(&alice, view.id, carol.id, ProjectRole::Manager)
        .await;
    assert!(matches!(result, Err(DomainError::Forbidden(_))));
}

#[tokio::test]
async fn add_member_rules() {
    let (db, manager) = setup().await;
    let bob = seed_user(&db, "bob", SystemRole::Manager).await;
    let alice = seed_user(&db, "alice", SystemRole::User).await;
    let carol = seed_user(&db, "carol", SystemRole::User).await;

    let view = manager
        .create_project(&bob, create_input("X", vec![alice.id]))
        .await
        .unwrap();

    // A plain member cannot add anyone.
    let result = manager
        .add_member(
            &alice,
            view.id,
            MemberAddInput {
                user_id: carol.id,
                role: ProjectRole::Member,
            },
        )
        .await;
    assert!(matches!(result, Err(DomainError::Forbidden(_))));

    // Ownership is not grantable.
    let result = manager
        .add_member(
            &bob,
            view.id,
            MemberAddInput {
                user_id: carol.id,
                role: ProjectRole::Owner,
            },
        )
        .await;
    assert!(matches!(result, Err(DomainError::Validation(_))));

    // Adding an existing member is rejected.
    let result = manager
        .add_member(
            &bob,
            view.id,
            MemberAddInput {
                user_id: alice.id,
                role: ProjectRole::Member,
            },
        )
        .await;
    assert!(matches!(result, Err(DomainError::Validation(_))));

    // A manager-role member can add members.
    manager
        .update_member_role(&bob, view.id, alice.id, ProjectRole::Manager)
        .await
        .unwrap();
    let updated = manager
        .add_member(
            &alice,
            view.id,
            MemberAddInput {
                user_id: carol.id,
                role: ProjectRole::Member,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.role_of(carol.id), Some(ProjectRole::Member));
}

#[tokio::test]
async fn removing_a_member_clears_their_assignments() {
    let (db, manager) = setup().await;
    let bob = seed_user(&db, "bob", SystemRole::Manager).await;
    let alice = seed_user(&db, "alice", SystemRole::User).await;

    let view = manager
        .create_project(&bob, create_input("X", vec![alice.id]))
        .await
        .unwrap();

    let assigned = db
        .tasks
        .insert(&project_task(&bob, view.id, Some(alice.id)))
        .await
        .unwrap();

    let updated = manager.remove_member(&bob, view.id, alice.id).await.unwrap();
    assert!(updated.role_of(alice.id).is_none());

    let task = db.tasks.find(assigned).await.unwrap().unwrap();
    assert_eq!(task.assignee_id, None);
}

#[tokio::test]
async fn the_owner_cannot_be_removed() {
    let (db, manager) = setup().await;
    let bob = seed_user(&db, "bob", SystemRole::Manager).await;
    let admin = seed_user(&db, "root", SystemRole::Admin).await;

    let view = manager
        .create_project(&bob, create_input("X", vec![]))
        .await
        .unwrap();

    let result = manager.remove_member(&admin, view.id, bob.id).await;
    assert!(matches!(result, Err(DomainError::Validation(_))));
}

#[tokio::test]
async fn archive_requires_the_owner_project_role() {
    let (db, manager) = setup().await;
    let bob = seed_user(&db, "bob", SystemRole::Manager).await;
    let alice = seed_user(&db, "alice", SystemRole::User).await;
    let admin = seed_user(&db, "root", SystemRole::Admin).await;

    let view = manager
        .create_project(&bob, create_input("X", vec![alice.id]))
        .await
        .unwrap();

    // A manager-role member is explicitly not enough here.
    manager
        .update_member_role(&bob, view.id, alice.id, ProjectRole::Manager)
        .await
        .unwrap();
    let result = manager.set_archived(&alice, view.id, true).await;
    assert!(matches!(result, Err(DomainError::Forbidden(_))));

    let archived = manager.set_archived(&bob, view.id, true).await.unwrap();
    assert!(archived.archived);

    let restored = manager.set_archived(&admin, view.id, false).await.unwrap();
    assert!(!restored.archived);
}

#[tokio::test]
async fn update_is_owner_or_admin_only() {
    let (db, manager) = setup().await;
    let bob = seed_user(&db, "bob", SystemRole::Manager).await;
    let alice = seed_user(&db, "alice", SystemRole::User).await;

    let view = manager
        .create_project(&bob, create_input("X", vec![alice.id]))
        .await
        .unwrap();

    let patch = ProjectUpdateInput {
        name: Some("Y".to_string()),
        ..Default::default()
    };
    let result = manager.update_project(&alice, view.id, patch.clone()).await;
    assert!(matches!(result, Err(DomainError::Forbidden(_))));

    let updated = manager.update_project(&bob, view.id, patch).await.unwrap();
    assert_eq!(updated.name, "Y");
    // Untouched fields survive a partial update.
    assert_eq!(updated.description.as_deref(), Some("workspace"));
}

#[tokio::test]
async fn delete_cascades_to_memberships_and_tasks() {
    let (db, manager) = setup().await;
    let bob = seed_user(&db, "bob", SystemRole::Manager).await;
    let alice = seed_user(&db, "alice", SystemRole::User).await;

    let view = manager
        .create_project(&bob, create_input("X", vec![alice.id]))
        .await
        .unwrap();
    let task_id = db
        .tasks
        .insert(&project_task(&bob, view.id, Some(alice.id)))
        .await
        .unwrap();

    // A manager-role member is not the owner.
    manager
        .update_member_role(&bob, view.id, alice.id, ProjectRole::Manager)
        .await
        .unwrap();
    let result = manager.delete_project(&alice, view.id).await;
    assert!(matches!(result, Err(DomainError::Forbidden(_))));

    manager.delete_project(&bob, view.id).await.unwrap();

    assert!(db.projects.find(view.id).await.unwrap().is_none());
    assert!(db.tasks.find(task_id).await.unwrap().is_none());
    assert!(db
        .projects
        .membership_of(view.id, alice.id)
        .await
        .unwrap()
        .is_none());
}
