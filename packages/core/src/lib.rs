//! # Taskhive Core
//!
//! Domain types shared across the Taskhive workspace: users, teams,
//! projects with role-based memberships, tasks, the error taxonomy, and
//! the deployment's civil-time handling.

pub mod error;
pub mod patch;
pub mod projects;
pub mod tasks;
pub mod teams;
pub mod time;
pub mod users;

pub use error::{DomainError, DomainResult};
pub use patch::patch_field;
pub use projects::{
    MemberAddInput, MembershipView, Project, ProjectCreateInput, ProjectListFilter, ProjectMember,
    ProjectRole, ProjectSlim, ProjectUpdateInput, ProjectView,
};
pub use tasks::{
    Task, TaskCreateInput, TaskListFilter, TaskPriority, TaskStatus, TaskUpdateInput, TaskView,
    TasksByStatus,
};
pub use teams::{Team, TeamCreateInput, TeamSummary, TeamUpdateInput};
pub use time::{now_local, parse_client_datetime, LocalTimestamp};
pub use users::{SystemRole, User, UserSummary};
