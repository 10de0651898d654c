// ABOUTME: User types and the account-wide role tier
// ABOUTME: System roles are independent of per-project membership roles

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Account-wide privilege tier. Admins bypass project-role checks
/// everywhere; managers may create projects; plain users may not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SystemRole {
    #[default]
    User,
    Manager,
    Admin,
}

impl SystemRole {
    /// Parses a client-supplied role name. Unknown values yield `None` so
    /// registration can fall back to the default instead of failing.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "user" => Some(SystemRole::User),
            "manager" => Some(SystemRole::Manager),
            "admin" => Some(SystemRole::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SystemRole::User => "user",
            SystemRole::Manager => "manager",
            SystemRole::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub display_name: Option<String>,
    pub role: SystemRole,
    pub is_active: bool,
    pub team_id: Option<i64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub last_login: Option<NaiveDateTime>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == SystemRole::Admin
    }
}

/// Compact user representation embedded in project and task views.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: SystemRole,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        UserSummary {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}
