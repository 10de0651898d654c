// ABOUTME: Team reference data
// ABOUTME: Teams group users; no behavioral rules hang off them

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct Team {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_by: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Public listing shape; omits audit fields.
#[derive(Debug, Clone, Serialize)]
pub struct TeamSummary {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

impl From<&Team> for TeamSummary {
    fn from(team: &Team) -> Self {
        TeamSummary {
            id: team.id,
            name: team.name.clone(),
            description: team.description.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamCreateInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamUpdateInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}
