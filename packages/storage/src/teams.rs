// ABOUTME: Team storage layer using SQLite
// ABOUTME: Teams are reference data; membership lives on the user row

use sqlx::{Row, SqlitePool};
use tracing::debug;

use taskhive_core::time::now_local;
use taskhive_core::Team;

use crate::error::{StorageError, StorageResult};

pub struct TeamStorage {
    pool: SqlitePool,
}

impl TeamStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list_ordered(&self) -> StorageResult<Vec<Team>> {
        let rows = sqlx::query("SELECT * FROM teams ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_team).collect()
    }

    pub async fn find_by_id(&self, team_id: i64) -> StorageResult<Option<Team>> {
        let row = sqlx::query("SELECT * FROM teams WHERE id = ?")
            .bind(team_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| row_to_team(&r)).transpose()
    }

    /// Case-insensitive name lookup, optionally excluding one team (for
    /// rename collision checks).
    pub async fn find_by_name_ci(
        &self,
        name: &str,
        exclude_id: Option<i64>,
    ) -> StorageResult<Option<Team>> {
        let row = sqlx::query(
            "SELECT * FROM teams WHERE lower(name) = lower(?) AND (? IS NULL OR id != ?)",
        )
        .bind(name)
        .bind(exclude_id)
        .bind(exclude_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| row_to_team(&r)).transpose()
    }

    pub async fn insert(
        &self,
        name: &str,
        description: Option<&str>,
        created_by: &str,
    ) -> StorageResult<Team> {
        debug!("Creating team: {}", name);

        let now = now_local();
        let result = sqlx::query(
            "INSERT INTO teams (name, description, created_by, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(name)
        .bind(description)
        .bind(created_by)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.find_by_id(result.last_insert_rowid())
            .await?
            .ok_or(StorageError::Sqlx(sqlx::Error::RowNotFound))
    }

    pub async fn update(
        &self,
        team_id: i64,
        name: &str,
        description: Option<&str>,
    ) -> StorageResult<Team> {
        sqlx::query("UPDATE teams SET name = ?, description = ?, updated_at = ? WHERE id = ?")
            .bind(name)
            .bind(description)
            .bind(now_local())
            .bind(team_id)
            .execute(&self.pool)
            .await?;

        self.find_by_id(team_id)
            .await?
            .ok_or(StorageError::Sqlx(sqlx::Error::RowNotFound))
    }

    pub async fn delete(&self, team_id: i64) -> StorageResult<()> {
        sqlx::query("DELETE FROM teams WHERE id = ?")
            .bind(team_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Points every listed user at the team. Caller has already verified
    /// the users exist.
    pub async fn assign_members(&self, team_id: i64, user_ids: &[i64]) -> StorageResult<usize> {
        if user_ids.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; user_ids.len()].join(", ");
        let sql = format!(
            "UPDATE users SET team_id = ?, updated_at = ? WHERE id IN ({})",
            placeholders
        );

        let mut query = sqlx::query(&sql).bind(team_id).bind(now_local());
        for user_id in user_ids {
            query = query.bind(user_id);
        }
        let result = query.execute(&self.pool).await?;

        Ok(result.rows_affected() as usize)
    }

    /// How many of the given user ids actually exist.
    pub async fn count_existing_users(&self, user_ids: &[i64]) -> StorageResult<i64> {
        if user_ids.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; user_ids.len()].join(", ");
        let sql = format!("SELECT COUNT(*) FROM users WHERE id IN ({})", placeholders);

        let mut query = sqlx::query_scalar(&sql);
        for user_id in user_ids {
            query = query.bind(user_id);
        }
        Ok(query.fetch_one(&self.pool).await?)
    }
}

fn row_to_team(row: &sqlx::sqlite::SqliteRow) -> StorageResult<Team> {
    Ok(Team {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
