// ABOUTME: User storage layer using SQLite
// ABOUTME: Handles CRUD operations for accounts and role/profile updates

use sqlx::{Row, SqlitePool};
use tracing::debug;

use taskhive_core::time::now_local;
use taskhive_core::{SystemRole, User};

use crate::error::{StorageError, StorageResult};

pub struct UserStorage {
    pool: SqlitePool,
}

impl UserStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, user_id: i64) -> StorageResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| row_to_user(&r)).transpose()
    }

    pub async fn find_by_username(&self, username: &str) -> StorageResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| row_to_user(&r)).transpose()
    }

    pub async fn find_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| row_to_user(&r)).transpose()
    }

    pub async fn insert(
        &self,
        username: &str,
        email: &str,
        hashed_password: &str,
        role: SystemRole,
    ) -> StorageResult<User> {
        debug!("Creating user: {}", username);

        let now = now_local();
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, email, hashed_password, role, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(hashed_password)
        .bind(role)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.find_by_id(result.last_insert_rowid())
            .await?
            .ok_or(StorageError::Sqlx(sqlx::Error::RowNotFound))
    }

    pub async fn list_all(&self) -> StorageResult<Vec<User>> {
        let rows = sqlx::query("SELECT * FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_user).collect()
    }

    /// Case-insensitive username/display-name search over active accounts.
    pub async fn search_active(&self, query: &str, limit: i64) -> StorageResult<Vec<User>> {
        let pattern = format!("%{}%", query);
        let rows = sqlx::query(
            r#"
            SELECT * FROM users
            WHERE is_active = 1 AND (username LIKE ? OR display_name LIKE ?)
            ORDER BY username
            LIMIT ?
            "#,
        )
        .bind(&pattern)
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_user).collect()
    }

    pub async fn update_profile(
        &self,
        user_id: i64,
        display_name: Option<String>,
        email: &str,
    ) -> StorageResult<User> {
        debug!("Updating profile for user: {}", user_id);

        sqlx::query("UPDATE users SET display_name = ?, email = ?, updated_at = ? WHERE id = ?")
            .bind(display_name)
            .bind(email)
            .bind(now_local())
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        self.find_by_id(user_id)
            .await?
            .ok_or(StorageError::Sqlx(sqlx::Error::RowNotFound))
    }

    pub async fn update_password(&self, user_id: i64, hashed_password: &str) -> StorageResult<()> {
        sqlx::query("UPDATE users SET hashed_password = ?, updated_at = ? WHERE id = ?")
            .bind(hashed_password)
            .bind(now_local())
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn update_role(&self, user_id: i64, role: SystemRole) -> StorageResult<User> {
        debug!("Updating role for user: {}", user_id);

        sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE id = ?")
            .bind(role)
            .bind(now_local())
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        self.find_by_id(user_id)
            .await?
            .ok_or(StorageError::Sqlx(sqlx::Error::RowNotFound))
    }

    pub async fn touch_last_login(&self, user_id: i64) -> StorageResult<()> {
        sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
            .bind(now_local())
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

pub(crate) fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> StorageResult<User> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        hashed_password: row.try_get("hashed_password")?,
        display_name: row.try_get("display_name")?,
        role: row.try_get("role")?,
        is_active: row.try_get("is_active")?,
        team_id: row.try_get("team_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        last_login: row.try_get("last_login")?,
    })
}
