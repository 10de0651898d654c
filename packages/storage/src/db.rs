// ABOUTME: Database connection management and storage initialization
// ABOUTME: Provides shared access to the SQLite pool and storage layers

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use tracing::{debug, info};

use crate::error::StorageResult;
use crate::projects::ProjectStorage;
use crate::tasks::TaskStorage;
use crate::teams::TeamStorage;
use crate::users::UserStorage;

/// Shared database state for managers and API handlers.
#[derive(Clone)]
pub struct DbState {
    pub pool: SqlitePool,
    pub users: Arc<UserStorage>,
    pub teams: Arc<TeamStorage>,
    pub projects: Arc<ProjectStorage>,
    pub tasks: Arc<TaskStorage>,
}

impl DbState {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            users: Arc::new(UserStorage::new(pool.clone())),
            teams: Arc::new(TeamStorage::new(pool.clone())),
            projects: Arc::new(ProjectStorage::new(pool.clone())),
            tasks: Arc::new(TaskStorage::new(pool.clone())),
            pool,
        }
    }

    /// Opens (creating if needed) the database file and runs migrations.
    pub async fn init(database_path: &Path) -> StorageResult<Self> {
        if let Some(parent) = database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        debug!("Connecting to database: {}", database_path.display());

        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        info!("Database connection established");

        Ok(Self::new(pool))
    }

    /// In-memory database for tests. Single connection, since every new
    /// SQLite in-memory connection is a fresh empty database.
    pub async fn init_in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::new()
            .in_memory(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self::new(pool))
    }
}
