// ABOUTME: Shared application state for API handlers
// ABOUTME: Bundles storage, managers, tokens and the broadcast channel

use std::sync::Arc;

use tokio::sync::broadcast;

use taskhive_auth::TokenService;
use taskhive_projects::ProjectManager;
use taskhive_storage::DbState;
use taskhive_tasks::TaskManager;

/// Capacity of the task feed. Slow subscribers past this many pending
/// messages start losing the oldest ones; the feed is best effort.
const FEED_CAPACITY: usize = 64;

#[derive(Clone)]
pub struct AppState {
    pub db: DbState,
    pub tokens: Arc<TokenService>,
    pub projects: ProjectManager,
    pub tasks: TaskManager,
    pub feed: broadcast::Sender<String>,
}

impl AppState {
    pub fn new(db: DbState, tokens: TokenService) -> Self {
        let (feed, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            projects: ProjectManager::new(db.clone()),
            tasks: TaskManager::new(db.clone()),
            db,
            tokens: Arc::new(tokens),
            feed,
        }
    }
}
