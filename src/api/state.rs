use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::Config;
use crate::domain::BoardError;
use crate::services::{ChangeFeed, SqliteBoardStore};

#[derive(Clone)]
pub struct AppState {
    pub db: Option<SqlitePool>,
    pub feed: Arc<ChangeFeed>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: Option<SqlitePool>, feed: Arc<ChangeFeed>, config: Arc<Config>) -> Self {
        Self { db, feed, config }
    }

    pub fn require_db(&self) -> Result<&SqlitePool, BoardError> {
        self.db
            .as_ref()
            .ok_or_else(|| BoardError::Internal("Database not available".into()))
    }

    /// Store view over the pool that announces writes on the shared feed.
    pub fn require_store(&self) -> Result<SqliteBoardStore, BoardError> {
        let pool = self.require_db()?.clone();
        Ok(SqliteBoardStore::new(pool, Arc::clone(&self.feed)))
    }
}
