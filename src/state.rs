//! Shared application state

use sqlx::SqlitePool;

use crate::config::Config;

/// State threaded through every route handler
#[derive(Clone)]
pub struct AppState {
    pool: SqlitePool,
    config: Config,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        Self { pool, config }
    }

    pub fn db(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The static bearer token pushes and pulls must present
    pub fn sync_token(&self) -> &str {
        &self.config.auth.token
    }
}
