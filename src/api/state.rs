use std::path::Path;
use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::broadcast;

use crate::config::Config;
use crate::domain::KanbanError;
use crate::services::mail_service::Mailer;
use crate::services::view_cache::BoardViewCache;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: Option<SqlitePool>,
    pub views: BoardViewCache,
    pub mailer: Mailer,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        db: Option<SqlitePool>,
        events: broadcast::Sender<String>,
        http_client: reqwest::Client,
        config: Arc<Config>,
    ) -> Self {
        Self {
            db,
            views: BoardViewCache::new(events),
            mailer: Mailer::new(http_client, &config),
            config,
        }
    }

    pub fn require_db(&self) -> Result<&SqlitePool, KanbanError> {
        self.db
            .as_ref()
            .ok_or_else(|| KanbanError::Internal("Database not available".into()))
    }

    pub fn upload_dir(&self) -> &Path {
        Path::new(&self.config.upload_dir)
    }
}
