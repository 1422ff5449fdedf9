//! Server-side cache of board views.
//!
//! Every successful mutation invalidates the owning board's entry and
//! broadcasts a [`BoardEvent`] so open board pages know to refetch.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tokio::sync::{broadcast, RwLock};

use crate::domain::{BoardView, KanbanError};
use crate::services::BoardService;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum BoardEvent {
    BoardInvalidated { board_id: String },
    BoardDeleted { board_id: String },
}

impl BoardEvent {
    pub fn board_id(&self) -> &str {
        match self {
            BoardEvent::BoardInvalidated { board_id } | BoardEvent::BoardDeleted { board_id } => {
                board_id
            }
        }
    }
}

#[derive(Debug, Default)]
struct Entry {
    /// Bumped on every invalidation; a load only fills the entry if the
    /// generation it started from is still current.
    generation: u64,
    view: Option<Arc<BoardView>>,
}

#[derive(Debug, Default)]
struct Entries {
    boards: HashMap<String, Entry>,
    /// Bumped on every eviction; guards loads that find no entry on return.
    evictions: u64,
}

#[derive(Debug, Clone)]
pub struct BoardViewCache {
    entries: Arc<RwLock<Entries>>,
    events: broadcast::Sender<String>,
}

impl BoardViewCache {
    pub fn new(events: broadcast::Sender<String>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(Entries::default())),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.events.subscribe()
    }

    pub async fn cached(&self, board_id: &str) -> Option<Arc<BoardView>> {
        self.entries
            .read()
            .await
            .boards
            .get(board_id)
            .and_then(|entry| entry.view.clone())
    }

    /// Returns the cached view or loads it from the database.
    pub async fn load(
        &self,
        pool: &SqlitePool,
        board_id: &str,
    ) -> Result<Arc<BoardView>, KanbanError> {
        let (generation, evictions) = {
            let entries = self.entries.read().await;
            let generation = match entries.boards.get(board_id) {
                Some(Entry {
                    view: Some(view), ..
                }) => {
                    tracing::debug!(board_id, "Board view cache hit");
                    return Ok(Arc::clone(view));
                }
                Some(entry) => Some(entry.generation),
                None => None,
            };
            (generation, entries.evictions)
        };

        tracing::debug!(board_id, "Board view cache miss");
        let view = Arc::new(BoardService::load_view(pool, board_id).await?);

        let mut entries = self.entries.write().await;
        let current = match (entries.boards.get(board_id), generation) {
            (Some(entry), Some(generation)) => entry.generation == generation,
            (None, None) => entries.evictions == evictions,
            _ => false,
        };
        if current {
            let entry = entries.boards.entry(board_id.to_string()).or_default();
            entry.view = Some(Arc::clone(&view));
        } else {
            tracing::debug!(board_id, "Board view changed during load, not caching");
        }

        Ok(view)
    }

    pub async fn invalidate(&self, board_id: &str) {
        self.bump(board_id).await;
        self.publish(BoardEvent::BoardInvalidated {
            board_id: board_id.to_string(),
        });
    }

    /// Drops the board's entry for good; used when the board is deleted.
    pub async fn evict(&self, board_id: &str) {
        {
            let mut entries = self.entries.write().await;
            entries.boards.remove(board_id);
            entries.evictions += 1;
        }
        self.publish(BoardEvent::BoardDeleted {
            board_id: board_id.to_string(),
        });
    }

    async fn bump(&self, board_id: &str) {
        let mut entries = self.entries.write().await;
        let entry = entries.boards.entry(board_id.to_string()).or_default();
        entry.generation += 1;
        entry.view = None;
    }

    fn publish(&self, event: BoardEvent) {
        if let Ok(payload) = serde_json::to_string(&event) {
            // no subscribers is fine
            let _ = self.events.send(payload);
        }
    }
}
