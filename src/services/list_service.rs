use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::api::dto::{CreateListRequest, ReorderListsRequest, UpdateListRequest};
use crate::auth::middleware::AuthUser;
use crate::domain::ordering::{first_duplicate, next_order};
use crate::domain::{KanbanError, List};
use crate::services::access::Access;
use crate::services::upload_service::{AttachmentScope, UploadService};
use crate::services::view_cache::BoardViewCache;

pub struct ListService;

impl ListService {
    pub async fn create_list(
        pool: &SqlitePool,
        views: &BoardViewCache,
        user: &AuthUser,
        board_id: &str,
        req: CreateListRequest,
    ) -> Result<List, KanbanError> {
        let title = required_title(&req.title)?;
        Access::require_board(pool, board_id, user).await?;

        let max: Option<i64> =
            sqlx::query_scalar("SELECT MAX(sort_order) FROM lists WHERE board_id = ?")
                .bind(board_id)
                .fetch_one(pool)
                .await?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO lists (id, title, sort_order, board_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(title)
        .bind(next_order(max))
        .bind(board_id)
        .bind(&now)
        .bind(&now)
        .execute(pool)
        .await?;

        views.invalidate(board_id).await;
        Self::get_list(pool, &id).await
    }

    pub async fn get_list(pool: &SqlitePool, id: &str) -> Result<List, KanbanError> {
        sqlx::query_as("SELECT * FROM lists WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| KanbanError::NotFound(format!("List not found: {}", id)))
    }

    pub async fn update_list(
        pool: &SqlitePool,
        views: &BoardViewCache,
        user: &AuthUser,
        id: &str,
        req: UpdateListRequest,
    ) -> Result<List, KanbanError> {
        let title = required_title(&req.title)?;
        let list = Access::require_list(pool, id, user).await?;

        sqlx::query("UPDATE lists SET title = ?, updated_at = ? WHERE id = ?")
            .bind(title)
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(pool)
            .await?;

        views.invalidate(&list.board_id).await;
        Self::get_list(pool, id).await
    }

    /// Deletes the list and, through the foreign key, its cards.
    pub async fn delete_list(
        pool: &SqlitePool,
        views: &BoardViewCache,
        user: &AuthUser,
        id: &str,
    ) -> Result<List, KanbanError> {
        let list = Access::require_list(pool, id, user).await?;

        let mut tx = pool.begin().await?;
        let attachments =
            UploadService::attached_to(&mut *tx, AttachmentScope::List(id)).await?;
        let result = sqlx::query("DELETE FROM lists WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(KanbanError::NotFound(format!("List not found: {}", id)));
        }
        tx.commit().await?;

        UploadService::remove_files(&attachments).await;
        views.invalidate(&list.board_id).await;
        Ok(list)
    }

    pub async fn reorder_lists(
        pool: &SqlitePool,
        views: &BoardViewCache,
        user: &AuthUser,
        board_id: &str,
        req: ReorderListsRequest,
    ) -> Result<(), KanbanError> {
        Access::require_board(pool, board_id, user).await?;

        if let Some(id) = first_duplicate(req.lists.iter().map(|l| l.id.as_str())) {
            return Err(KanbanError::BadRequest(format!(
                "List {} appears more than once",
                id
            )));
        }
        if let Some(order) = first_duplicate(req.lists.iter().map(|l| l.order)) {
            return Err(KanbanError::BadRequest(format!(
                "Order {} is assigned to more than one list",
                order
            )));
        }

        let now = Utc::now().to_rfc3339();
        let mut tx = pool.begin().await?;

        for placement in &req.lists {
            let result = sqlx::query(
                "UPDATE lists SET sort_order = ?, updated_at = ? WHERE id = ? AND board_id = ?",
            )
            .bind(placement.order)
            .bind(&now)
            .bind(&placement.id)
            .bind(board_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                // dropping tx rolls back the writes made so far
                return Err(KanbanError::NotFound(format!(
                    "List not found on board {}: {}",
                    board_id, placement.id
                )));
            }
        }

        tx.commit().await?;

        tracing::debug!(board_id, count = req.lists.len(), "Lists reordered");
        views.invalidate(board_id).await;
        Ok(())
    }
}

pub(crate) fn required_title(title: &str) -> Result<&str, KanbanError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(KanbanError::BadRequest("Title is required".into()));
    }
    Ok(title)
}
