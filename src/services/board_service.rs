use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::api::dto::{CreateBoardRequest, UpdateBoardRequest};
use crate::auth::middleware::AuthUser;
use crate::domain::{Board, BoardView, Card, KanbanError, List, ListWithCards};
use crate::services::access::Access;
use crate::services::list_service::required_title;
use crate::services::upload_service::{AttachmentScope, UploadService};
use crate::services::view_cache::BoardViewCache;

/// Lists every new board starts with, left to right.
pub const DEFAULT_LISTS: [&str; 3] = ["To Do", "In Progress", "Done"];

pub struct BoardService;

impl BoardService {
    pub async fn create_board(
        pool: &SqlitePool,
        user: &AuthUser,
        req: CreateBoardRequest,
    ) -> Result<Board, KanbanError> {
        let title = required_title(&req.title)?;

        let organization_id: String =
            sqlx::query_scalar("SELECT id FROM organizations WHERE slug = ?")
                .bind(&req.organization_slug)
                .fetch_optional(pool)
                .await?
                .ok_or_else(|| {
                    KanbanError::NotFound(format!(
                        "Organization not found: {}",
                        req.organization_slug
                    ))
                })?;
        Access::require_member(pool, &organization_id, user).await?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let description = req
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let mut tx = pool.begin().await?;

        sqlx::query(
            "INSERT INTO boards (id, title, description, organization_id, created_by_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(title)
        .bind(&description)
        .bind(&organization_id)
        .bind(&user.user_id)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        for (order, list_title) in DEFAULT_LISTS.iter().enumerate() {
            sqlx::query(
                "INSERT INTO lists (id, title, sort_order, board_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(*list_title)
            .bind(order as i64)
            .bind(&id)
            .bind(&now)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(board_id = id.as_str(), organization_id = organization_id.as_str(), "Board created");
        Self::get_board(pool, &id).await
    }

    pub async fn get_board(pool: &SqlitePool, id: &str) -> Result<Board, KanbanError> {
        sqlx::query_as("SELECT * FROM boards WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| KanbanError::NotFound(format!("Board not found: {}", id)))
    }

    /// Reads a board with its lists and cards, both ascending by order.
    pub async fn load_view(pool: &SqlitePool, board_id: &str) -> Result<BoardView, KanbanError> {
        let board = Self::get_board(pool, board_id).await?;

        let organization_slug: String =
            sqlx::query_scalar("SELECT slug FROM organizations WHERE id = ?")
                .bind(&board.organization_id)
                .fetch_one(pool)
                .await?;

        let lists: Vec<List> = sqlx::query_as(
            "SELECT * FROM lists WHERE board_id = ? ORDER BY sort_order ASC, created_at ASC",
        )
        .bind(board_id)
        .fetch_all(pool)
        .await?;

        let cards: Vec<Card> = sqlx::query_as(
            r#"
            SELECT c.* FROM cards c
            JOIN lists l ON l.id = c.list_id
            WHERE l.board_id = ?
            ORDER BY c.sort_order ASC, c.created_at ASC
            "#,
        )
        .bind(board_id)
        .fetch_all(pool)
        .await?;

        let mut by_list: HashMap<String, Vec<Card>> = HashMap::new();
        for card in cards {
            by_list.entry(card.list_id.clone()).or_default().push(card);
        }

        let lists = lists
            .into_iter()
            .map(|list| ListWithCards {
                cards: by_list.remove(&list.id).unwrap_or_default(),
                list,
            })
            .collect();

        Ok(BoardView {
            board,
            organization_slug,
            lists,
        })
    }

    pub async fn get_view(
        pool: &SqlitePool,
        views: &BoardViewCache,
        user: &AuthUser,
        board_id: &str,
    ) -> Result<Arc<BoardView>, KanbanError> {
        Access::require_board(pool, board_id, user).await?;
        views.load(pool, board_id).await
    }

    pub async fn update_board(
        pool: &SqlitePool,
        views: &BoardViewCache,
        user: &AuthUser,
        id: &str,
        req: UpdateBoardRequest,
    ) -> Result<Board, KanbanError> {
        let existing = Access::require_board(pool, id, user).await?;

        let title = match req.title.as_deref() {
            Some(t) => required_title(t)?.to_string(),
            None => existing.title,
        };
        let description = match req.description {
            Some(d) if d.trim().is_empty() => None,
            Some(d) => Some(d.trim().to_string()),
            None => existing.description,
        };

        sqlx::query("UPDATE boards SET title = ?, description = ?, updated_at = ? WHERE id = ?")
            .bind(&title)
            .bind(&description)
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(pool)
            .await?;

        views.invalidate(id).await;
        Self::get_board(pool, id).await
    }

    /// Deletes the board; lists and cards go with it.
    pub async fn delete_board(
        pool: &SqlitePool,
        views: &BoardViewCache,
        user: &AuthUser,
        id: &str,
    ) -> Result<Board, KanbanError> {
        let board = Access::require_board(pool, id, user).await?;

        let mut tx = pool.begin().await?;
        let attachments =
            UploadService::attached_to(&mut *tx, AttachmentScope::Board(id)).await?;
        let result = sqlx::query("DELETE FROM boards WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(KanbanError::NotFound(format!("Board not found: {}", id)));
        }
        tx.commit().await?;

        UploadService::remove_files(&attachments).await;
        tracing::info!(board_id = id, files = attachments.len(), "Board deleted");
        views.evict(id).await;
        Ok(board)
    }

    pub async fn set_cover_image(
        pool: &SqlitePool,
        views: &BoardViewCache,
        board_id: &str,
        url: &str,
    ) -> Result<Board, KanbanError> {
        sqlx::query("UPDATE boards SET cover_image = ?, updated_at = ? WHERE id = ?")
            .bind(url)
            .bind(Utc::now().to_rfc3339())
            .bind(board_id)
            .execute(pool)
            .await?;

        views.invalidate(board_id).await;
        Self::get_board(pool, board_id).await
    }
}
