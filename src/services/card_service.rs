use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::api::dto::{CreateCardRequest, MoveCardRequest, ReorderCardsRequest, UpdateCardRequest};
use crate::auth::middleware::AuthUser;
use crate::domain::ordering::{first_duplicate, next_order};
use crate::domain::{Card, KanbanError};
use crate::services::access::Access;
use crate::services::list_service::required_title;
use crate::services::upload_service::{AttachmentScope, UploadService};
use crate::services::view_cache::BoardViewCache;

pub struct CardService;

impl CardService {
    pub async fn create_card(
        pool: &SqlitePool,
        views: &BoardViewCache,
        user: &AuthUser,
        list_id: &str,
        req: CreateCardRequest,
    ) -> Result<Card, KanbanError> {
        let title = required_title(&req.title)?;
        let list = Access::require_list(pool, list_id, user).await?;

        let max: Option<i64> =
            sqlx::query_scalar("SELECT MAX(sort_order) FROM cards WHERE list_id = ?")
                .bind(list_id)
                .fetch_one(pool)
                .await?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO cards (id, title, sort_order, list_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(title)
        .bind(next_order(max))
        .bind(list_id)
        .bind(&now)
        .bind(&now)
        .execute(pool)
        .await?;

        views.invalidate(&list.board_id).await;
        Self::get_card(pool, &id).await
    }

    pub async fn get_card(pool: &SqlitePool, id: &str) -> Result<Card, KanbanError> {
        sqlx::query_as("SELECT * FROM cards WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| KanbanError::NotFound(format!("Card not found: {}", id)))
    }

    pub async fn update_card(
        pool: &SqlitePool,
        views: &BoardViewCache,
        user: &AuthUser,
        id: &str,
        req: UpdateCardRequest,
    ) -> Result<Card, KanbanError> {
        let (existing, board_id) = Access::require_card(pool, id, user).await?;

        let title = match req.title.as_deref() {
            Some(t) => required_title(t)?.to_string(),
            None => existing.title,
        };
        let description = match req.description {
            Some(d) => d,
            None => existing.description,
        };
        let due_date = match req.due_date {
            Some(Some(raw)) => Some(normalize_due_date(&raw)?),
            Some(None) => None,
            None => existing.due_date,
        };
        let completed = req.completed.unwrap_or(existing.completed);

        sqlx::query(
            "UPDATE cards SET title = ?, description = ?, due_date = ?, completed = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&title)
        .bind(&description)
        .bind(&due_date)
        .bind(completed)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(pool)
        .await?;

        views.invalidate(&board_id).await;
        Self::get_card(pool, id).await
    }

    pub async fn delete_card(
        pool: &SqlitePool,
        views: &BoardViewCache,
        user: &AuthUser,
        id: &str,
    ) -> Result<Card, KanbanError> {
        let (card, board_id) = Access::require_card(pool, id, user).await?;

        let mut tx = pool.begin().await?;
        let attachments =
            UploadService::attached_to(&mut *tx, AttachmentScope::Card(id)).await?;
        let result = sqlx::query("DELETE FROM cards WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(KanbanError::NotFound(format!("Card not found: {}", id)));
        }
        tx.commit().await?;

        UploadService::remove_files(&attachments).await;
        views.invalidate(&board_id).await;
        Ok(card)
    }

    /// Sets list and order in one write. Sibling orders are left alone, so
    /// `new_order` may tie with a sibling; tied cards display by `created_at`.
    pub async fn move_card(
        pool: &SqlitePool,
        views: &BoardViewCache,
        user: &AuthUser,
        id: &str,
        req: MoveCardRequest,
    ) -> Result<Card, KanbanError> {
        let (existing, from_board) = Access::require_card(pool, id, user).await?;
        let target = Access::require_list(pool, &req.new_list_id, user).await?;

        sqlx::query("UPDATE cards SET list_id = ?, sort_order = ?, updated_at = ? WHERE id = ?")
            .bind(&target.id)
            .bind(req.new_order)
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(pool)
            .await?;

        tracing::debug!(
            card_id = id,
            from_list = existing.list_id.as_str(),
            to_list = target.id.as_str(),
            order = req.new_order,
            "Card moved"
        );

        views.invalidate(&target.board_id).await;
        if from_board != target.board_id {
            views.invalidate(&from_board).await;
        }
        Self::get_card(pool, id).await
    }

    /// Writes every `{id, listId, order}` triple in one transaction.
    pub async fn reorder_cards(
        pool: &SqlitePool,
        views: &BoardViewCache,
        user: &AuthUser,
        req: ReorderCardsRequest,
    ) -> Result<(), KanbanError> {
        if req.cards.is_empty() {
            return Ok(());
        }

        if let Some(id) = first_duplicate(req.cards.iter().map(|c| c.id.as_str())) {
            return Err(KanbanError::BadRequest(format!(
                "Card {} appears more than once",
                id
            )));
        }
        if let Some((list_id, order)) =
            first_duplicate(req.cards.iter().map(|c| (c.list_id.as_str(), c.order)))
        {
            return Err(KanbanError::BadRequest(format!(
                "Order {} is assigned to more than one card in list {}",
                order, list_id
            )));
        }

        let mut boards = BTreeSet::new();
        for list_id in req.cards.iter().map(|c| c.list_id.as_str()).collect::<BTreeSet<_>>() {
            boards.insert(Access::require_list(pool, list_id, user).await?.board_id);
        }

        let now = Utc::now().to_rfc3339();
        let mut tx = pool.begin().await?;

        for placement in &req.cards {
            let from_board: Option<String> = sqlx::query_scalar(
                "SELECT l.board_id FROM cards c JOIN lists l ON l.id = c.list_id WHERE c.id = ?",
            )
            .bind(&placement.id)
            .fetch_optional(&mut *tx)
            .await?;

            let Some(from_board) = from_board else {
                return Err(KanbanError::NotFound(format!(
                    "Card not found: {}",
                    placement.id
                )));
            };

            if !boards.contains(&from_board) {
                let organization_id: String =
                    sqlx::query_scalar("SELECT organization_id FROM boards WHERE id = ?")
                        .bind(&from_board)
                        .fetch_one(&mut *tx)
                        .await?;
                let is_member: Option<i64> = sqlx::query_scalar(
                    "SELECT 1 FROM memberships WHERE organization_id = ? AND user_id = ?",
                )
                .bind(&organization_id)
                .bind(&user.user_id)
                .fetch_optional(&mut *tx)
                .await?;
                if is_member.is_none() {
                    return Err(KanbanError::Forbidden(
                        "You are not a member of this organization".into(),
                    ));
                }
                boards.insert(from_board);
            }

            sqlx::query(
                "UPDATE cards SET list_id = ?, sort_order = ?, updated_at = ? WHERE id = ?",
            )
            .bind(&placement.list_id)
            .bind(placement.order)
            .bind(&now)
            .bind(&placement.id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!(count = req.cards.len(), boards = boards.len(), "Cards reordered");
        for board_id in &boards {
            views.invalidate(board_id).await;
        }
        Ok(())
    }
}

/// Accepts an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn normalize_due_date(raw: &str) -> Result<String, KanbanError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc).to_rfc3339());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().to_rfc3339())
        .ok_or_else(|| KanbanError::BadRequest(format!("Invalid due date: {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_due_date_accepts_plain_date() {
        assert_eq!(
            normalize_due_date("2025-03-14").unwrap(),
            "2025-03-14T00:00:00+00:00"
        );
    }

    #[test]
    fn test_due_date_converts_offsets_to_utc() {
        assert_eq!(
            normalize_due_date("2025-03-14T10:00:00+02:00").unwrap(),
            "2025-03-14T08:00:00+00:00"
        );
    }

    #[test]
    fn test_due_date_rejects_garbage() {
        let err = normalize_due_date("next tuesday").unwrap_err();
        assert!(matches!(err, KanbanError::BadRequest(_)));
    }
}
