//! Membership checks shared by the mutation services.
//!
//! A caller may touch a board, or anything inside it, only when a
//! membership row links them to the board's organization.

use sqlx::SqlitePool;

use crate::auth::middleware::AuthUser;
use crate::domain::{Board, Card, KanbanError, List, Role};

pub struct Access;

impl Access {
    pub async fn member_role(
        pool: &SqlitePool,
        organization_id: &str,
        user_id: &str,
    ) -> Result<Option<Role>, KanbanError> {
        let role: Option<String> = sqlx::query_scalar(
            "SELECT role FROM memberships WHERE organization_id = ? AND user_id = ?",
        )
        .bind(organization_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        role.map(|r| {
            r.parse::<Role>()
                .map_err(|e| KanbanError::Internal(format!("Invalid role in DB: {}", e)))
        })
        .transpose()
    }

    pub async fn require_member(
        pool: &SqlitePool,
        organization_id: &str,
        user: &AuthUser,
    ) -> Result<Role, KanbanError> {
        Self::member_role(pool, organization_id, &user.user_id)
            .await?
            .ok_or_else(|| {
                KanbanError::Forbidden("You are not a member of this organization".into())
            })
    }

    pub async fn require_board(
        pool: &SqlitePool,
        board_id: &str,
        user: &AuthUser,
    ) -> Result<Board, KanbanError> {
        let board: Board = sqlx::query_as("SELECT * FROM boards WHERE id = ?")
            .bind(board_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| KanbanError::NotFound(format!("Board not found: {}", board_id)))?;

        Self::require_member(pool, &board.organization_id, user).await?;
        Ok(board)
    }

    pub async fn require_list(
        pool: &SqlitePool,
        list_id: &str,
        user: &AuthUser,
    ) -> Result<List, KanbanError> {
        let list: List = sqlx::query_as("SELECT * FROM lists WHERE id = ?")
            .bind(list_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| KanbanError::NotFound(format!("List not found: {}", list_id)))?;

        Self::require_board(pool, &list.board_id, user).await?;
        Ok(list)
    }

    /// Returns the card and the id of the board that owns it.
    pub async fn require_card(
        pool: &SqlitePool,
        card_id: &str,
        user: &AuthUser,
    ) -> Result<(Card, String), KanbanError> {
        let card: Card = sqlx::query_as("SELECT * FROM cards WHERE id = ?")
            .bind(card_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| KanbanError::NotFound(format!("Card not found: {}", card_id)))?;

        let list = Self::require_list(pool, &card.list_id, user).await?;
        Ok((card, list.board_id))
    }
}
