use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::ordering::Ordered;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_by_id: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub id: String,
    pub organization_id: String,
    pub user_id: String,
    pub role: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub organization_id: String,
    pub created_by_id: String,
    pub cover_image: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct List {
    pub id: String,
    pub title: String,
    #[sqlx(rename = "sort_order")]
    pub order: i64,
    pub board_id: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub completed: bool,
    #[sqlx(rename = "sort_order")]
    pub order: i64,
    pub list_id: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Ordered for List {
    fn order(&self) -> i64 {
        self.order
    }
}

impl Ordered for Card {
    fn order(&self) -> i64 {
        self.order
    }
}

/// A list together with its cards, cards in display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListWithCards {
    #[serde(flatten)]
    pub list: List,
    pub cards: Vec<Card>,
}

impl ListWithCards {
    pub fn id(&self) -> &str {
        &self.list.id
    }

    pub fn position_of(&self, card_id: &str) -> Option<usize> {
        self.cards.iter().position(|card| card.id == card_id)
    }
}

/// Read model of a board: lists left-to-right, each with cards top-to-bottom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardView {
    #[serde(flatten)]
    pub board: Board,
    pub organization_slug: String,
    pub lists: Vec<ListWithCards>,
}
