use serde::{Deserialize, Deserializer};

use crate::domain::ordering::CardPlacement;

#[derive(Debug, Deserialize)]
pub struct CreateCardRequest {
    pub title: String,
}

/// Partial card update. `description` and `dueDate` distinguish an absent
/// field (keep) from an explicit `null` (clear).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCardRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub due_date: Option<Option<String>>,
    #[serde(default)]
    pub completed: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveCardRequest {
    pub new_list_id: String,
    pub new_order: i64,
}

#[derive(Debug, Deserialize)]
pub struct ReorderCardsRequest {
    pub cards: Vec<CardPlacement>,
}

fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
