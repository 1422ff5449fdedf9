use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Metadata of a stored upload. Card attachments carry a `card_id`;
/// avatars and board covers do not.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    pub owner_id: String,
    pub card_id: Option<String>,
    pub kind: String,
    pub original_filename: String,
    #[serde(skip)]
    pub file_path: String,
    pub file_size: i64,
    pub mime_type: String,
    pub uploaded_at: String,
}

impl Attachment {
    pub fn url(&self) -> String {
        format!("/api/files/{}", self.id)
    }
}
