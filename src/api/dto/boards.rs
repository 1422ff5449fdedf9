use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::domain::ordering::ListPlacement;
use crate::domain::{Board, Organization};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBoardRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub organization_slug: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateBoardRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateListRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateListRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct ReorderListsRequest {
    pub lists: Vec<ListPlacement>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrganizationRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InviteMemberRequest {
    pub email: String,
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationSummary {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub organization: Organization,
    pub role: String,
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BoardSummary {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub board: Board,
    pub list_count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationDetail {
    #[serde(flatten)]
    pub organization: Organization,
    pub role: String,
    pub boards: Vec<BoardSummary>,
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InvitationResponse {
    pub id: String,
    pub organization_id: String,
    pub email: String,
    pub created_at: String,
}
