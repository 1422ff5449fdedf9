use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};

use crate::api::dto::{CreateCardRequest, UpdateListRequest};
use crate::api::state::AppState;
use crate::auth::AuthUser;
use crate::domain::{Card, KanbanError, List};
use crate::services::{CardService, ListService};

pub async fn update_list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(req): Json<UpdateListRequest>,
) -> Result<Json<List>, KanbanError> {
    let db = state.require_db()?;
    let list = ListService::update_list(db, &state.views, &user, &id, req).await?;
    Ok(Json(list))
}

pub async fn delete_list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<List>, KanbanError> {
    let db = state.require_db()?;
    let list = ListService::delete_list(db, &state.views, &user, &id).await?;
    Ok(Json(list))
}

pub async fn create_card(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(list_id): Path<String>,
    Json(req): Json<CreateCardRequest>,
) -> Result<(StatusCode, Json<Card>), KanbanError> {
    let db = state.require_db()?;
    let card = CardService::create_card(db, &state.views, &user, &list_id, req).await?;
    Ok((StatusCode::CREATED, Json(card)))
}
