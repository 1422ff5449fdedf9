use axum::{
    extract::{Extension, Multipart, Path, State},
    http::StatusCode,
    Json,
};

use crate::api::dto::{MoveCardRequest, ReorderCardsRequest, UpdateCardRequest};
use crate::api::handlers::files::read_multipart;
use crate::api::state::AppState;
use crate::auth::AuthUser;
use crate::domain::{Attachment, Card, KanbanError};
use crate::services::access::Access;
use crate::services::upload_service::{UploadKind, UploadService};
use crate::services::CardService;

pub async fn get_card(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Card>, KanbanError> {
    let db = state.require_db()?;
    let (card, _) = Access::require_card(db, &id, &user).await?;
    Ok(Json(card))
}

pub async fn update_card(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(req): Json<UpdateCardRequest>,
) -> Result<Json<Card>, KanbanError> {
    let db = state.require_db()?;
    let card = CardService::update_card(db, &state.views, &user, &id, req).await?;
    Ok(Json(card))
}

pub async fn delete_card(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Card>, KanbanError> {
    let db = state.require_db()?;
    let card = CardService::delete_card(db, &state.views, &user, &id).await?;
    Ok(Json(card))
}

pub async fn move_card(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(req): Json<MoveCardRequest>,
) -> Result<Json<Card>, KanbanError> {
    let db = state.require_db()?;
    let card = CardService::move_card(db, &state.views, &user, &id, req).await?;
    Ok(Json(card))
}

pub async fn reorder_cards(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<ReorderCardsRequest>,
) -> Result<StatusCode, KanbanError> {
    let db = state.require_db()?;
    CardService::reorder_cards(db, &state.views, &user, req).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn upload_attachments(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Vec<Attachment>>), KanbanError> {
    let db = state.require_db()?;
    Access::require_card(db, &id, &user).await?;

    let files = read_multipart(multipart).await?;
    let stored = UploadService::store(
        db,
        state.upload_dir(),
        &user.user_id,
        Some(&id),
        UploadKind::CardAttachment,
        files,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn list_attachments(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Attachment>>, KanbanError> {
    let db = state.require_db()?;
    Access::require_card(db, &id, &user).await?;
    Ok(Json(UploadService::list_for_card(db, &id).await?))
}
