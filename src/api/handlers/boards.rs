use axum::{
    extract::{Extension, Multipart, Path, State},
    http::StatusCode,
    Json,
};

use crate::api::dto::{CreateBoardRequest, CreateListRequest, ReorderListsRequest, UpdateBoardRequest};
use crate::api::handlers::files::read_multipart;
use crate::api::state::AppState;
use crate::auth::AuthUser;
use crate::domain::{Board, BoardView, KanbanError, List};
use crate::services::access::Access;
use crate::services::upload_service::{UploadKind, UploadService};
use crate::services::{BoardService, ListService};

pub async fn create_board(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateBoardRequest>,
) -> Result<(StatusCode, Json<Board>), KanbanError> {
    let db = state.require_db()?;
    let board = BoardService::create_board(db, &user, req).await?;
    Ok((StatusCode::CREATED, Json(board)))
}

pub async fn get_board(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<BoardView>, KanbanError> {
    let db = state.require_db()?;
    let view = BoardService::get_view(db, &state.views, &user, &id).await?;
    Ok(Json(view.as_ref().clone()))
}

pub async fn update_board(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(req): Json<UpdateBoardRequest>,
) -> Result<Json<Board>, KanbanError> {
    let db = state.require_db()?;
    let board = BoardService::update_board(db, &state.views, &user, &id, req).await?;
    Ok(Json(board))
}

pub async fn delete_board(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, KanbanError> {
    let db = state.require_db()?;
    BoardService::delete_board(db, &state.views, &user, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn upload_cover(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Board>, KanbanError> {
    let db = state.require_db()?;
    Access::require_board(db, &id, &user).await?;

    let files = read_multipart(multipart).await?;
    let stored = UploadService::store(
        db,
        state.upload_dir(),
        &user.user_id,
        None,
        UploadKind::BoardCover,
        files,
    )
    .await?;
    let cover = stored
        .first()
        .ok_or_else(|| KanbanError::BadRequest("No file provided".into()))?;

    let board = BoardService::set_cover_image(db, &state.views, &id, &cover.url()).await?;
    Ok(Json(board))
}

pub async fn create_list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(board_id): Path<String>,
    Json(req): Json<CreateListRequest>,
) -> Result<(StatusCode, Json<List>), KanbanError> {
    let db = state.require_db()?;
    let list = ListService::create_list(db, &state.views, &user, &board_id, req).await?;
    Ok((StatusCode::CREATED, Json(list)))
}

pub async fn reorder_lists(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(board_id): Path<String>,
    Json(req): Json<ReorderListsRequest>,
) -> Result<StatusCode, KanbanError> {
    let db = state.require_db()?;
    ListService::reorder_lists(db, &state.views, &user, &board_id, req).await?;
    Ok(StatusCode::NO_CONTENT)
}
