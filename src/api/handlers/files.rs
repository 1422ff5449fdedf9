use axum::{
    body::Body,
    extract::{Extension, Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::api::state::AppState;
use crate::auth::AuthUser;
use crate::domain::{Attachment, KanbanError};
use crate::services::access::Access;
use crate::services::upload_service::{IncomingFile, UploadService};

/// Collects every file field of a multipart body.
pub async fn read_multipart(mut multipart: Multipart) -> Result<Vec<IncomingFile>, KanbanError> {
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        KanbanError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        let filename = field
            .file_name()
            .map(|s: &str| s.to_string())
            .unwrap_or_else(|| format!("file_{}", Uuid::new_v4()));

        let bytes = field
            .bytes()
            .await
            .map_err(|e| KanbanError::BadRequest(format!("Failed to read file data: {}", e)))?;

        files.push(IncomingFile {
            filename,
            bytes: bytes.to_vec(),
        });
    }

    Ok(files)
}

/// Card attachments are visible to members of the card's board; avatars
/// and covers to any signed-in user.
async fn require_readable(
    state: &AppState,
    attachment: &Attachment,
    user: &AuthUser,
) -> Result<(), KanbanError> {
    let db = state.require_db()?;
    match attachment.card_id.as_deref() {
        Some(card_id) if attachment.owner_id != user.user_id => {
            Access::require_card(db, card_id, user).await.map(|_| ())
        }
        _ => Ok(()),
    }
}

pub async fn download_file(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(file_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, KanbanError> {
    let db = state.require_db()?;
    let attachment = UploadService::get(db, &file_id).await?;
    require_readable(&state, &attachment, &user).await?;

    let bytes = UploadService::read(&attachment).await?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let etag = format!(
        "\"{}\"",
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<String>()
    );

    let not_modified = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == etag);

    let builder = Response::builder()
        .header(header::ETAG, &etag)
        .header(header::CACHE_CONTROL, "private, max-age=3600");

    let response = if not_modified {
        builder.status(StatusCode::NOT_MODIFIED).body(Body::empty())
    } else {
        builder
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, &attachment.mime_type)
            .header(
                header::CONTENT_DISPOSITION,
                format!(
                    "inline; filename=\"{}\"",
                    attachment.original_filename.replace('"', "")
                ),
            )
            .body(Body::from(bytes))
    };

    response.map_err(|e| KanbanError::Internal(format!("Failed to build file response: {}", e)))
}

/// The uploader, or for card attachments any member of the board, may
/// delete a file.
pub async fn delete_file(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(file_id): Path<String>,
) -> Result<StatusCode, KanbanError> {
    let db = state.require_db()?;
    let attachment = UploadService::get(db, &file_id).await?;

    if attachment.owner_id != user.user_id {
        let card_id = attachment.card_id.as_deref().ok_or_else(|| {
            KanbanError::Forbidden("Only the uploader can delete this file".into())
        })?;
        Access::require_card(db, card_id, &user).await?;
    }

    UploadService::delete(db, &attachment).await?;
    Ok(StatusCode::NO_CONTENT)
}
