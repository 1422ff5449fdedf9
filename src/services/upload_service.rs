//! File uploads: content sniffing, per-uploader limits and storage under
//! `UPLOAD_DIR/<owner id>/`.

use std::path::Path;

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::domain::{Attachment, KanbanError};

const MB: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    Image,
    Pdf,
    Video,
}

impl FileCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Image => "image",
            FileCategory::Pdf => "pdf",
            FileCategory::Video => "video",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    pub category: FileCategory,
    pub max_size: usize,
    pub max_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Avatar,
    CardAttachment,
    BoardCover,
}

impl UploadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadKind::Avatar => "avatar",
            UploadKind::CardAttachment => "attachment",
            UploadKind::BoardCover => "cover",
        }
    }

    pub fn limits(&self) -> &'static [Limit] {
        match self {
            UploadKind::Avatar => &[Limit {
                category: FileCategory::Image,
                max_size: 4 * MB,
                max_count: 1,
            }],
            UploadKind::CardAttachment => &[
                Limit {
                    category: FileCategory::Image,
                    max_size: 8 * MB,
                    max_count: 5,
                },
                Limit {
                    category: FileCategory::Pdf,
                    max_size: 16 * MB,
                    max_count: 5,
                },
                Limit {
                    category: FileCategory::Video,
                    max_size: 32 * MB,
                    max_count: 2,
                },
            ],
            UploadKind::BoardCover => &[Limit {
                category: FileCategory::Image,
                max_size: 8 * MB,
                max_count: 1,
            }],
        }
    }

    /// Largest request body this kind can legitimately produce.
    pub fn max_request_bytes(&self) -> usize {
        self.limits()
            .iter()
            .map(|limit| limit.max_size * limit.max_count)
            .sum::<usize>()
            + MB
    }
}

/// Detects the MIME type from magic bytes.
pub fn detect_content_type(bytes: &[u8]) -> Option<(&'static str, FileCategory)> {
    if bytes.len() < 4 {
        return None;
    }

    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some(("image/jpeg", FileCategory::Image));
    }
    if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        return Some(("image/png", FileCategory::Image));
    }
    if bytes.starts_with(b"GIF8") {
        return Some(("image/gif", FileCategory::Image));
    }
    if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        return Some(("image/webp", FileCategory::Image));
    }
    if bytes.starts_with(b"%PDF") {
        return Some(("application/pdf", FileCategory::Pdf));
    }
    if bytes.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        return Some(("video/webm", FileCategory::Video));
    }
    if bytes.len() >= 12 && &bytes[4..8] == b"ftyp" {
        if &bytes[8..12] == b"qt  " {
            return Some(("video/quicktime", FileCategory::Video));
        }
        return Some(("video/mp4", FileCategory::Video));
    }

    None
}

#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub mime_type: &'static str,
    pub category: FileCategory,
}

/// Checks every file against the uploader's limits before anything is
/// written.
pub fn validate(kind: UploadKind, files: &[IncomingFile]) -> Result<Vec<Accepted>, KanbanError> {
    if files.is_empty() {
        return Err(KanbanError::BadRequest("No file provided".into()));
    }

    let limits = kind.limits();
    let mut counts = vec![0usize; limits.len()];
    let mut accepted = Vec::with_capacity(files.len());

    for file in files {
        let (mime_type, category) = detect_content_type(&file.bytes).ok_or_else(|| {
            KanbanError::BadRequest(format!("Unsupported file type: {}", file.filename))
        })?;

        let (slot, limit) = limits
            .iter()
            .enumerate()
            .find(|(_, limit)| limit.category == category)
            .ok_or_else(|| {
                KanbanError::BadRequest(format!(
                    "{} files are not accepted for {} uploads",
                    category.as_str(),
                    kind.as_str()
                ))
            })?;

        if file.bytes.len() > limit.max_size {
            return Err(KanbanError::BadRequest(format!(
                "File too large: {} ({} bytes, max {} bytes)",
                file.filename,
                file.bytes.len(),
                limit.max_size
            )));
        }

        counts[slot] += 1;
        if counts[slot] > limit.max_count {
            return Err(KanbanError::BadRequest(format!(
                "Too many {} files (max {})",
                category.as_str(),
                limit.max_count
            )));
        }

        accepted.push(Accepted {
            mime_type,
            category,
        });
    }

    Ok(accepted)
}

pub struct UploadService;

/// Parent whose deletion cascades to card attachment rows.
#[derive(Debug, Clone, Copy)]
pub enum AttachmentScope<'a> {
    Card(&'a str),
    List(&'a str),
    Board(&'a str),
}

impl<'a> AttachmentScope<'a> {
    fn query(self) -> (&'static str, &'a str) {
        match self {
            AttachmentScope::Card(id) => ("SELECT * FROM attachments WHERE card_id = ?", id),
            AttachmentScope::List(id) => (
                "SELECT a.* FROM attachments a JOIN cards c ON c.id = a.card_id WHERE c.list_id = ?",
                id,
            ),
            AttachmentScope::Board(id) => (
                r#"
                SELECT a.* FROM attachments a
                JOIN cards c ON c.id = a.card_id
                JOIN lists l ON l.id = c.list_id
                WHERE l.board_id = ?
                "#,
                id,
            ),
        }
    }
}

impl UploadService {
    pub async fn store(
        pool: &SqlitePool,
        upload_dir: &Path,
        owner_id: &str,
        card_id: Option<&str>,
        kind: UploadKind,
        files: Vec<IncomingFile>,
    ) -> Result<Vec<Attachment>, KanbanError> {
        let accepted = validate(kind, &files)?;

        let dir = upload_dir.join(owner_id);
        fs::create_dir_all(&dir).await.map_err(|e| {
            KanbanError::Internal(format!("Failed to create upload directory: {}", e))
        })?;

        let mut stored = Vec::with_capacity(files.len());
        for (file, meta) in files.into_iter().zip(accepted) {
            let id = Uuid::new_v4().to_string();
            let path = dir.join(format!("{}_{}", id, sanitize_filename(&file.filename)));

            let mut handle = fs::File::create(&path)
                .await
                .map_err(|e| KanbanError::Internal(format!("Failed to create file: {}", e)))?;
            handle
                .write_all(&file.bytes)
                .await
                .map_err(|e| KanbanError::Internal(format!("Failed to write file: {}", e)))?;

            let attachment: Attachment = sqlx::query_as(
                r#"
                INSERT INTO attachments (id, owner_id, card_id, kind, original_filename, file_path, file_size, mime_type, uploaded_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                RETURNING *
                "#,
            )
            .bind(&id)
            .bind(owner_id)
            .bind(card_id)
            .bind(kind.as_str())
            .bind(&file.filename)
            .bind(path.to_string_lossy().to_string())
            .bind(file.bytes.len() as i64)
            .bind(meta.mime_type)
            .bind(Utc::now().to_rfc3339())
            .fetch_one(pool)
            .await?;

            tracing::info!(
                attachment_id = attachment.id.as_str(),
                kind = kind.as_str(),
                size = attachment.file_size,
                "File stored"
            );
            stored.push(attachment);
        }

        Ok(stored)
    }

    pub async fn get(pool: &SqlitePool, id: &str) -> Result<Attachment, KanbanError> {
        sqlx::query_as("SELECT * FROM attachments WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| KanbanError::NotFound(format!("File {} not found", id)))
    }

    pub async fn list_for_card(
        pool: &SqlitePool,
        card_id: &str,
    ) -> Result<Vec<Attachment>, KanbanError> {
        let files = sqlx::query_as(
            "SELECT * FROM attachments WHERE card_id = ? ORDER BY uploaded_at DESC",
        )
        .bind(card_id)
        .fetch_all(pool)
        .await?;
        Ok(files)
    }

    pub async fn read(attachment: &Attachment) -> Result<Vec<u8>, KanbanError> {
        fs::read(&attachment.file_path)
            .await
            .map_err(|e| KanbanError::Internal(format!("Failed to read file: {}", e)))
    }

    /// Removes the row, then the file; a missing file is only logged.
    pub async fn delete(pool: &SqlitePool, attachment: &Attachment) -> Result<(), KanbanError> {
        sqlx::query("DELETE FROM attachments WHERE id = ?")
            .bind(&attachment.id)
            .execute(pool)
            .await?;

        Self::remove_files(std::slice::from_ref(attachment)).await;
        Ok(())
    }

    /// Attachments that go away with `scope`. Run inside the deleting
    /// transaction, before the parent row is removed.
    pub async fn attached_to(
        conn: &mut SqliteConnection,
        scope: AttachmentScope<'_>,
    ) -> Result<Vec<Attachment>, KanbanError> {
        let (sql, id) = scope.query();
        Ok(sqlx::query_as(sql).bind(id).fetch_all(conn).await?)
    }

    /// Removes stored files whose rows are already gone; failures are only
    /// logged.
    pub async fn remove_files(attachments: &[Attachment]) {
        for attachment in attachments {
            if let Err(e) = fs::remove_file(&attachment.file_path).await {
                tracing::warn!("Failed to delete file {}: {}", attachment.file_path, e);
            }
        }
    }

    /// Deletes every upload of `kind` owned by `owner_id` except `keep`.
    pub async fn delete_owned(
        pool: &SqlitePool,
        owner_id: &str,
        kind: UploadKind,
        keep: Option<&str>,
    ) -> Result<(), KanbanError> {
        let old: Vec<Attachment> = sqlx::query_as(
            "SELECT * FROM attachments WHERE owner_id = ? AND kind = ? AND id != COALESCE(?, '')",
        )
        .bind(owner_id)
        .bind(kind.as_str())
        .bind(keep)
        .fetch_all(pool)
        .await?;

        for attachment in &old {
            Self::delete(pool, attachment).await?;
        }
        Ok(())
    }
}

fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
