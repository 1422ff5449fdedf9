use axum::{
    body::Body,
    extract::{Extension, Multipart, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::handlers::files::read_multipart;
use crate::api::state::AppState;
use crate::auth::{cookies, jwt, middleware::AuthUser, password};
use crate::domain::{KanbanError, User};
use crate::services::mail_service::welcome_email;
use crate::services::organization_service::normalize_email;
use crate::services::upload_service::{UploadKind, UploadService};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: User,
}

#[derive(Debug, sqlx::FromRow)]
struct UserWithPassword {
    #[sqlx(flatten)]
    user: User,
    password_hash: String,
}

#[derive(Debug, sqlx::FromRow)]
struct RefreshTokenRow {
    id: String,
    user_id: String,
}

async fn fetch_user(db: &sqlx::SqlitePool, user_id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT id, email, name, image, created_at, updated_at FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(db)
        .await
}

async fn issue_tokens(
    pool: &sqlx::SqlitePool,
    user_id: &str,
) -> Result<(String, String), KanbanError> {
    let signing_key = jwt::get_or_create_signing_key(pool)
        .await
        .map_err(|e| KanbanError::Internal(format!("Failed to load JWT signing key: {}", e)))?;
    let token = jwt::create_token(&signing_key, user_id)
        .map_err(|e| KanbanError::Internal(format!("Failed to create JWT token: {}", e)))?;

    let refresh_token = jwt::create_refresh_token();
    let refresh_token_hash = jwt::hash_refresh_token(&refresh_token);
    let now = chrono::Utc::now();
    let created_at = now.to_rfc3339();
    let expires_at = (now + chrono::Duration::days(jwt::REFRESH_TOKEN_TTL_DAYS)).to_rfc3339();

    sqlx::query(
        "INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at, created_at, revoked) VALUES (?, ?, ?, ?, ?, 0)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(refresh_token_hash)
    .bind(expires_at)
    .bind(created_at)
    .execute(pool)
    .await?;

    Ok((token, refresh_token))
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Response, KanbanError> {
    let email = normalize_email(&req.email)?;
    let name = req.name.trim().to_string();

    password::check_new_password(&req.password)?;
    if name.is_empty() {
        return Err(KanbanError::BadRequest("Name is required".into()));
    }

    let db = state.require_db()?;

    let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(db)
        .await?;

    if existing.is_some() {
        return Err(KanbanError::BadRequest("Email is already registered".into()));
    }

    let password_hash = password::hash_password(&req.password)
        .map_err(|e| KanbanError::Internal(format!("Failed to hash password: {}", e)))?;

    let user_id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO users (id, email, name, password_hash, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&user_id)
    .bind(&email)
    .bind(&name)
    .bind(&password_hash)
    .bind(&now)
    .bind(&now)
    .execute(db)
    .await?;

    tracing::info!(user_id = user_id.as_str(), "User registered");

    let login_url = state.mailer.link("/dashboard");
    state
        .mailer
        .send_detached(welcome_email(&email, &name, &login_url));

    let (token, refresh_token) = issue_tokens(db, &user_id).await?;
    let user = User {
        id: user_id,
        email,
        name,
        image: None,
        created_at: now.clone(),
        updated_at: now,
    };

    build_auth_response(
        StatusCode::CREATED,
        user,
        &token,
        &refresh_token,
        state.config.cookie_secure,
    )
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, KanbanError> {
    let email = req.email.trim().to_lowercase();
    let db = state.require_db()?;

    let found: Option<UserWithPassword> = sqlx::query_as(
        "SELECT id, email, name, image, created_at, updated_at, password_hash FROM users WHERE email = ?",
    )
    .bind(&email)
    .fetch_optional(db)
    .await?;

    let found =
        found.ok_or_else(|| KanbanError::Unauthorized("Invalid email or password".into()))?;

    let valid = password::verify_password(&req.password, &found.password_hash)
        .map_err(|e| KanbanError::Internal(format!("Failed to verify password: {}", e)))?;

    if !valid {
        return Err(KanbanError::Unauthorized("Invalid email or password".into()));
    }

    let (token, refresh_token) = issue_tokens(db, &found.user.id).await?;

    build_auth_response(
        StatusCode::OK,
        found.user,
        &token,
        &refresh_token,
        state.config.cookie_secure,
    )
}

/// Rotates the refresh token: the presented one is revoked and a new pair
/// is issued.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    req: Option<Json<RefreshRequest>>,
) -> Result<Response, KanbanError> {
    let db = state.require_db()?;
    let refresh_token = cookies::read_cookie(&headers, cookies::REFRESH_TOKEN_COOKIE)
        .or_else(|| req.map(|Json(body)| body.refresh_token.trim().to_string()))
        .filter(|token| !token.is_empty())
        .ok_or_else(|| KanbanError::Unauthorized("Invalid refresh token".into()))?;
    let token_hash = jwt::hash_refresh_token(&refresh_token);
    let now = chrono::Utc::now().to_rfc3339();

    let stored: RefreshTokenRow = sqlx::query_as(
        "SELECT id, user_id FROM refresh_tokens WHERE token_hash = ? AND revoked = 0 AND expires_at > ? ORDER BY created_at DESC LIMIT 1",
    )
    .bind(token_hash)
    .bind(now)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| KanbanError::Unauthorized("Invalid refresh token".into()))?;

    sqlx::query("UPDATE refresh_tokens SET revoked = 1 WHERE id = ?")
        .bind(&stored.id)
        .execute(db)
        .await?;

    let user = fetch_user(db, &stored.user_id)
        .await?
        .ok_or_else(|| KanbanError::Unauthorized("Invalid refresh token".into()))?;

    let (token, refresh_token) = issue_tokens(db, &user.id).await?;

    build_auth_response(
        StatusCode::OK,
        user,
        &token,
        &refresh_token,
        state.config.cookie_secure,
    )
}

pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, KanbanError> {
    let db = state.require_db()?;

    if let Some(refresh_token) = cookies::read_cookie(&headers, cookies::REFRESH_TOKEN_COOKIE) {
        let token_hash = jwt::hash_refresh_token(refresh_token.trim());

        sqlx::query("UPDATE refresh_tokens SET revoked = 1 WHERE token_hash = ?")
            .bind(token_hash)
            .execute(db)
            .await?;
    }

    let secure = state.config.cookie_secure;
    let clear_access_cookie = cookies::build_clear_cookie(cookies::ACCESS_TOKEN_COOKIE, secure);
    let clear_refresh_cookie = cookies::build_clear_cookie(cookies::REFRESH_TOKEN_COOKIE, secure);

    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header(header::SET_COOKIE, clear_access_cookie)
        .header(header::SET_COOKIE, clear_refresh_cookie)
        .body(Body::empty())
        .map_err(|e| KanbanError::Internal(format!("Failed to build auth response: {}", e)))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<User>, KanbanError> {
    let db = state.require_db()?;

    let user = fetch_user(db, &auth_user.user_id)
        .await?
        .ok_or_else(|| KanbanError::NotFound("User not found".into()))?;

    Ok(Json(user))
}

fn build_auth_response(
    status: StatusCode,
    user: User,
    access_token: &str,
    refresh_token: &str,
    secure: bool,
) -> Result<Response, KanbanError> {
    let access_cookie = cookies::build_token_cookie(
        cookies::ACCESS_TOKEN_COOKIE,
        access_token,
        jwt::ACCESS_TOKEN_TTL_SECS,
        secure,
    );
    let refresh_cookie = cookies::build_token_cookie(
        cookies::REFRESH_TOKEN_COOKIE,
        refresh_token,
        jwt::REFRESH_TOKEN_TTL_DAYS * 24 * 60 * 60,
        secure,
    );
    let response_body = Json(LoginResponse { user }).into_response().into_body();

    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::SET_COOKIE, access_cookie)
        .header(header::SET_COOKIE, refresh_cookie)
        .body(response_body)
        .map_err(|e| KanbanError::Internal(format!("Failed to build auth response: {}", e)))
}

pub async fn upload_avatar(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<Json<User>, KanbanError> {
    let db = state.require_db()?;
    let files = read_multipart(multipart).await?;

    let stored = UploadService::store(
        db,
        state.upload_dir(),
        &auth_user.user_id,
        None,
        UploadKind::Avatar,
        files,
    )
    .await?;
    let avatar = stored
        .first()
        .ok_or_else(|| KanbanError::BadRequest("No file provided".into()))?;

    sqlx::query("UPDATE users SET image = ?, updated_at = ? WHERE id = ?")
        .bind(avatar.url())
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(&auth_user.user_id)
        .execute(db)
        .await?;

    UploadService::delete_owned(db, &auth_user.user_id, UploadKind::Avatar, Some(&avatar.id))
        .await?;

    let user = fetch_user(db, &auth_user.user_id)
        .await?
        .ok_or_else(|| KanbanError::NotFound("User not found".into()))?;

    Ok(Json(user))
}

pub async fn delete_avatar(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<StatusCode, KanbanError> {
    let db = state.require_db()?;

    sqlx::query("UPDATE users SET image = NULL, updated_at = ? WHERE id = ?")
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(&auth_user.user_id)
        .execute(db)
        .await?;

    UploadService::delete_owned(db, &auth_user.user_id, UploadKind::Avatar, None).await?;

    Ok(StatusCode::NO_CONTENT)
}
