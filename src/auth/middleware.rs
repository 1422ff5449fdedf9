use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::state::AppState;
use crate::auth::{cookies, jwt};
use crate::domain::KanbanError;

/// The session user, inserted as a request extension by [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

/// Rejects the request with 401 before the handler runs unless it carries a
/// valid access token (bearer header, `access_token` cookie or `token`
/// query parameter for event streams).
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, KanbanError> {
    let token = extract_token(&req)
        .ok_or_else(|| KanbanError::Unauthorized("Authentication required".into()))?;

    let db = state
        .require_db()
        .map_err(|_| KanbanError::Unauthorized("Authentication unavailable".into()))?;
    let signing_key = jwt::get_or_create_signing_key(db)
        .await
        .map_err(|_| KanbanError::Unauthorized("Authentication unavailable".into()))?;
    let claims = jwt::verify_token(&signing_key, &token)
        .map_err(|_| KanbanError::Unauthorized("Invalid or expired session".into()))?;

    req.extensions_mut().insert(AuthUser {
        user_id: claims.sub,
    });

    Ok(next.run(req).await)
}

fn extract_token(req: &Request) -> Option<String> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string);

    auth_header
        .or_else(|| cookies::read_cookie(req.headers(), cookies::ACCESS_TOKEN_COOKIE))
        .or_else(|| {
            req.uri().query().and_then(|query| {
                query
                    .split('&')
                    .filter_map(|part| part.split_once('='))
                    .find(|(key, _)| *key == "token")
                    .map(|(_, value)| value.to_string())
            })
        })
        .filter(|token| !token.is_empty())
}
