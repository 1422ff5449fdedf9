use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};

use crate::api::dto::{
    CreateOrganizationRequest, InvitationResponse, InviteMemberRequest, OrganizationDetail,
    OrganizationSummary,
};
use crate::api::state::AppState;
use crate::auth::AuthUser;
use crate::domain::{KanbanError, Organization};
use crate::services::OrganizationService;

pub async fn list_organizations(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<OrganizationSummary>>, KanbanError> {
    let db = state.require_db()?;
    Ok(Json(OrganizationService::list_for_user(db, &user).await?))
}

pub async fn create_organization(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateOrganizationRequest>,
) -> Result<(StatusCode, Json<Organization>), KanbanError> {
    let db = state.require_db()?;
    let organization = OrganizationService::create_organization(db, &user, req).await?;
    Ok((StatusCode::CREATED, Json(organization)))
}

pub async fn get_organization(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(slug): Path<String>,
) -> Result<Json<OrganizationDetail>, KanbanError> {
    let db = state.require_db()?;
    Ok(Json(OrganizationService::get_detail(db, &user, &slug).await?))
}

pub async fn invite_member(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(slug): Path<String>,
    Json(req): Json<InviteMemberRequest>,
) -> Result<(StatusCode, Json<InvitationResponse>), KanbanError> {
    let db = state.require_db()?;
    let invitation = OrganizationService::invite(db, &state.mailer, &user, &slug, req).await?;
    Ok((StatusCode::CREATED, Json(invitation)))
}

pub async fn accept_invitation(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(token): Path<String>,
) -> Result<Json<Organization>, KanbanError> {
    let db = state.require_db()?;
    Ok(Json(
        OrganizationService::accept_invitation(db, &user, &token).await?,
    ))
}
