use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::api::dto::{
    BoardSummary, CreateOrganizationRequest, InvitationResponse, InviteMemberRequest,
    OrganizationDetail, OrganizationSummary,
};
use crate::auth::middleware::AuthUser;
use crate::domain::{KanbanError, Organization, Role};
use crate::services::access::Access;
use crate::services::mail_service::{invitation_email, Mailer};

pub struct OrganizationService;

impl OrganizationService {
    /// Creates the organization with the caller as its OWNER.
    pub async fn create_organization(
        pool: &SqlitePool,
        user: &AuthUser,
        req: CreateOrganizationRequest,
    ) -> Result<Organization, KanbanError> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(KanbanError::BadRequest("Name is required".into()));
        }

        let base = slugify(name);
        let taken: Option<String> = sqlx::query_scalar("SELECT id FROM organizations WHERE slug = ?")
            .bind(&base)
            .fetch_optional(pool)
            .await?;
        let slug = match taken {
            Some(_) => format!("{}-{}", base, random_suffix()),
            None => base,
        };

        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let description = req
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let mut tx = pool.begin().await?;

        sqlx::query(
            "INSERT INTO organizations (id, name, slug, description, created_by_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(name)
        .bind(&slug)
        .bind(&description)
        .bind(&user.user_id)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO memberships (id, organization_id, user_id, role, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&id)
        .bind(&user.user_id)
        .bind(Role::Owner.as_str())
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(organization_id = id.as_str(), slug = slug.as_str(), "Organization created");
        Self::get_by_slug(pool, &slug).await
    }

    pub async fn get_by_slug(pool: &SqlitePool, slug: &str) -> Result<Organization, KanbanError> {
        sqlx::query_as("SELECT * FROM organizations WHERE slug = ?")
            .bind(slug)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| KanbanError::NotFound(format!("Organization not found: {}", slug)))
    }

    pub async fn list_for_user(
        pool: &SqlitePool,
        user: &AuthUser,
    ) -> Result<Vec<OrganizationSummary>, KanbanError> {
        let orgs = sqlx::query_as(
            r#"
            SELECT o.*, m.role FROM organizations o
            JOIN memberships m ON m.organization_id = o.id
            WHERE m.user_id = ?
            ORDER BY o.created_at ASC
            "#,
        )
        .bind(&user.user_id)
        .fetch_all(pool)
        .await?;
        Ok(orgs)
    }

    /// Organization with the caller's role and its boards, most recently
    /// updated first.
    pub async fn get_detail(
        pool: &SqlitePool,
        user: &AuthUser,
        slug: &str,
    ) -> Result<OrganizationDetail, KanbanError> {
        let organization = Self::get_by_slug(pool, slug).await?;
        let role = Access::require_member(pool, &organization.id, user).await?;

        let boards: Vec<BoardSummary> = sqlx::query_as(
            r#"
            SELECT b.*, (SELECT COUNT(*) FROM lists l WHERE l.board_id = b.id) AS list_count
            FROM boards b
            WHERE b.organization_id = ?
            ORDER BY b.updated_at DESC
            "#,
        )
        .bind(&organization.id)
        .fetch_all(pool)
        .await?;

        Ok(OrganizationDetail {
            organization,
            role: role.as_str().to_string(),
            boards,
        })
    }

    pub async fn invite(
        pool: &SqlitePool,
        mailer: &Mailer,
        user: &AuthUser,
        slug: &str,
        req: InviteMemberRequest,
    ) -> Result<InvitationResponse, KanbanError> {
        let organization = Self::get_by_slug(pool, slug).await?;
        let role = Access::require_member(pool, &organization.id, user).await?;
        if !role.can_invite() {
            return Err(KanbanError::Forbidden(
                "Only owners and admins can invite members".into(),
            ));
        }

        let email = normalize_email(&req.email)?;

        let already_member: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT 1 FROM memberships m
            JOIN users u ON u.id = m.user_id
            WHERE m.organization_id = ? AND u.email = ?
            "#,
        )
        .bind(&organization.id)
        .bind(&email)
        .fetch_optional(pool)
        .await?;
        if already_member.is_some() {
            return Err(KanbanError::BadRequest(format!(
                "{} is already a member",
                email
            )));
        }

        let id = Uuid::new_v4().to_string();
        let token = Uuid::new_v4().simple().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO invitations (id, organization_id, email, token, invited_by_id, accepted, created_at) VALUES (?, ?, ?, ?, ?, 0, ?)",
        )
        .bind(&id)
        .bind(&organization.id)
        .bind(&email)
        .bind(&token)
        .bind(&user.user_id)
        .bind(&now)
        .execute(pool)
        .await?;

        let url = mailer.link(&format!("/invitations/{}", token));
        mailer.send_detached(invitation_email(&email, &organization.name, &url));

        tracing::info!(organization_id = organization.id.as_str(), email = email.as_str(), "Invitation created");
        Ok(InvitationResponse {
            id,
            organization_id: organization.id,
            email,
            created_at: now,
        })
    }

    /// Adds the caller as a MEMBER. The caller's email must match the
    /// invited address.
    pub async fn accept_invitation(
        pool: &SqlitePool,
        user: &AuthUser,
        token: &str,
    ) -> Result<Organization, KanbanError> {
        let invitation: Option<(String, String, String)> = sqlx::query_as(
            "SELECT id, organization_id, email FROM invitations WHERE token = ? AND accepted = 0",
        )
        .bind(token)
        .fetch_optional(pool)
        .await?;
        let (invitation_id, organization_id, invited_email) =
            invitation.ok_or_else(|| KanbanError::NotFound("Invitation not found".into()))?;

        let email: String = sqlx::query_scalar("SELECT email FROM users WHERE id = ?")
            .bind(&user.user_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| KanbanError::Unauthorized("Unknown user".into()))?;
        if !email.eq_ignore_ascii_case(&invited_email) {
            return Err(KanbanError::Forbidden(
                "This invitation was sent to a different email address".into(),
            ));
        }

        let now = Utc::now().to_rfc3339();
        let mut tx = pool.begin().await?;

        sqlx::query(
            "INSERT OR IGNORE INTO memberships (id, organization_id, user_id, role, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&organization_id)
        .bind(&user.user_id)
        .bind(Role::Member.as_str())
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE invitations SET accepted = 1 WHERE id = ?")
            .bind(&invitation_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        sqlx::query_as("SELECT * FROM organizations WHERE id = ?")
            .bind(&organization_id)
            .fetch_one(pool)
            .await
            .map_err(Into::into)
    }
}

/// Lowercase, runs of anything but `a-z0-9` collapsed to one `-`, no
/// leading or trailing `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            slug.push(ch);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("organization");
    }
    slug
}

fn random_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

pub(crate) fn normalize_email(raw: &str) -> Result<String, KanbanError> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(KanbanError::BadRequest(format!("Invalid email: {}", raw))),
    }
}
