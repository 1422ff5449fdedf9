use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::password;
use crate::domain::Role;
use crate::services::board_service::DEFAULT_LISTS;

pub const DEMO_EMAIL: &str = "demo@teamflow.local";
const DEMO_PASSWORD: &str = "teamflow-demo";
const DEMO_NAME: &str = "Demo";
const DEMO_ORGANIZATION: &str = "Demo Team";
const DEMO_ORGANIZATION_SLUG: &str = "demo-team";

/// Creates a demo user owning one organization with one board. Does
/// nothing when the demo user already exists.
pub async fn seed_demo_user(pool: &SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
    let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
        .bind(DEMO_EMAIL)
        .fetch_optional(pool)
        .await?;

    if existing.is_some() {
        tracing::debug!("Demo user '{}' already exists, skipping seed", DEMO_EMAIL);
        return Ok(());
    }

    let password_hash = password::hash_password(DEMO_PASSWORD)?;
    let user_id = Uuid::new_v4().to_string();
    let organization_id = Uuid::new_v4().to_string();
    let board_id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO users (id, email, name, password_hash, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&user_id)
    .bind(DEMO_EMAIL)
    .bind(DEMO_NAME)
    .bind(&password_hash)
    .bind(&now)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO organizations (id, name, slug, created_by_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&organization_id)
    .bind(DEMO_ORGANIZATION)
    .bind(DEMO_ORGANIZATION_SLUG)
    .bind(&user_id)
    .bind(&now)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO memberships (id, organization_id, user_id, role, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&organization_id)
    .bind(&user_id)
    .bind(Role::Owner.as_str())
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO boards (id, title, organization_id, created_by_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&board_id)
    .bind("Getting started")
    .bind(&organization_id)
    .bind(&user_id)
    .bind(&now)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    for (order, title) in DEFAULT_LISTS.iter().enumerate() {
        sqlx::query(
            "INSERT INTO lists (id, title, sort_order, board_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(*title)
        .bind(order as i64)
        .bind(&board_id)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!("Demo user '{}' created successfully", DEMO_EMAIL);
    Ok(())
}
