use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;

pub async fn init_db(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    if database_url.contains(":memory:") {
        return init_memory_db().await;
    }

    let connect_options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options)
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;

    tracing::info!("Database initialized with WAL mode enabled");

    Ok(pool)
}

/// Single-connection in-memory database with the full schema, for tests
/// and throwaway runs. The connection is never recycled, since closing it
/// drops the data.
pub async fn init_memory_db() -> Result<SqlitePool, sqlx::Error> {
    let connect_options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(connect_options)
        .await?;

    run_migrations(&pool).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn journal_mode(pool: &SqlitePool) -> Result<String, sqlx::Error> {
    let row = sqlx::query("PRAGMA journal_mode")
        .fetch_one(pool)
        .await?;

    Ok(row.get::<String, _>(0))
}

/// Row counts of the main tables, used by the `teamflow-check-db` tool.
pub async fn table_counts(pool: &SqlitePool) -> Result<Vec<(&'static str, i64)>, sqlx::Error> {
    const TABLES: [&str; 6] = ["users", "organizations", "memberships", "boards", "lists", "cards"];

    let mut counts = Vec::with_capacity(TABLES.len());
    for table in TABLES {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(pool)
            .await?;
        counts.push((table, count));
    }

    Ok(counts)
}
