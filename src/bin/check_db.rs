use teamflow_backend::config::Config;
use teamflow_backend::infrastructure::db;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    let pool = db::init_db(&config.database_url).await?;

    println!("Database: {}", config.database_url);

    for (table, count) in db::table_counts(&pool).await? {
        println!("  {:<14} {}", table, count);
    }

    println!("Journal mode: {}", db::journal_mode(&pool).await?);

    Ok(())
}
