use coachlink::db::{migrations::run_migrations, DatabaseConfig};
use coachlink::{get_db_pool, utils};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    utils::init_logging();

    let db_config = DatabaseConfig::from_env()?;
    let pool = get_db_pool(&db_config).await?;

    info!("🔧 Running coachlink schema migrations...");
    run_migrations(&pool).await?;

    let pending: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM requests WHERE status = 'PENDING'")
        .fetch_one(&pool)
        .await?;
    info!("✅ Migrations completed, {} pending requests on record", pending);

    Ok(())
}
