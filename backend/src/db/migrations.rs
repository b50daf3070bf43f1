use anyhow::Result;
use sqlx::PgPool;

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    let migrator = sqlx::migrate!("./migrations");
    tracing::info!("Applying {} coachlink migrations", migrator.iter().count());
    migrator.run(pool).await?;
    Ok(())
}
