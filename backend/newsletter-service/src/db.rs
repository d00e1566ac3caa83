use anyhow::Context;
use db_pool::{create_pool as create_pg_pool, DbConfig};
use sqlx::migrate::Migrator;
use sqlx::PgPool;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Connect using the `DATABASE_*` environment and bring the schema up to date
pub async fn init_pool() -> anyhow::Result<PgPool> {
    let cfg = DbConfig::from_env("newsletter-service").map_err(anyhow::Error::msg)?;
    cfg.log_config();
    let pool = create_pg_pool(cfg)
        .await
        .context("failed to connect to PostgreSQL")?;
    MIGRATOR
        .run(&pool)
        .await
        .context("failed to run database migrations")?;
    Ok(pool)
}
