//! Database migration runner for ParkDesk.
//!
//! Reads the `database` section of the server configuration.
//!
//! Usage:
//!   migrator [up]    - Run all pending migrations
//!   migrator down    - Rollback last migration
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop all tables and re-run migrations

use anyhow::bail;
use sea_orm_migration::MigratorTrait;
use tracing::info;

use parkdesk_db::{PoolOptions, connect, migration::Migrator};
use parkdesk_shared::DatabaseConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sea_orm_migration=info".into()),
        )
        .init();

    let command = std::env::args().nth(1).unwrap_or_else(|| "up".to_string());

    let database = DatabaseConfig::load()?;
    let db = connect(
        &database.url,
        PoolOptions {
            max_connections: 1,
            min_connections: 1,
        },
    )
    .await?;

    match command.as_str() {
        "up" => Migrator::up(&db, None).await?,
        "down" => Migrator::down(&db, Some(1)).await?,
        "status" => Migrator::status(&db).await?,
        "fresh" => Migrator::fresh(&db).await?,
        other => bail!("unknown command `{other}`, expected up, down, status or fresh"),
    }

    info!(command = %command, "Migration command finished");
    Ok(())
}
