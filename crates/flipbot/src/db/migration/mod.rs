use sea_orm::DatabaseConnection;
pub use sea_orm_migration::prelude::*;

use flipbot_common::error::Result;

mod m20250301_000001_create_flip;
mod m20250301_000002_create_user_profit;
mod m20250301_000003_create_guild_settings;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_flip::Migration),
            Box::new(m20250301_000002_create_user_profit::Migration),
            Box::new(m20250301_000003_create_guild_settings::Migration),
        ]
    }
}

pub async fn migrate(db: &DatabaseConnection) -> Result<()> {
    Migrator::up(db, None).await?;
    Ok(())
}
