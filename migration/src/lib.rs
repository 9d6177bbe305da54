pub use sea_orm_migration::prelude::*;

mod m20250601_000001_engagement_init;
mod m20250601_000002_badge_catalog;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_engagement_init::Migration),
            Box::new(m20250601_000002_badge_catalog::Migration),
        ]
    }
}
