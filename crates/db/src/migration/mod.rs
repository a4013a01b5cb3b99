//! Database migrations.
//!
//! Migrations are managed using sea-orm-migration.

pub use sea_orm_migration::prelude::*;

mod m20260801_000001_credit_accounts;
mod m20260801_000002_credit_jobs;
mod m20260801_000003_webhooks_settings;

/// Migrator for running database migrations.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260801_000001_credit_accounts::Migration),
            Box::new(m20260801_000002_credit_jobs::Migration),
            Box::new(m20260801_000003_webhooks_settings::Migration),
        ]
    }
}
