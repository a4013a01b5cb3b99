//! Webhook idempotency records and platform settings.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(WEBHOOKS_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS platform_settings CASCADE;
             DROP TABLE IF EXISTS webhook_events CASCADE;
             DROP TYPE IF EXISTS webhook_outcome;",
        )
        .await?;
        Ok(())
    }
}

const WEBHOOKS_SQL: &str = r"
CREATE TYPE webhook_outcome AS ENUM ('applied', 'skipped', 'error');

CREATE TABLE webhook_events (
    id UUID PRIMARY KEY,
    event_type VARCHAR(64) NOT NULL,
    provider_event_id VARCHAR(128) NOT NULL,
    account_id UUID,
    outcome webhook_outcome NOT NULL,
    detail TEXT,
    applied_entry_id UUID,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    -- Exactly-once: a replayed delivery fails this constraint and is ignored
    CONSTRAINT uq_webhook_events_event UNIQUE (event_type, provider_event_id)
);

CREATE TABLE platform_settings (
    key VARCHAR(64) PRIMARY KEY,
    value JSONB NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";
