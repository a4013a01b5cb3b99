//! Pre-charged jobs and their settlement state.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(JOBS_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS credit_jobs CASCADE;
             DROP TYPE IF EXISTS job_status;
             DROP TYPE IF EXISTS job_kind;",
        )
        .await?;
        Ok(())
    }
}

const JOBS_SQL: &str = r"
CREATE TYPE job_kind AS ENUM ('text_generation', 'image_generation');

CREATE TYPE job_status AS ENUM ('pending', 'succeeded', 'failed');

CREATE TABLE credit_jobs (
    id UUID PRIMARY KEY,
    account_id UUID NOT NULL REFERENCES credit_accounts(id) ON DELETE CASCADE,
    kind job_kind NOT NULL,
    status job_status NOT NULL DEFAULT 'pending',
    precharge_total BIGINT NOT NULL,
    precharge_promo BIGINT NOT NULL,
    precharge_purchased BIGINT NOT NULL,
    precharge_entry_id UUID NOT NULL,
    settled BOOLEAN NOT NULL DEFAULT FALSE,
    actual_cost BIGINT,
    shortfall BIGINT,
    settlement_entry_id UUID,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    settled_at TIMESTAMPTZ,
    CONSTRAINT chk_precharge_split
        CHECK (precharge_total = precharge_promo + precharge_purchased),
    CONSTRAINT chk_precharge_non_negative
        CHECK (precharge_promo >= 0 AND precharge_purchased >= 0),
    CONSTRAINT chk_settled_is_terminal
        CHECK (NOT settled OR status IN ('succeeded', 'failed'))
);

CREATE INDEX idx_credit_jobs_account ON credit_jobs(account_id, created_at DESC);

-- Pending jobs awaiting settlement
CREATE INDEX idx_credit_jobs_pending ON credit_jobs(created_at) WHERE NOT settled;
";
