//! Credit accounts and the append-only ledger.
//!
//! Creates the two-tier balance table and the entry log that every balance
//! change flows through.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(ACCOUNTS_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS credit_ledger_entries CASCADE;
             DROP TABLE IF EXISTS credit_accounts CASCADE;
             DROP TYPE IF EXISTS entry_reason;
             DROP TYPE IF EXISTS entry_kind;",
        )
        .await?;
        Ok(())
    }
}

const ACCOUNTS_SQL: &str = r"
CREATE TYPE entry_kind AS ENUM ('credit', 'debit');

CREATE TYPE entry_reason AS ENUM (
    'signup_grant',
    'purchase',
    'daily_checkin',
    'promotion',
    'pre_charge',
    'settlement_adjust',
    'refund',
    'admin_adjust'
);

-- One account per user, two non-negative balance tiers
CREATE TABLE credit_accounts (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL UNIQUE,
    promo_balance BIGINT NOT NULL DEFAULT 0,
    purchased_balance BIGINT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_promo_non_negative CHECK (promo_balance >= 0),
    CONSTRAINT chk_purchased_non_negative CHECK (purchased_balance >= 0)
);

-- Append-only: rows are never updated or deleted
CREATE TABLE credit_ledger_entries (
    id UUID PRIMARY KEY,
    account_id UUID NOT NULL REFERENCES credit_accounts(id) ON DELETE CASCADE,
    kind entry_kind NOT NULL,
    reason entry_reason NOT NULL,
    description TEXT NOT NULL,
    promo_delta BIGINT NOT NULL,
    purchased_delta BIGINT NOT NULL,
    promo_balance_after BIGINT NOT NULL,
    purchased_balance_after BIGINT NOT NULL,
    reference_id UUID,
    reference_type VARCHAR(32),
    actor_id UUID,
    metadata JSONB,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_balance_after_non_negative
        CHECK (promo_balance_after >= 0 AND purchased_balance_after >= 0),
    CONSTRAINT chk_delta_sign_matches_kind CHECK (
        (kind = 'credit' AND promo_delta >= 0 AND purchased_delta >= 0)
        OR (kind = 'debit' AND promo_delta <= 0 AND purchased_delta <= 0)
    )
);

-- History and audit replay both scan in (created_at, id) order
CREATE INDEX idx_ledger_entries_account
    ON credit_ledger_entries(account_id, created_at, id);

-- Lookup of entries written for a given job or webhook event
CREATE INDEX idx_ledger_entries_reference
    ON credit_ledger_entries(reference_id) WHERE reference_id IS NOT NULL;

-- Daily check-in cap queries filter by account, reason, and time
CREATE INDEX idx_ledger_entries_reason
    ON credit_ledger_entries(account_id, reason, created_at);
";
