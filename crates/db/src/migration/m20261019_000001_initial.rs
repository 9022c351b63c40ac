//! Initial schema for the shop and currency tables.
//!
//! Balances, stock and quantities are guarded by CHECK constraints; the
//! ledger is insert-only, enforced by trigger.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(ENUMS_SQL).await?;

        db.execute_unprepared(ACCOUNTS_SQL).await?;
        db.execute_unprepared(CATALOG_ITEMS_SQL).await?;
        db.execute_unprepared(OWNERSHIP_SQL).await?;
        db.execute_unprepared(LEDGER_ENTRIES_SQL).await?;

        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE ledger_entry_kind AS ENUM ('purchase', 'admin_credit', 'admin_debit');
";

const ACCOUNTS_SQL: &str = r"
-- Rows are created by the registration service; this schema only owns the balance.
CREATE TABLE accounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    display_name VARCHAR(255) NOT NULL,
    balance BIGINT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_accounts_balance_non_negative CHECK (balance >= 0)
);
";

const CATALOG_ITEMS_SQL: &str = r"
CREATE TABLE catalog_items (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    image_base64 TEXT NOT NULL DEFAULT '',
    price BIGINT NOT NULL,
    stock INTEGER NOT NULL DEFAULT 0,
    item_type VARCHAR(50) NOT NULL DEFAULT 'marker',
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    deleted_at TIMESTAMPTZ,

    CONSTRAINT chk_catalog_items_price_non_negative CHECK (price >= 0),
    CONSTRAINT chk_catalog_items_stock_non_negative CHECK (stock >= 0)
);

CREATE INDEX idx_catalog_items_listing
    ON catalog_items(created_at DESC)
    WHERE deleted_at IS NULL;
CREATE INDEX idx_catalog_items_type ON catalog_items(item_type) WHERE deleted_at IS NULL;
";

const OWNERSHIP_SQL: &str = r"
CREATE TABLE ownership (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    account_id UUID NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
    item_id UUID NOT NULL REFERENCES catalog_items(id),
    quantity INTEGER NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT uq_ownership_account_item UNIQUE (account_id, item_id),
    CONSTRAINT chk_ownership_quantity_positive CHECK (quantity >= 1)
);

CREATE INDEX idx_ownership_account ON ownership(account_id, created_at DESC);
";

const LEDGER_ENTRIES_SQL: &str = r"
CREATE TABLE ledger_entries (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    sequence BIGSERIAL NOT NULL UNIQUE,
    account_id UUID NOT NULL REFERENCES accounts(id),
    actor_id UUID REFERENCES accounts(id),
    kind ledger_entry_kind NOT NULL,
    amount BIGINT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    -- Purchases debit (a free item debits 0); admin entries move a non-zero amount
    CONSTRAINT chk_ledger_purchase_sign CHECK (kind <> 'purchase' OR amount <= 0),
    CONSTRAINT chk_ledger_credit_sign CHECK (kind <> 'admin_credit' OR amount > 0),
    CONSTRAINT chk_ledger_debit_sign CHECK (kind <> 'admin_debit' OR amount < 0),
    CONSTRAINT chk_ledger_admin_has_actor CHECK (kind = 'purchase' OR actor_id IS NOT NULL)
);

CREATE INDEX idx_ledger_entries_account_order
    ON ledger_entries(account_id, created_at DESC, sequence DESC);
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- FUNCTION: prevent_ledger_modification
-- Ledger entries are write-once
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_ledger_modification()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'ledger_entries is append-only: % not allowed', TG_OP;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_ledger_entries_immutable
BEFORE UPDATE OR DELETE ON ledger_entries
FOR EACH ROW
EXECUTE FUNCTION prevent_ledger_modification();

-- ============================================================
-- FUNCTION: touch_updated_at
-- ============================================================
CREATE OR REPLACE FUNCTION touch_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_accounts_updated_at
BEFORE UPDATE ON accounts
FOR EACH ROW EXECUTE FUNCTION touch_updated_at();

CREATE TRIGGER trg_catalog_items_updated_at
BEFORE UPDATE ON catalog_items
FOR EACH ROW EXECUTE FUNCTION touch_updated_at();

CREATE TRIGGER trg_ownership_updated_at
BEFORE UPDATE ON ownership
FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS ledger_entries CASCADE;
DROP TABLE IF EXISTS ownership CASCADE;
DROP TABLE IF EXISTS catalog_items CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;

DROP FUNCTION IF EXISTS prevent_ledger_modification() CASCADE;
DROP FUNCTION IF EXISTS touch_updated_at() CASCADE;

DROP TYPE IF EXISTS ledger_entry_kind;
";
