//! Till movements migration.
//!
//! Creates the append-only `till_movements` table, its movement-kind enum,
//! the one-opening/one-summary per day indexes and the immutability trigger.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: TABLE & INDEXES
        // ============================================================
        db.execute_unprepared(TILL_MOVEMENTS_SQL).await?;

        // ============================================================
        // PART 3: TRIGGERS & FUNCTIONS
        // ============================================================
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
CREATE TYPE till_movement_kind AS ENUM (
    'opening',
    'ingress',
    'egress',
    'closing_summary'
);
";

const TILL_MOVEMENTS_SQL: &str = r"
CREATE TABLE till_movements (
    id BIGSERIAL PRIMARY KEY,
    business_date DATE NOT NULL,
    kind till_movement_kind NOT NULL,
    amount NUMERIC(12, 2) NOT NULL,
    note VARCHAR(200),
    settled_at TIMESTAMPTZ,
    created_by UUID,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    -- Sign comes from the kind; only closing summaries may hold a negative balance
    CONSTRAINT chk_till_amount_non_negative CHECK (kind = 'closing_summary' OR amount >= 0),
    CONSTRAINT chk_till_opening_positive CHECK (kind <> 'opening' OR amount > 0),
    CONSTRAINT chk_till_settled_only_opening CHECK (settled_at IS NULL OR kind = 'opening')
);

-- One opening and one closing summary per business day
CREATE UNIQUE INDEX uq_till_opening_per_day ON till_movements(business_date)
    WHERE kind = 'opening';
CREATE UNIQUE INDEX uq_till_closing_per_day ON till_movements(business_date)
    WHERE kind = 'closing_summary';

-- Day listings ordered by insertion
CREATE INDEX idx_till_movements_day ON till_movements(business_date, id);

-- Carry-over guard lookup
CREATE INDEX idx_till_unsettled_openings ON till_movements(business_date)
    WHERE kind = 'opening' AND settled_at IS NULL;
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- FUNCTION: guard_till_movement_changes
-- Movements are append-only; the only allowed update settles an opening once
-- ============================================================
CREATE OR REPLACE FUNCTION guard_till_movement_changes()
RETURNS TRIGGER AS $$
BEGIN
    IF TG_OP = 'DELETE' THEN
        RAISE EXCEPTION 'Till movement % cannot be deleted', OLD.id;
    END IF;

    IF OLD.kind = 'opening'
        AND OLD.settled_at IS NULL
        AND NEW.settled_at IS NOT NULL
        AND NEW.id = OLD.id
        AND NEW.business_date = OLD.business_date
        AND NEW.kind = OLD.kind
        AND NEW.amount = OLD.amount
        AND NEW.note IS NOT DISTINCT FROM OLD.note
        AND NEW.created_by IS NOT DISTINCT FROM OLD.created_by
        AND NEW.created_at = OLD.created_at
    THEN
        RETURN NEW;
    END IF;

    RAISE EXCEPTION 'Till movement % is immutable', OLD.id;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_till_movements_append_only
BEFORE UPDATE OR DELETE ON till_movements
FOR EACH ROW
EXECUTE FUNCTION guard_till_movement_changes();
";

const DROP_ALL_SQL: &str = r"
DROP TRIGGER IF EXISTS trg_till_movements_append_only ON till_movements;
DROP FUNCTION IF EXISTS guard_till_movement_changes();
DROP TABLE IF EXISTS till_movements CASCADE;
DROP TYPE IF EXISTS till_movement_kind;
";
