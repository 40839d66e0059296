//! Till repository backed by PostgreSQL.
//!
//! Every write session is one database transaction. Writers on the same
//! business day serialize on a transaction-scoped advisory lock; openers
//! additionally take a ledger-wide lock first, so the earlier-day check
//! cannot race another opening. Locks are released on commit or rollback.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbBackend, DbErr, EntityTrait, NotSet, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
    Statement, TransactionTrait,
};
use tracing::debug;

use parkdesk_core::till::{LedgerError, LockScope, Movement, MovementStore, NewMovement, StoreSession};

use crate::entities::{sea_orm_active_enums::TillMovementKind, till_movements};

/// Advisory lock namespace for till locks (first key of the two-key form).
pub const TILL_LOCK_CLASS: i32 = 0x7411;

/// Second key of the ledger-wide opening lock. Day keys start at 1.
const LEDGER_LOCK_KEY: i32 = 0;

/// Maps a database error onto the ledger taxonomy.
///
/// Unique violations mean another writer won a race the locks should have
/// prevented; they surface as a conflict rather than an internal error.
fn store_error(err: DbErr) -> LedgerError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            debug!(detail = %detail, "Unique violation on till_movements");
            LedgerError::ConcurrentModification
        }
        _ => LedgerError::Store(err.to_string()),
    }
}

/// Advisory lock key of a business day.
fn day_key(date: NaiveDate) -> i32 {
    date.num_days_from_ce()
}

/// Till repository over a connection pool.
#[derive(Debug, Clone)]
pub struct TillRepository {
    db: DatabaseConnection,
}

impl TillRepository {
    /// Creates a new till repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Write session holding an open transaction and its advisory locks.
///
/// Dropping it without [`StoreSession::commit`] rolls the transaction back.
pub struct TillSession {
    txn: DatabaseTransaction,
}

impl TillSession {
    async fn lock(&self, key: i32) -> Result<(), DbErr> {
        self.txn
            .execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                "SELECT pg_advisory_xact_lock($1, $2)",
                [TILL_LOCK_CLASS.into(), key.into()],
            ))
            .await?;
        Ok(())
    }
}

impl StoreSession for TillSession {
    async fn movements_on(&mut self, date: NaiveDate) -> Result<Vec<Movement>, LedgerError> {
        let rows = till_movements::Entity::find()
            .filter(till_movements::Column::BusinessDate.eq(date))
            .order_by_asc(till_movements::Column::Id)
            .all(&self.txn)
            .await
            .map_err(store_error)?;

        Ok(rows.into_iter().map(Movement::from).collect())
    }

    async fn open_dates_before(&mut self, date: NaiveDate) -> Result<Vec<NaiveDate>, LedgerError> {
        till_movements::Entity::find()
            .select_only()
            .column(till_movements::Column::BusinessDate)
            .filter(till_movements::Column::Kind.eq(TillMovementKind::Opening))
            .filter(till_movements::Column::SettledAt.is_null())
            .filter(till_movements::Column::BusinessDate.lt(date))
            .distinct()
            .order_by_asc(till_movements::Column::BusinessDate)
            .into_tuple::<NaiveDate>()
            .all(&self.txn)
            .await
            .map_err(store_error)
    }

    async fn append(&mut self, movement: NewMovement) -> Result<Movement, LedgerError> {
        let row = till_movements::ActiveModel {
            id: NotSet,
            business_date: Set(movement.date),
            kind: Set(movement.kind.into()),
            amount: Set(movement.amount),
            note: Set(movement.note),
            settled_at: Set(None),
            created_by: Set(movement.created_by),
            created_at: Set(Utc::now().into()),
        };

        let inserted = row.insert(&self.txn).await.map_err(store_error)?;
        Ok(inserted.into())
    }

    async fn settle_opening(
        &mut self,
        opening_id: i64,
        at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let result = till_movements::Entity::update_many()
            .col_expr(till_movements::Column::SettledAt, Expr::value(at))
            .filter(till_movements::Column::Id.eq(opening_id))
            .filter(till_movements::Column::Kind.eq(TillMovementKind::Opening))
            .filter(till_movements::Column::SettledAt.is_null())
            .exec(&self.txn)
            .await
            .map_err(store_error)?;

        if result.rows_affected == 1 {
            Ok(())
        } else {
            Err(LedgerError::ConcurrentModification)
        }
    }

    async fn commit(self) -> Result<(), LedgerError> {
        self.txn.commit().await.map_err(store_error)
    }
}

impl MovementStore for TillRepository {
    type Session = TillSession;

    async fn begin(&self, scope: LockScope) -> Result<TillSession, LedgerError> {
        let txn = self.db.begin().await.map_err(store_error)?;
        let session = TillSession { txn };

        // Always ledger before day, so two sessions never wait on each other in reverse.
        if let LockScope::Opening(_) = scope {
            session.lock(LEDGER_LOCK_KEY).await.map_err(store_error)?;
        }
        let date = scope.date();
        session.lock(day_key(date)).await.map_err(store_error)?;
        debug!(date = %date, scope = ?scope, "Till locks acquired");

        Ok(session)
    }

    async fn movements_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Movement>, LedgerError> {
        let rows = till_movements::Entity::find()
            .filter(till_movements::Column::BusinessDate.between(start, end))
            .order_by_asc(till_movements::Column::BusinessDate)
            .order_by_asc(till_movements::Column::Id)
            .all(&self.db)
            .await
            .map_err(store_error)?;

        Ok(rows.into_iter().map(Movement::from).collect())
    }

    async fn open_dates_through(&self, date: NaiveDate) -> Result<Vec<NaiveDate>, LedgerError> {
        till_movements::Entity::find()
            .select_only()
            .column(till_movements::Column::BusinessDate)
            .filter(till_movements::Column::Kind.eq(TillMovementKind::Opening))
            .filter(till_movements::Column::SettledAt.is_null())
            .filter(till_movements::Column::BusinessDate.lte(date))
            .distinct()
            .order_by_asc(till_movements::Column::BusinessDate)
            .into_tuple::<NaiveDate>()
            .all(&self.db)
            .await
            .map_err(store_error)
    }

    async fn find_movement(&self, id: i64) -> Result<Option<Movement>, LedgerError> {
        let row = till_movements::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(store_error)?;

        Ok(row.map(Movement::from))
    }
}
