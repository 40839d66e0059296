//! Till ledger service.
//!
//! Enforces the per-day state machine `NoSession -> Open -> Closed` over an
//! injected [`MovementStore`]. The service keeps no state between calls.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

use super::balance::signed_sum;
use super::error::LedgerError;
use super::store::{LockScope, MovementStore, StoreSession};
use super::types::{
    ClosingReport, DateSelection, DayState, Movement, MovementKind, MovementQuery, NewMovement,
    TillStatus,
};
use super::validation::{
    validate_cash_flow, validate_movement_amount, validate_note, validate_opening_amount,
    validate_running_balance,
};

/// Note attached to every opening movement.
pub const OPENING_NOTE: &str = "Day open";

/// Note attached to every closing summary.
pub const CLOSING_NOTE: &str = "Day close";

/// Till ledger over a movement store.
#[derive(Debug)]
pub struct LedgerService<S: MovementStore> {
    store: Arc<S>,
}

impl<S: MovementStore> Clone for LedgerService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: MovementStore> LedgerService<S> {
    /// Creates a new ledger service.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Opens `date` with `initial_amount` in the register.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the amount is not positive.
    /// Returns a conflict if the date already has an opening or an earlier
    /// date is still open.
    pub async fn open(
        &self,
        date: NaiveDate,
        initial_amount: Decimal,
        actor: Option<Uuid>,
    ) -> Result<Movement, LedgerError> {
        validate_opening_amount(initial_amount)?;

        let mut session = self.store.begin(LockScope::Opening(date)).await?;

        let day = session.movements_on(date).await?;
        match DayState::of(&day) {
            DayState::NoSession => {}
            DayState::Open => return Err(LedgerError::DayAlreadyOpen(date)),
            DayState::Closed => return Err(LedgerError::DayAlreadyClosed(date)),
        }

        if let Some(&open_date) = session.open_dates_before(date).await?.first() {
            return Err(LedgerError::StaleDayOpen {
                open_date,
                requested: date,
            });
        }

        let opening = session
            .append(NewMovement {
                date,
                kind: MovementKind::Opening,
                amount: initial_amount,
                note: Some(OPENING_NOTE.to_string()),
                created_by: actor,
            })
            .await?;
        session.commit().await?;

        info!(
            date = %date,
            amount = %opening.amount,
            movement_id = opening.id,
            "Till opened"
        );
        Ok(opening)
    }

    /// Records an ingress or egress on an open day.
    ///
    /// # Errors
    ///
    /// Returns a validation error for other kinds, negative amounts or long notes.
    /// Returns `LedgerError::NoOpenSession` if the date is not open.
    /// Returns `LedgerError::BalanceOutOfRange` if the day's balance would
    /// leave the range a closing summary can store.
    pub async fn record(
        &self,
        date: NaiveDate,
        kind: MovementKind,
        amount: Decimal,
        note: Option<String>,
        actor: Option<Uuid>,
    ) -> Result<Movement, LedgerError> {
        validate_cash_flow(kind)?;
        validate_movement_amount(amount)?;
        validate_note(note.as_deref())?;

        let mut session = self.store.begin(LockScope::Day(date)).await?;

        let day = session.movements_on(date).await?;
        if DayState::of(&day) != DayState::Open {
            return Err(LedgerError::NoOpenSession(date));
        }
        validate_running_balance(signed_sum(&day) + kind.signed(amount))?;

        let movement = session
            .append(NewMovement {
                date,
                kind,
                amount,
                note,
                created_by: actor,
            })
            .await?;
        session.commit().await?;

        info!(
            date = %date,
            kind = %kind,
            amount = %movement.amount,
            movement_id = movement.id,
            "Till movement recorded"
        );
        Ok(movement)
    }

    /// Records the cash side of an invoiced sale.
    ///
    /// # Errors
    ///
    /// Same as [`LedgerService::record`], plus a validation error for a blank
    /// invoice number.
    pub async fn record_sale(
        &self,
        date: NaiveDate,
        invoice_number: &str,
        total: Decimal,
        actor: Option<Uuid>,
    ) -> Result<Movement, LedgerError> {
        let invoice_number = invoice_number.trim();
        if invoice_number.is_empty() {
            return Err(LedgerError::MissingInvoiceNumber);
        }

        self.record(
            date,
            MovementKind::Ingress,
            total,
            Some(format!("Invoice #{invoice_number}")),
            actor,
        )
        .await
    }

    /// Closes `date`, writing the closing summary and settling the opening
    /// in one store session.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::NoOpenSession` if the date is not open.
    pub async fn close(
        &self,
        date: NaiveDate,
        actor: Option<Uuid>,
    ) -> Result<ClosingReport, LedgerError> {
        let mut session = self.store.begin(LockScope::Day(date)).await?;

        let mut day = session.movements_on(date).await?;
        if DayState::of(&day) != DayState::Open {
            return Err(LedgerError::NoOpenSession(date));
        }
        let Some(opening_id) = day
            .iter()
            .find(|m| m.kind == MovementKind::Opening)
            .map(|m| m.id)
        else {
            return Err(LedgerError::NoOpenSession(date));
        };

        let final_balance = signed_sum(&day);

        let closing_movement = session
            .append(NewMovement {
                date,
                kind: MovementKind::ClosingSummary,
                amount: final_balance,
                note: Some(CLOSING_NOTE.to_string()),
                created_by: actor,
            })
            .await?;

        let settled_at = Utc::now();
        session.settle_opening(opening_id, settled_at).await?;
        session.commit().await?;

        for movement in &mut day {
            if movement.id == opening_id {
                movement.settled_at = Some(settled_at);
            }
        }
        day.push(closing_movement.clone());

        info!(
            date = %date,
            final_balance = %final_balance,
            movements = day.len(),
            "Till closed"
        );

        Ok(ClosingReport {
            closing_movement,
            final_balance,
            movements: day,
        })
    }

    /// Returns the till snapshot for `date`.
    ///
    /// A day without movements reports closed with a zero balance.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Store` if the store cannot be read.
    pub async fn status(&self, date: NaiveDate) -> Result<TillStatus, LedgerError> {
        let day = self.store.movements_between(date, date).await?;
        Ok(status_from_day(date, day))
    }

    /// Returns the status of the oldest day still open on or before `today`,
    /// or today's status when none is open.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Store` if the store cannot be read.
    pub async fn current_status(&self, today: NaiveDate) -> Result<TillStatus, LedgerError> {
        let open_dates = self.store.open_dates_through(today).await?;
        let date = open_dates.first().copied().unwrap_or(today);
        if date != today {
            debug!(open_date = %date, today = %today, "Reporting a day left open");
        }
        self.status(date).await
    }

    /// Returns the full audit trail for a day or an inclusive range.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidDateRange` if the range is reversed.
    pub async fn query(&self, selection: DateSelection) -> Result<MovementQuery, LedgerError> {
        let (start, end) = selection.bounds()?;
        let movements = self.store.movements_between(start, end).await?;
        let balance = signed_sum(&movements);
        Ok(MovementQuery { movements, balance })
    }

    /// Fetches a single movement.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::MovementNotFound` if no movement has this id.
    pub async fn movement(&self, id: i64) -> Result<Movement, LedgerError> {
        self.store
            .find_movement(id)
            .await?
            .ok_or(LedgerError::MovementNotFound(id))
    }
}

fn status_from_day(date: NaiveDate, day: Vec<Movement>) -> TillStatus {
    match DayState::of(&day) {
        DayState::NoSession => TillStatus::empty(date),
        DayState::Open => {
            let balance = signed_sum(&day);
            let opening = day
                .iter()
                .find(|m| m.kind == MovementKind::Opening)
                .cloned();
            TillStatus {
                date,
                is_open: true,
                balance,
                opening,
                movements: day,
            }
        }
        DayState::Closed => {
            let balance = day
                .iter()
                .find(|m| m.kind == MovementKind::ClosingSummary)
                .map_or(Decimal::ZERO, |m| m.amount);
            let movements = day
                .into_iter()
                .filter(|m| m.kind != MovementKind::ClosingSummary && !m.is_settled_opening())
                .collect();
            TillStatus {
                date,
                is_open: false,
                balance,
                opening: None,
                movements,
            }
        }
    }
}
