//! In-memory movement store.
//!
//! Sessions serialize on a single async mutex, so every write session is
//! exclusive for the whole ledger. Staged writes are applied on commit and
//! dropped otherwise.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::error::LedgerError;
use super::store::{LockScope, MovementStore, StoreSession};
use super::types::{Movement, MovementKind, NewMovement};
use super::validation::MAX_AMOUNT;

#[derive(Debug, Default)]
struct MemoryState {
    movements: Vec<Movement>,
    last_id: i64,
}

fn unsettled_opening_dates(
    movements: &[Movement],
    keep: impl Fn(NaiveDate) -> bool,
) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = movements
        .iter()
        .filter(|m| m.kind == MovementKind::Opening && m.settled_at.is_none())
        .map(|m| m.date)
        .filter(|d| keep(*d))
        .collect();
    dates.sort_unstable();
    dates.dedup();
    dates
}

/// Movement store kept in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryMovementStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryMovementStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Write session over a [`MemoryMovementStore`].
#[derive(Debug)]
pub struct MemorySession {
    state: OwnedMutexGuard<MemoryState>,
    staged: Vec<Movement>,
    settlements: Vec<(i64, DateTime<Utc>)>,
    last_id: i64,
}

impl MemorySession {
    /// Committed movements with this session's writes applied on top.
    fn view(&self) -> Vec<Movement> {
        self.state
            .movements
            .iter()
            .chain(self.staged.iter())
            .cloned()
            .map(|mut m| {
                if let Some((_, at)) = self.settlements.iter().find(|(id, _)| *id == m.id) {
                    m.settled_at = Some(*at);
                }
                m
            })
            .collect()
    }
}

impl StoreSession for MemorySession {
    async fn movements_on(&mut self, date: NaiveDate) -> Result<Vec<Movement>, LedgerError> {
        let mut day: Vec<Movement> = self
            .view()
            .into_iter()
            .filter(|m| m.date == date)
            .collect();
        day.sort_by_key(|m| m.id);
        Ok(day)
    }

    async fn open_dates_before(&mut self, date: NaiveDate) -> Result<Vec<NaiveDate>, LedgerError> {
        Ok(unsettled_opening_dates(&self.view(), |d| d < date))
    }

    async fn append(&mut self, movement: NewMovement) -> Result<Movement, LedgerError> {
        // Same range as the NUMERIC(12, 2) amount column.
        if movement.amount.abs() > MAX_AMOUNT {
            return Err(LedgerError::Store(format!(
                "numeric field overflow: {} does not fit the amount column",
                movement.amount
            )));
        }

        // Same guarantee as the one-opening/one-summary unique indexes.
        if matches!(
            movement.kind,
            MovementKind::Opening | MovementKind::ClosingSummary
        ) && self
            .view()
            .iter()
            .any(|m| m.date == movement.date && m.kind == movement.kind)
        {
            return Err(LedgerError::ConcurrentModification);
        }

        self.last_id += 1;
        let stored = Movement {
            id: self.last_id,
            date: movement.date,
            kind: movement.kind,
            amount: movement.amount,
            note: movement.note,
            settled_at: None,
            created_by: movement.created_by,
            created_at: Utc::now(),
        };
        self.staged.push(stored.clone());
        Ok(stored)
    }

    async fn settle_opening(
        &mut self,
        opening_id: i64,
        at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let view = self.view();
        let opening = view
            .iter()
            .find(|m| m.id == opening_id)
            .ok_or(LedgerError::MovementNotFound(opening_id))?;

        if opening.kind != MovementKind::Opening || opening.settled_at.is_some() {
            return Err(LedgerError::ConcurrentModification);
        }

        self.settlements.push((opening_id, at));
        Ok(())
    }

    async fn commit(self) -> Result<(), LedgerError> {
        let Self {
            mut state,
            staged,
            settlements,
            last_id,
        } = self;

        for (id, at) in settlements {
            if let Some(m) = state.movements.iter_mut().find(|m| m.id == id) {
                m.settled_at = Some(at);
            }
        }
        state.movements.extend(staged);
        state.last_id = last_id;
        Ok(())
    }
}

impl MovementStore for MemoryMovementStore {
    type Session = MemorySession;

    async fn begin(&self, _scope: LockScope) -> Result<MemorySession, LedgerError> {
        let state = Arc::clone(&self.state).lock_owned().await;
        let last_id = state.last_id;
        Ok(MemorySession {
            state,
            staged: Vec::new(),
            settlements: Vec::new(),
            last_id,
        })
    }

    async fn movements_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Movement>, LedgerError> {
        let state = self.state.lock().await;
        let mut movements: Vec<Movement> = state
            .movements
            .iter()
            .filter(|m| m.date >= start && m.date <= end)
            .cloned()
            .collect();
        movements.sort_by_key(|m| (m.date, m.id));
        Ok(movements)
    }

    async fn open_dates_through(&self, date: NaiveDate) -> Result<Vec<NaiveDate>, LedgerError> {
        let state = self.state.lock().await;
        Ok(unsettled_opening_dates(&state.movements, |d| d <= date))
    }

    async fn find_movement(&self, id: i64) -> Result<Option<Movement>, LedgerError> {
        let state = self.state.lock().await;
        Ok(state.movements.iter().find(|m| m.id == id).cloned())
    }
}
