//! Movement store port.
//!
//! The database crate implements these traits. The in-memory store behind the
//! `test-util` feature implements them for tests.

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};

use super::error::LedgerError;
use super::types::{Movement, NewMovement};

/// What a write session must hold exclusively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockScope {
    /// Record and close: excludes other writers on the same date.
    Day(NaiveDate),
    /// Open: excludes other openers anywhere in the ledger, then the date.
    ///
    /// Holding the ledger-wide part keeps the earlier-day check stable
    /// until the opening commits.
    Opening(NaiveDate),
}

impl LockScope {
    /// The business day the session writes to.
    #[must_use]
    pub const fn date(self) -> NaiveDate {
        match self {
            Self::Day(date) | Self::Opening(date) => date,
        }
    }
}

/// A write session over the store.
///
/// Writes become visible to others only on [`StoreSession::commit`].
/// Dropping a session without committing discards them.
pub trait StoreSession: Send {
    /// All movements of `date` ordered by id, including this session's writes.
    fn movements_on(
        &mut self,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<Movement>, LedgerError>> + Send;

    /// Dates strictly before `date` that have an unsettled opening, ascending.
    fn open_dates_before(
        &mut self,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<NaiveDate>, LedgerError>> + Send;

    /// Appends a movement, assigning its id and audit timestamp.
    fn append(
        &mut self,
        movement: NewMovement,
    ) -> impl Future<Output = Result<Movement, LedgerError>> + Send;

    /// Marks the opening `opening_id` as settled at `at`.
    ///
    /// Fails with `LedgerError::ConcurrentModification` if it is already settled.
    fn settle_opening(
        &mut self,
        opening_id: i64,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;

    /// Makes every write of the session durable at once.
    fn commit(self) -> impl Future<Output = Result<(), LedgerError>> + Send;
}

/// Persistence for till movements.
pub trait MovementStore: Send + Sync {
    /// Session type returned by [`MovementStore::begin`].
    type Session: StoreSession;

    /// Starts a write session holding the locks `scope` requires.
    fn begin(
        &self,
        scope: LockScope,
    ) -> impl Future<Output = Result<Self::Session, LedgerError>> + Send;

    /// Movements dated within `start..=end`, ordered by date then id.
    fn movements_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Future<Output = Result<Vec<Movement>, LedgerError>> + Send;

    /// Dates on or before `date` with an unsettled opening, ascending.
    fn open_dates_through(
        &self,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<NaiveDate>, LedgerError>> + Send;

    /// Finds a movement by id.
    fn find_movement(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<Movement>, LedgerError>> + Send;
}
