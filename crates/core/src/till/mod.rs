//! Cash-register day ledger.
//!
//! This module implements the till:
//! - Movement types and the per-day state machine
//! - Balance calculation in exact decimal
//! - Input validation
//! - The movement store port, plus an in-memory store for tests (`test-util`)
//! - The ledger service (open, record, close, status, query)

pub mod balance;
pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod service;
pub mod store;
pub mod types;
pub mod validation;

#[cfg(test)]
mod service_props;
#[cfg(test)]
mod tests;

pub use balance::{TillBalance, signed_sum};
pub use error::{ErrorCategory, LedgerError};
#[cfg(any(test, feature = "test-util"))]
pub use memory::{MemoryMovementStore, MemorySession};
pub use service::{CLOSING_NOTE, LedgerService, OPENING_NOTE};
pub use store::{LockScope, MovementStore, StoreSession};
pub use types::{
    ClosingReport, DateSelection, DayState, Movement, MovementKind, MovementQuery, NewMovement,
    TillStatus, UnknownMovementKind,
};
pub use validation::{MAX_AMOUNT, MAX_NOTE_LEN};
