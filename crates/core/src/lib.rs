//! Core business logic for ParkDesk.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! The database crate plugs in through the [`till::MovementStore`] port.
//!
//! # Modules
//!
//! - `till` - Cash-register day ledger: open, record, close, status and query

pub mod till;
