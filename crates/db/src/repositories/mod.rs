//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod till;

pub use till::{TILL_LOCK_CLASS, TillRepository, TillSession};
