//! Re-exports of all entities.

pub use super::till_movements::Entity as TillMovements;
