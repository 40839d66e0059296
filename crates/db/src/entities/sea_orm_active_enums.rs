//! `SeaORM` active enums mapped to Postgres enum types.

use parkdesk_core::till::MovementKind;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Postgres enum `till_movement_kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "till_movement_kind")]
#[serde(rename_all = "snake_case")]
pub enum TillMovementKind {
    /// Initial cash of the day.
    #[sea_orm(string_value = "opening")]
    Opening,
    /// Cash in.
    #[sea_orm(string_value = "ingress")]
    Ingress,
    /// Cash out.
    #[sea_orm(string_value = "egress")]
    Egress,
    /// Day close snapshot.
    #[sea_orm(string_value = "closing_summary")]
    ClosingSummary,
}

impl From<MovementKind> for TillMovementKind {
    fn from(kind: MovementKind) -> Self {
        match kind {
            MovementKind::Opening => Self::Opening,
            MovementKind::Ingress => Self::Ingress,
            MovementKind::Egress => Self::Egress,
            MovementKind::ClosingSummary => Self::ClosingSummary,
        }
    }
}

impl From<TillMovementKind> for MovementKind {
    fn from(kind: TillMovementKind) -> Self {
        match kind {
            TillMovementKind::Opening => Self::Opening,
            TillMovementKind::Ingress => Self::Ingress,
            TillMovementKind::Egress => Self::Egress,
            TillMovementKind::ClosingSummary => Self::ClosingSummary,
        }
    }
}
