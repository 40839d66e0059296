//! `SeaORM` Entity for till_movements table.

use chrono::Utc;
use parkdesk_core::till::Movement;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::TillMovementKind;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "till_movements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub business_date: Date,
    pub kind: TillMovementKind,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub amount: Decimal,
    pub note: Option<String>,
    pub settled_at: Option<DateTimeWithTimeZone>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Movement {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            date: model.business_date,
            kind: model.kind.into(),
            amount: model.amount,
            note: model.note,
            settled_at: model.settled_at.map(|at| at.with_timezone(&Utc)),
            created_by: model.created_by,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
