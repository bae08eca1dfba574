//! `SeaORM` Entity for model_lines table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "model_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub model_entry_id: Uuid,
    pub position: i32,
    pub account_code: String,
    #[sea_orm(column_type = "Decimal(Some((18, 4)))")]
    pub amount: Decimal,
    pub third_id: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::model_entries::Entity",
        from = "Column::ModelEntryId",
        to = "super::model_entries::Column::Id"
    )]
    ModelEntries,
}

impl Related<super::model_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ModelEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
