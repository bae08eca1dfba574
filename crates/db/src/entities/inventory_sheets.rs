//! `SeaORM` Entity for inventory_sheets table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_sheets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub date: Date,
    pub comment: String,
    pub storagearea_id: Uuid,
    pub status: i16,
    pub stockreceipt_id: Option<Uuid>,
    pub stockexit_id: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::inventory_details::Entity")]
    InventoryDetails,
}

impl Related<super::inventory_details::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryDetails.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
