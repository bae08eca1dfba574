//! `SeaORM` Entity for inventory_details table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_details")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub inventorysheet_id: Uuid,
    pub article_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((18, 4)))", nullable)]
    pub quantity: Option<Decimal>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::inventory_sheets::Entity",
        from = "Column::InventorysheetId",
        to = "super::inventory_sheets::Column::Id"
    )]
    InventorySheets,
}

impl Related<super::inventory_sheets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventorySheets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
