//! `SeaORM` Entity for storage_details table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "storage_details")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub storagesheet_id: Uuid,
    pub article_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((18, 4)))")]
    pub price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((18, 4)))")]
    pub quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((18, 4)))", nullable)]
    pub value: Option<Decimal>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::storage_sheets::Entity",
        from = "Column::StoragesheetId",
        to = "super::storage_sheets::Column::Id"
    )]
    StorageSheets,
}

impl Related<super::storage_sheets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StorageSheets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
