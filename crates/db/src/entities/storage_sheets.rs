//! `SeaORM` Entity for storage_sheets table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "storage_sheets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub sheet_type: i16,
    pub date: Date,
    pub storagearea_id: Uuid,
    pub comment: String,
    pub status: i16,
    pub provider_id: Option<Uuid>,
    pub bill_reference: String,
    pub bill_date: Option<Date>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::storage_details::Entity")]
    StorageDetails,
}

impl Related<super::storage_details::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StorageDetails.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
