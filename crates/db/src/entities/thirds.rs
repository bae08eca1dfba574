//! `SeaORM` Entity for thirds table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "thirds")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub contact: String,
    pub status: i16,
    #[sea_orm(column_type = "JsonBinary")]
    pub custom_fields: Json,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::account_thirds::Entity")]
    AccountThirds,
}

impl Related<super::account_thirds::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccountThirds.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
