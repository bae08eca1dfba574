//! `SeaORM` Entity for account_thirds table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "account_thirds")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub third_id: Uuid,
    pub code: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::thirds::Entity",
        from = "Column::ThirdId",
        to = "super::thirds::Column::Id"
    )]
    Thirds,
}

impl Related<super::thirds::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Thirds.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
