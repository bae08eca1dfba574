//! `SeaORM` Entity for bills table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "bills")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub bill_type: i16,
    pub num: Option<i32>,
    pub num_txt: Option<String>,
    pub fiscal_year_id: Option<Uuid>,
    pub date: Date,
    pub third_id: Option<Uuid>,
    pub comment: String,
    pub status: i16,
    pub entry_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
    pub cost_accounting_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::details::Entity")]
    Details,
    #[sea_orm(has_many = "super::payoffs::Entity")]
    Payoffs,
}

impl Related<super::details::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Details.def()
    }
}

impl Related<super::payoffs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payoffs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
