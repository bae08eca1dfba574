//! `SeaORM` Entity for model_entries table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "model_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub journal_id: i32,
    pub designation: String,
    pub costaccounting_id: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::model_lines::Entity")]
    ModelLines,
}

impl Related<super::model_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ModelLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
