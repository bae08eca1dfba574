//! `SeaORM` Entity for automatic_reduces table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "automatic_reduces")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub category_id: Uuid,
    pub mode: i16,
    #[sea_orm(column_type = "Decimal(Some((18, 4)))")]
    pub amount: Decimal,
    pub occurency: i32,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub criteria: Option<Json>,
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
