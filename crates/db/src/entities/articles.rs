//! `SeaORM` Entity for articles table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "articles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub reference: String,
    pub designation: String,
    #[sea_orm(column_type = "Decimal(Some((18, 4)))")]
    pub price: Decimal,
    pub unit: String,
    pub sell_account: String,
    pub vat_id: Option<Uuid>,
    pub stockable: i16,
    #[sea_orm(column_type = "JsonBinary")]
    pub category_ids: Json,
    pub is_disabled: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
