//! `SeaORM` Entity for entries table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub year_id: Uuid,
    pub journal_id: i32,
    pub num: Option<i32>,
    pub date_entry: Option<Date>,
    pub date_value: Date,
    pub designation: String,
    pub close: bool,
    pub link_id: Option<Uuid>,
    pub costaccounting_id: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::fiscal_years::Entity",
        from = "Column::YearId",
        to = "super::fiscal_years::Column::Id"
    )]
    FiscalYears,
    #[sea_orm(has_many = "super::entry_lines::Entity")]
    EntryLines,
}

impl Related<super::fiscal_years::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FiscalYears.def()
    }
}

impl Related<super::entry_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EntryLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
