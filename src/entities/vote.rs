//! Append-only vote log entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "votes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub submitted_at: DateTimeWithTimeZone,
    #[sea_orm(column_type = "String(StringLen::N(128))")]
    pub voter: String,
    /// "favor" or "contra"
    #[sea_orm(column_type = "String(StringLen::N(16))")]
    pub category: String,
    /// "first", "second" or "third"
    #[sea_orm(column_type = "String(StringLen::N(16))")]
    pub rank: String,
    #[sea_orm(column_type = "String(StringLen::N(128))")]
    pub nominee: String,
    #[sea_orm(column_type = "Double")]
    pub points: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
