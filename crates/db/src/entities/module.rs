//! Module entity (a taught unit that posts are written about).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "module")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub name: String,

    /// Reference code, e.g. "06-30175"
    #[sea_orm(unique)]
    pub code: String,

    pub year_started: Date,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::post::Entity")]
    Posts,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Posts.def()
    }
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        super::module_course::Relation::Course.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::module_course::Relation::Module.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
