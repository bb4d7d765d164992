//! Course entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "course")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Unique together with `university_id`.
    pub name: String,

    /// e.g. "Undergraduate", shown next to posts made by students of this course
    pub student_type: String,

    pub university_id: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::university::Entity",
        from = "Column::UniversityId",
        to = "super::university::Column::Id",
        on_delete = "Restrict"
    )]
    University,
}

impl Related<super::university::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::University.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        super::user_enrolled_course::Relation::User.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::user_enrolled_course::Relation::Course.def().rev())
    }
}

impl Related<super::module::Entity> for Entity {
    fn to() -> RelationDef {
        super::module_course::Relation::Module.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::module_course::Relation::Course.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
