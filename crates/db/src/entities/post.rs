//! Post entity (a user's rating and review of a module).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lowest star rating.
pub const MIN_RATING: i16 = 1;
/// Highest star rating.
pub const MAX_RATING: i16 = 5;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "post")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Protected: a module with posts cannot be deleted
    pub module_id: String,

    /// The author; posts are removed with their author
    pub user_id: String,

    pub overall_rating: i16,

    #[sea_orm(nullable)]
    pub difficulty_rating: Option<i16>,

    #[sea_orm(nullable)]
    pub assessment_rating: Option<i16>,

    #[sea_orm(nullable)]
    pub teaching_rating: Option<i16>,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    /// First calendar year of the academic year the module was taken in
    pub academic_year_start: i16,

    /// Moderation flag, hidden posts are only shown to staff
    #[sea_orm(default_value = false)]
    pub hidden: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::module::Entity",
        from = "Column::ModuleId",
        to = "super::module::Column::Id",
        on_delete = "Restrict"
    )]
    Module,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,

    #[sea_orm(has_many = "super::report::Entity")]
    Reports,
}

impl Related<super::module::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Module.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reports.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
