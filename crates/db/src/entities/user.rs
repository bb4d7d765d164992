//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Login identifier; the domain part decides the user's university.
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2 PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Can log into the admin site; staff may have no university.
    #[sea_orm(default_value = false)]
    pub is_staff: bool,

    /// Always implies `is_staff`.
    #[sea_orm(default_value = false)]
    pub is_superuser: bool,

    /// Unset this instead of deleting accounts.
    #[sea_orm(default_value = true)]
    pub is_active: bool,

    #[sea_orm(nullable)]
    pub last_login: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::post::Entity")]
    MadePosts,

    #[sea_orm(has_many = "super::report::Entity")]
    MadeReports,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MadePosts.def()
    }
}

impl Related<super::report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MadeReports.def()
    }
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        super::user_enrolled_course::Relation::Course.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::user_enrolled_course::Relation::User.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
