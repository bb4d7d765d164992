//! Report entity (a user flagging a post for moderation).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Why a post was reported. Stored as a three letter code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(3))")]
pub enum ReportReason {
    #[sea_orm(string_value = "HAT")]
    Hate,
    #[sea_orm(string_value = "IDE")]
    IdentifyingInfo,
    #[sea_orm(string_value = "ANS")]
    AssignmentAnswers,
    #[sea_orm(string_value = "SPM")]
    Spam,
    #[sea_orm(string_value = "BUL")]
    Bullying,
    #[sea_orm(string_value = "FLS")]
    FalseInfo,
    #[sea_orm(string_value = "SEX")]
    Sexual,
}

impl ReportReason {
    /// Human-readable label shown to moderators.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Hate => "Hate Speech or Language",
            Self::IdentifyingInfo => "Identifying Information",
            Self::AssignmentAnswers => "Assignment Answers",
            Self::Spam => "SPAM",
            Self::Bullying => "Bullying or Harassment",
            Self::FalseInfo => "False Information",
            Self::Sexual => "Sexual Content",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "report")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub post_id: String,

    /// Never the author of the reported post.
    pub reporter_id: String,

    pub reason: ReportReason,

    /// An unsolved report hides its post from non-staff viewers.
    #[sea_orm(default_value = false)]
    pub is_solved: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::post::Entity",
        from = "Column::PostId",
        to = "super::post::Column::Id",
        on_delete = "Cascade"
    )]
    Post,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ReporterId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Reporter,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reporter.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
