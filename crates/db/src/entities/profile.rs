//! Profile entity.
//!
//! The social identity wrapping a user. Created atomically with its user and
//! destroyed with it (cascade).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "profile")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub user_id: String,

    /// Display name
    #[sea_orm(default_value = "")]
    pub name: String,

    #[sea_orm(column_type = "Text", default_value = "")]
    pub bio: String,

    /// Avatar URL (upload handling is a collaborator concern)
    #[sea_orm(nullable)]
    pub avatar_url: Option<String>,

    /// Accumulated moderation strikes
    #[sea_orm(default_value = 0)]
    pub strike_count: i32,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
