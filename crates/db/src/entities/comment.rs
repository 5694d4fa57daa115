//! Comment entity.
//!
//! Variant payload of a post row. `post_id` is the post being commented on;
//! `parent_id` forms the reply tree, traversed by key lookups rather than an
//! in-memory object graph.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comment")]
pub struct Model {
    /// Same id as the owning post row
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The post (story or comment) this comment is attached to
    pub post_id: String,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    /// NULL = top-level comment, Some = reply to another comment
    #[sea_orm(nullable)]
    pub parent_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::post::Entity",
        from = "Column::Id",
        to = "super::post::Column::Id",
        on_delete = "Cascade"
    )]
    OwnPost,

    #[sea_orm(
        belongs_to = "super::post::Entity",
        from = "Column::PostId",
        to = "super::post::Column::Id",
        on_delete = "Cascade"
    )]
    CommentedPost,

    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id",
        on_delete = "Cascade"
    )]
    Parent,
}

impl ActiveModelBehavior for ActiveModel {}
