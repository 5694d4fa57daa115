//! Label entity.
//!
//! Unified reference table for the story classification vocabularies: genres,
//! content warnings, fandoms, and free-form tags. One table with a kind
//! discriminant instead of four identical ones.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Label vocabulary discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum LabelKind {
    #[sea_orm(string_value = "genre")]
    Genre,
    #[sea_orm(string_value = "warning")]
    Warning,
    #[sea_orm(string_value = "fandom")]
    Fandom,
    #[sea_orm(string_value = "tag")]
    Tag,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "label")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub kind: LabelKind,

    /// Unique within a kind
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::story_label::Entity")]
    Stories,
}

impl Related<super::story_label::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Stories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
