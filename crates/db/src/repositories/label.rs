//! Label repository.

use std::sync::Arc;

use crate::entities::{
    label::{self, LabelKind},
    story_label, Label,
};
use fable_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait,
};

/// Label repository for database operations.
#[derive(Clone)]
pub struct LabelRepository {
    db: Arc<DatabaseConnection>,
}

impl LabelRepository {
    /// Create a new label repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// All labels of a kind, by name.
    pub async fn find_by_kind(&self, kind: LabelKind) -> AppResult<Vec<label::Model>> {
        Label::find()
            .filter(label::Column::Kind.eq(kind))
            .order_by_asc(label::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Labels attached to a story.
    pub async fn find_for_story(&self, story_id: &str) -> AppResult<Vec<label::Model>> {
        Label::find()
            .join(JoinType::InnerJoin, label::Relation::Stories.def())
            .filter(story_label::Column::StoryId.eq(story_id))
            .order_by_asc(label::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn fantasy() -> label::Model {
        label::Model {
            id: "label1".to_string(),
            kind: LabelKind::Genre,
            name: "Fantasy".to_string(),
        }
    }

    #[tokio::test]
    async fn test_find_by_kind() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[fantasy()]])
                .into_connection(),
        );

        let repo = LabelRepository::new(db);
        let labels = repo.find_by_kind(LabelKind::Genre).await.unwrap();

        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].name, "Fantasy");
    }

    #[tokio::test]
    async fn test_find_for_story_empty() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<label::Model>::new()])
                .into_connection(),
        );

        let repo = LabelRepository::new(db);
        let labels = repo.find_for_story("s1").await.unwrap();

        assert!(labels.is_empty());
    }
}
