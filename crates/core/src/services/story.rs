//! Story publishing.

use fable_common::{AppError, AppResult};
use fable_db::{
    entities::{
        chapter, label,
        label::LabelKind,
        post, story, story_label, Label,
    },
    repositories::{ChapterRepository, LabelRepository, PostRepository, StoryRepository},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use std::sync::Arc;

use crate::services::txn_err;

/// Input for creating a story.
pub struct CreateStoryInput {
    pub title: String,
    pub synopsis: String,
    pub is_public: bool,
    /// Labels get-or-created by (kind, name).
    pub labels: Vec<(LabelKind, String)>,
}

/// Input for editing a story. `None` leaves the field untouched.
#[derive(Default)]
pub struct UpdateStoryInput {
    pub title: Option<String>,
    pub synopsis: Option<String>,
    pub is_public: Option<bool>,
    /// When present, replaces the full label set.
    pub labels: Option<Vec<(LabelKind, String)>>,
}

/// A story with its associations resolved.
pub struct StoryDetail {
    pub story: story::Model,
    pub author_id: String,
    pub labels: Vec<label::Model>,
    pub chapters: Vec<chapter::Model>,
}

/// Story service.
#[derive(Clone)]
pub struct StoryService {
    db: Arc<DatabaseConnection>,
    story_repo: StoryRepository,
    post_repo: PostRepository,
    label_repo: LabelRepository,
    chapter_repo: ChapterRepository,
}

impl StoryService {
    /// Create a new story service.
    #[must_use]
    pub const fn new(
        db: Arc<DatabaseConnection>,
        story_repo: StoryRepository,
        post_repo: PostRepository,
        label_repo: LabelRepository,
        chapter_repo: ChapterRepository,
    ) -> Self {
        Self {
            db,
            story_repo,
            post_repo,
            label_repo,
            chapter_repo,
        }
    }

    /// Create a story with its labels in one transaction.
    pub async fn create_story(
        &self,
        author_user_id: &str,
        input: CreateStoryInput,
    ) -> AppResult<story::Model> {
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::Validation("Story title is required".to_string()));
        }

        let author_user_id = author_user_id.to_string();
        let story_id = crate::generate_id();

        self.db
            .transaction::<_, story::Model, AppError>(move |txn| {
                Box::pin(async move {
                    let base = post::ActiveModel {
                        id: Set(story_id.clone()),
                        kind: Set(post::PostKind::Story),
                        author_id: Set(author_user_id),
                        created_at: Set(chrono::Utc::now().into()),
                    };
                    base.insert(txn)
                        .await
                        .map_err(|e| AppError::Database(e.to_string()))?;

                    let model = story::ActiveModel {
                        id: Set(story_id.clone()),
                        title: Set(title),
                        synopsis: Set(input.synopsis),
                        is_public: Set(input.is_public),
                    };
                    let created = model
                        .insert(txn)
                        .await
                        .map_err(|e| AppError::Database(e.to_string()))?;

                    for (kind, name) in input.labels {
                        attach_label_on(txn, &story_id, kind, &name).await?;
                    }

                    Ok(created)
                })
            })
            .await
            .map_err(txn_err)
    }

    /// Edit a story. Forbidden unless the caller authored it.
    pub async fn edit_story(
        &self,
        actor_user_id: &str,
        story_id: &str,
        input: UpdateStoryInput,
    ) -> AppResult<story::Model> {
        let actor_user_id = actor_user_id.to_string();
        let story_id = story_id.to_string();

        self.db
            .transaction::<_, story::Model, AppError>(move |txn| {
                Box::pin(async move {
                    let story = story::Entity::find_by_id(&story_id)
                        .one(txn)
                        .await
                        .map_err(|e| AppError::Database(e.to_string()))?
                        .ok_or_else(|| AppError::NotFound(format!("Story {story_id} not found")))?;
                    require_author_on(txn, &story_id, &actor_user_id).await?;

                    let mut active: story::ActiveModel = story.into();
                    if let Some(title) = input.title {
                        let title = title.trim().to_string();
                        if title.is_empty() {
                            return Err(AppError::Validation(
                                "Story title is required".to_string(),
                            ));
                        }
                        active.title = Set(title);
                    }
                    if let Some(synopsis) = input.synopsis {
                        active.synopsis = Set(synopsis);
                    }
                    if let Some(is_public) = input.is_public {
                        active.is_public = Set(is_public);
                    }
                    let updated = active
                        .update(txn)
                        .await
                        .map_err(|e| AppError::Database(e.to_string()))?;

                    if let Some(labels) = input.labels {
                        story_label::Entity::delete_many()
                            .filter(story_label::Column::StoryId.eq(story_id.as_str()))
                            .exec(txn)
                            .await
                            .map_err(|e| AppError::Database(e.to_string()))?;
                        for (kind, name) in labels {
                            attach_label_on(txn, &story_id, kind, &name).await?;
                        }
                    }

                    Ok(updated)
                })
            })
            .await
            .map_err(txn_err)
    }

    /// Delete a story. Forbidden unless the caller authored it; cascades to
    /// chapters, comments, likes, bookmarks, labels, and reports.
    pub async fn delete_story(&self, actor_user_id: &str, story_id: &str) -> AppResult<()> {
        self.story_repo.get_by_id(story_id).await?;
        let base = self.post_repo.get_by_id(story_id).await?;
        if base.author_id != actor_user_id {
            return Err(AppError::Forbidden(
                "Only the author can delete a story".to_string(),
            ));
        }
        self.post_repo.delete(story_id).await
    }

    /// A story with its labels and chapters.
    pub async fn story_detail(&self, story_id: &str) -> AppResult<StoryDetail> {
        let story = self.story_repo.get_by_id(story_id).await?;
        let base = self.post_repo.get_by_id(story_id).await?;
        let labels = self.label_repo.find_for_story(story_id).await?;
        let chapters = self.chapter_repo.find_by_story(story_id).await?;

        Ok(StoryDetail {
            story,
            author_id: base.author_id,
            labels,
            chapters,
        })
    }

    /// Public stories, newest first.
    pub async fn list_public(&self, limit: u64, offset: u64) -> AppResult<Vec<story::Model>> {
        self.story_repo.find_public(limit, offset).await
    }

    /// Stories by an author, newest first.
    pub async fn list_by_author(&self, author_user_id: &str) -> AppResult<Vec<story::Model>> {
        self.story_repo.find_by_author(author_user_id).await
    }

    /// Stories bookmarked by a profile.
    pub async fn list_bookmarked(&self, profile_id: &str) -> AppResult<Vec<story::Model>> {
        self.story_repo.find_bookmarked_by(profile_id).await
    }

    /// All labels of a kind, for browse and tag pickers.
    pub async fn list_labels(&self, kind: LabelKind) -> AppResult<Vec<label::Model>> {
        self.label_repo.find_by_kind(kind).await
    }
}

/// Get-or-create a label and attach it to a story.
async fn attach_label_on<C: ConnectionTrait>(
    txn: &C,
    story_id: &str,
    kind: LabelKind,
    name: &str,
) -> AppResult<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Label name is required".to_string()));
    }

    let existing = Label::find()
        .filter(label::Column::Kind.eq(kind))
        .filter(label::Column::Name.eq(name))
        .one(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    let label_id = match existing {
        Some(l) => l.id,
        None => {
            let model = label::ActiveModel {
                id: Set(crate::generate_id()),
                kind: Set(kind),
                name: Set(name.to_string()),
            };
            model
                .insert(txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?
                .id
        }
    };

    let join = story_label::ActiveModel {
        story_id: Set(story_id.to_string()),
        label_id: Set(label_id),
    };
    join.insert(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(())
}

/// Fail Forbidden unless the story's base post is authored by the actor.
async fn require_author_on<C: ConnectionTrait>(
    txn: &C,
    story_id: &str,
    actor_user_id: &str,
) -> AppResult<post::Model> {
    let base = post::Entity::find_by_id(story_id)
        .one(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("Post {story_id} not found")))?;
    if base.author_id != actor_user_id {
        return Err(AppError::Forbidden(
            "Only the author can modify a story".to_string(),
        ));
    }
    Ok(base)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn test_post(id: &str, author_id: &str) -> post::Model {
        post::Model {
            id: id.to_string(),
            kind: post::PostKind::Story,
            author_id: author_id.to_string(),
            created_at: chrono::Utc::now().into(),
        }
    }

    fn test_story(id: &str, title: &str) -> story::Model {
        story::Model {
            id: id.to_string(),
            title: title.to_string(),
            synopsis: String::new(),
            is_public: false,
        }
    }

    fn service(db: sea_orm::DatabaseConnection) -> StoryService {
        let db = Arc::new(db);
        StoryService::new(
            db.clone(),
            StoryRepository::new(db.clone()),
            PostRepository::new(db.clone()),
            LabelRepository::new(db.clone()),
            ChapterRepository::new(db),
        )
    }

    #[tokio::test]
    async fn test_create_story_gets_or_creates_labels() {
        let fantasy = label::Model {
            id: "label1".to_string(),
            kind: LabelKind::Genre,
            name: "Fantasy".to_string(),
        };
        let join = story_label::Model {
            story_id: "s1".to_string(),
            label_id: "label1".to_string(),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_post("s1", "author")]])
            .append_query_results([[test_story("s1", "The Long Road")]])
            .append_query_results([Vec::<label::Model>::new(), vec![fantasy]])
            .append_query_results([[join]])
            .into_connection();

        let input = CreateStoryInput {
            title: "The Long Road".to_string(),
            synopsis: String::new(),
            is_public: false,
            labels: vec![(LabelKind::Genre, "Fantasy".to_string())],
        };
        let story = service(db).create_story("author", input).await.unwrap();

        assert_eq!(story.title, "The Long Road");
    }

    #[tokio::test]
    async fn test_create_story_requires_title() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let input = CreateStoryInput {
            title: "  ".to_string(),
            synopsis: String::new(),
            is_public: false,
            labels: vec![],
        };
        let result = service(db).create_story("author", input).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_edit_story_by_non_author_is_forbidden() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_story("s1", "The Long Road")]])
            .append_query_results([[test_post("s1", "someone-else")]])
            .into_connection();

        let result = service(db)
            .edit_story("intruder", "s1", UpdateStoryInput::default())
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_delete_story_by_author() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_story("s1", "The Long Road")]])
            .append_query_results([vec![test_post("s1", "author")], vec![test_post("s1", "author")]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        service(db).delete_story("author", "s1").await.unwrap();
    }
}
