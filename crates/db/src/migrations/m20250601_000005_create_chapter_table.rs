//! Create chapter table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Chapter::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Chapter::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Chapter::StoryId).string_len(32).not_null())
                    .col(ColumnDef::new(Chapter::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Chapter::Content).text().not_null())
                    .col(
                        ColumnDef::new(Chapter::IsPublic)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Chapter::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_chapter_story")
                            .from(Chapter::Table, Chapter::StoryId)
                            .to(Story::Table, Story::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: story_id (for chapter listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_chapter_story_id")
                    .table(Chapter::Table)
                    .col(Chapter::StoryId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Chapter::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Chapter {
    Table,
    Id,
    StoryId,
    Title,
    Content,
    IsPublic,
    CreatedAt,
}

#[derive(Iden)]
enum Story {
    Table,
    Id,
}
