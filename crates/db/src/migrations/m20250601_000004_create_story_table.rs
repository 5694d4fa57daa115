//! Create story table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Story::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Story::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Story::Title).string_len(256).not_null())
                    .col(
                        ColumnDef::new(Story::Synopsis)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Story::IsPublic)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_story_post")
                            .from(Story::Table, Story::Id)
                            .to(Post::Table, Post::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: is_public (for the public catalog)
        manager
            .create_index(
                Index::create()
                    .name("idx_story_is_public")
                    .table(Story::Table)
                    .col(Story::IsPublic)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Story::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Story {
    Table,
    Id,
    Title,
    Synopsis,
    IsPublic,
}

#[derive(Iden)]
enum Post {
    Table,
    Id,
}
