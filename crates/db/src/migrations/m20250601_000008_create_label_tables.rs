//! Create label and story_label tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Label::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Label::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Label::Kind).string_len(16).not_null())
                    .col(ColumnDef::new(Label::Name).string_len(256).not_null())
                    .to_owned(),
            )
            .await?;

        // Unique: name within a kind
        manager
            .create_index(
                Index::create()
                    .name("idx_label_kind_name")
                    .table(Label::Table)
                    .col(Label::Kind)
                    .col(Label::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StoryLabel::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(StoryLabel::StoryId).string_len(32).not_null())
                    .col(ColumnDef::new(StoryLabel::LabelId).string_len(32).not_null())
                    .primary_key(
                        Index::create()
                            .col(StoryLabel::StoryId)
                            .col(StoryLabel::LabelId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_story_label_story")
                            .from(StoryLabel::Table, StoryLabel::StoryId)
                            .to(Story::Table, Story::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_story_label_label")
                            .from(StoryLabel::Table, StoryLabel::LabelId)
                            .to(Label::Table, Label::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StoryLabel::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Label::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Label {
    Table,
    Id,
    Kind,
    Name,
}

#[derive(Iden)]
enum StoryLabel {
    Table,
    StoryId,
    LabelId,
}

#[derive(Iden)]
enum Story {
    Table,
    Id,
}
