//! Initial migration to create the pollux event log schema.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.create_platforms(manager).await?;
        self.create_actions(manager).await?;
        self.create_projects(manager).await?;
        self.create_events(manager).await?;
        self.create_git_events(manager).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GitEvents::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Events::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Projects::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Actions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Platforms::Table).to_owned())
            .await?;
        Ok(())
    }
}

impl Migration {
    async fn create_platforms(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Platforms::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Platforms::Name)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Platforms::LastSync)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_actions(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Actions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Actions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Actions::Name).string().not_null())
                    .to_owned(),
            )
            .await?;

        // Conflict target for insert-if-absent
        manager
            .create_index(
                Index::create()
                    .name("idx_actions_name")
                    .table(Actions::Table)
                    .col(Actions::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_projects(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Projects::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Projects::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Projects::Name).string().not_null())
                    .col(ColumnDef::new(Projects::Url).text().not_null())
                    .col(ColumnDef::new(Projects::Platform).string().not_null())
                    .col(
                        ColumnDef::new(Projects::PlatformProjectId)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_projects_platform")
                            .from(Projects::Table, Projects::Platform)
                            .to(Platforms::Table, Platforms::Name)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique constraint on (platform, platform_project_id)
        manager
            .create_index(
                Index::create()
                    .name("idx_projects_platform_project_id")
                    .table(Projects::Table)
                    .col(Projects::Platform)
                    .col(Projects::PlatformProjectId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_events(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Events::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Events::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Events::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_events_timestamp")
                    .table(Events::Table)
                    .col(Events::Timestamp)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_git_events(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GitEvents::Table)
                    .if_not_exists()
                    // Shares its id with the base event
                    .col(
                        ColumnDef::new(GitEvents::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GitEvents::ProjectId).big_integer().not_null())
                    .col(ColumnDef::new(GitEvents::ActionId).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_git_events_event")
                            .from(GitEvents::Table, GitEvents::Id)
                            .to(Events::Table, Events::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_git_events_project")
                            .from(GitEvents::Table, GitEvents::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_git_events_action")
                            .from(GitEvents::Table, GitEvents::ActionId)
                            .to(Actions::Table, Actions::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_git_events_project")
                    .table(GitEvents::Table)
                    .col(GitEvents::ProjectId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_git_events_action")
                    .table(GitEvents::Table)
                    .col(GitEvents::ActionId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
#[sea_orm(iden = "platforms")]
enum Platforms {
    Table,
    Name,
    LastSync,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "actions")]
enum Actions {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "projects")]
enum Projects {
    Table,
    Id,
    Name,
    Url,
    Platform,
    PlatformProjectId,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "events")]
enum Events {
    Table,
    Id,
    Timestamp,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "git_events")]
enum GitEvents {
    Table,
    Id,
    ProjectId,
    ActionId,
}
