use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Services: owner lookups and quota counts
        manager
            .create_index(
                Index::create()
                    .name("idx_services_created_user")
                    .table(Services::Table)
                    .col(Services::CreatedUserId)
                    .to_owned(),
            )
            .await?;

        // Services: extension lists by owner email
        manager
            .create_index(
                Index::create()
                    .name("idx_services_user_email")
                    .table(Services::Table)
                    .col(Services::UserEmail)
                    .to_owned(),
            )
            .await?;

        // Bookmarks: service page listing
        manager
            .create_index(
                Index::create()
                    .name("idx_bookmarks_service")
                    .table(Bookmarks::Table)
                    .col(Bookmarks::ServiceId)
                    .to_owned(),
            )
            .await?;

        // Bookmarks: saved-state lookup on (user, title)
        manager
            .create_index(
                Index::create()
                    .name("idx_bookmarks_user_title")
                    .table(Bookmarks::Table)
                    .col(Bookmarks::LastUpdatedUserId)
                    .col(Bookmarks::Title)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_services_created_user").table(Services::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_services_user_email").table(Services::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_bookmarks_service").table(Bookmarks::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_bookmarks_user_title").table(Bookmarks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Services { Table, CreatedUserId, UserEmail }

#[derive(DeriveIden)]
enum Bookmarks { Table, ServiceId, LastUpdatedUserId, Title }
