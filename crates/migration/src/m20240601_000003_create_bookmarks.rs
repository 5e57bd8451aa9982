//! Create `bookmarks` table.
//! Each bookmark belongs to one service; deleting the service removes them.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Bookmarks::Table)
                    .if_not_exists()
                    .col(uuid(Bookmarks::Id).primary_key())
                    .col(text(Bookmarks::Title).not_null())
                    .col(ColumnDef::new(Bookmarks::Description).text().null())
                    .col(ColumnDef::new(Bookmarks::FaviconUrl).text().null())
                    .col(ColumnDef::new(Bookmarks::TwitterImageUrl).text().null())
                    .col(text(Bookmarks::Url).not_null())
                    .col(timestamp_with_time_zone(Bookmarks::UploadedDate).not_null())
                    .col(uuid(Bookmarks::ServiceId).not_null())
                    .col(uuid(Bookmarks::LastUpdatedUserId).not_null())
                    .col(ColumnDef::new(Bookmarks::Memo).text().null())
                    .col(boolean(Bookmarks::IsVisible).not_null().default(true))
                    .col(timestamp_with_time_zone(Bookmarks::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Bookmarks::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookmarks_service")
                            .from(Bookmarks::Table, Bookmarks::ServiceId)
                            .to(Services::Table, Services::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookmarks_last_updated_user")
                            .from(Bookmarks::Table, Bookmarks::LastUpdatedUserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Bookmarks::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Bookmarks {
    Table,
    Id,
    Title,
    Description,
    FaviconUrl,
    TwitterImageUrl,
    Url,
    UploadedDate,
    ServiceId,
    LastUpdatedUserId,
    Memo,
    IsVisible,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Services { Table, Id }

#[derive(DeriveIden)]
enum Users { Table, Id }
