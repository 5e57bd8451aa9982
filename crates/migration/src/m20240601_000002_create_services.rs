//! Create `services` table with FK to `users`.
//!
//! `path` is the public routing segment and is unique across all owners.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Services::Table)
                    .if_not_exists()
                    .col(uuid(Services::Id).primary_key())
                    .col(string_len(Services::Title, 255).not_null())
                    .col(string_len(Services::Path, 255).unique_key().not_null())
                    .col(uuid(Services::CreatedUserId).not_null())
                    .col(string_len(Services::UserEmail, 255).not_null())
                    .col(timestamp_with_time_zone(Services::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_services_user")
                            .from(Services::Table, Services::CreatedUserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Services::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Services { Table, Id, Title, Path, CreatedUserId, UserEmail, CreatedAt }

#[derive(DeriveIden)]
enum Users { Table, Id }
