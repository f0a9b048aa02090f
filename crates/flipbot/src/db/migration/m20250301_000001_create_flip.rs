use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Flip::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Flip::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Flip::GuildId).big_integer().not_null())
                    .col(ColumnDef::new(Flip::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Flip::Item).string().not_null())
                    .col(ColumnDef::new(Flip::PurchasePrice).double().not_null())
                    .col(ColumnDef::new(Flip::PartsPrice).double().not_null())
                    .col(ColumnDef::new(Flip::SalesPrice).double().not_null())
                    .col(ColumnDef::new(Flip::TotalCost).double().not_null())
                    .col(ColumnDef::new(Flip::Profit).double().not_null())
                    .col(
                        ColumnDef::new(Flip::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Flip::HandledBy).big_integer().null())
                    .col(
                        ColumnDef::new(Flip::HandledAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Flip::MemberMessageId).big_integer().null())
                    .col(
                        ColumnDef::new(Flip::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_flip_guild_user_status")
                    .table(Flip::Table)
                    .col(Flip::GuildId)
                    .col(Flip::UserId)
                    .col(Flip::Status)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Flip::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Flip {
    Table,
    Id,
    GuildId,
    UserId,
    Item,
    PurchasePrice,
    PartsPrice,
    SalesPrice,
    TotalCost,
    Profit,
    Status,
    HandledBy,
    HandledAt,
    MemberMessageId,
    CreatedAt,
}
