use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserProfit::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UserProfit::GuildId).big_integer().not_null())
                    .col(ColumnDef::new(UserProfit::UserId).big_integer().not_null())
                    .col(ColumnDef::new(UserProfit::Username).string().not_null())
                    .col(
                        ColumnDef::new(UserProfit::TotalProfit)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(UserProfit::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(UserProfit::GuildId)
                            .col(UserProfit::UserId),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserProfit::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum UserProfit {
    Table,
    GuildId,
    UserId,
    Username,
    TotalProfit,
    UpdatedAt,
}
