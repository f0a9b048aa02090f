use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GuildSettings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GuildSettings::GuildId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GuildSettings::MemberFlipsChannelId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(GuildSettings::LeaderboardChannelId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(GuildSettings::LogChannelId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(GuildSettings::LeaderboardSummaryMessageId)
                            .big_integer()
                            .null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GuildSettings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum GuildSettings {
    Table,
    GuildId,
    MemberFlipsChannelId,
    LeaderboardChannelId,
    LogChannelId,
    LeaderboardSummaryMessageId,
}
