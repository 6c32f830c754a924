//! Миграция: создание таблиц keys и servers.

use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m001_create_keys_and_servers"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Keys::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Keys::ClientId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Keys::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Keys::ServerId).string().null())
                    .col(
                        ColumnDef::new(Keys::IsFrozen)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Keys::ExpiryTime)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Keys::Key).string().null())
                    .col(ColumnDef::new(Keys::RemnawaveLink).string().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Servers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Servers::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Servers::ServerName).string().not_null())
                    .col(ColumnDef::new(Servers::ClusterName).string().null())
                    .col(ColumnDef::new(Servers::TariffGroup).string().null())
                    .col(ColumnDef::new(Servers::PanelType).string().null())
                    .col(
                        ColumnDef::new(Servers::Enabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Servers::ApiUrl).string().null())
                    .col(ColumnDef::new(Servers::SubscriptionUrl).string().null())
                    .col(ColumnDef::new(Servers::InboundId).string().null())
                    .to_owned(),
            )
            .await?;

        // Выборки группы серверов идут по кластеру и тарифной группе
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .table(Servers::Table)
                    .col(Servers::ClusterName)
                    .name("idx_servers_cluster_name")
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .table(Servers::Table)
                    .col(Servers::TariffGroup)
                    .name("idx_servers_tariff_group")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Servers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Keys::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Keys {
    Table,
    ClientId,
    Email,
    ServerId,
    IsFrozen,
    ExpiryTime,
    Key,
    RemnawaveLink,
}

#[derive(Iden)]
enum Servers {
    Table,
    Id,
    ServerName,
    ClusterName,
    TariffGroup,
    PanelType,
    Enabled,
    ApiUrl,
    SubscriptionUrl,
    InboundId,
}
