use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create channel enum
        manager
            .create_type(
                Type::create()
                    .as_enum(ChannelType::Enum)
                    .values([ChannelType::Sms, ChannelType::Email])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(NotificationLog::Table)
                    .if_not_exists()
                    .col(pk_auto(NotificationLog::Id))
                    .col(
                        ColumnDef::new(NotificationLog::Channel)
                            .custom(ChannelType::Enum)
                            .not_null(),
                    )
                    .col(text(NotificationLog::Message).not_null())
                    .col(
                        timestamp_with_time_zone(NotificationLog::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(NotificationLog::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(ChannelType::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum NotificationLog {
    Table,
    Id,
    Channel,
    Message,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum ChannelType {
    #[sea_orm(iden = "channel")]
    Enum,
    #[sea_orm(iden = "sms")]
    Sms,
    #[sea_orm(iden = "email")]
    Email,
}
