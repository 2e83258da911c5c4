use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

use super::m20240612_000001_create_users::User;
use super::m20240612_000002_create_trips::Trip;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create gender enum
        manager
            .create_type(
                Type::create()
                    .as_enum(GenderType::Enum)
                    .values([GenderType::Male, GenderType::Female])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Ticket::Table)
                    .if_not_exists()
                    .col(uuid(Ticket::Id).primary_key())
                    .col(uuid(Ticket::TripId).not_null())
                    .col(uuid(Ticket::UserId).not_null())
                    .col(
                        ColumnDef::new(Ticket::Gender)
                            .custom(GenderType::Enum)
                            .not_null(),
                    )
                    .col(string_len(Ticket::FullName, 255).not_null())
                    .col(string_len(Ticket::Email, 255).not_null())
                    .col(string_len(Ticket::Phone, 32).not_null())
                    .col(
                        timestamp_with_time_zone(Ticket::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(timestamp_with_time_zone_null(Ticket::DeletedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ticket_trip")
                            .from(Ticket::Table, Ticket::TripId)
                            .to(Trip::Table, Trip::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ticket_user")
                            .from(Ticket::Table, Ticket::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Ticket::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(GenderType::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Ticket {
    Table,
    Id,
    TripId,
    UserId,
    Gender,
    FullName,
    Email,
    Phone,
    CreatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
pub enum GenderType {
    #[sea_orm(iden = "gender")]
    Enum,
    #[sea_orm(iden = "male")]
    Male,
    #[sea_orm(iden = "female")]
    Female,
}
