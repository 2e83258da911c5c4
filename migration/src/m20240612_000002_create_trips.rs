use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create vehicle enum
        manager
            .create_type(
                Type::create()
                    .as_enum(VehicleType::Enum)
                    .values([VehicleType::Bus, VehicleType::Flight])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Trip::Table)
                    .if_not_exists()
                    .col(uuid(Trip::Id).primary_key())
                    .col(string_len(Trip::Origin, 100).not_null())
                    .col(string_len(Trip::Destination, 100).not_null())
                    .col(
                        ColumnDef::new(Trip::Vehicle)
                            .custom(VehicleType::Enum)
                            .not_null(),
                    )
                    .col(timestamp_with_time_zone(Trip::DepartureAt).not_null())
                    .col(integer(Trip::Capacity).not_null())
                    .col(
                        integer(Trip::AvailableSeats)
                            .not_null()
                            .check(Expr::col(Trip::AvailableSeats).gte(0)),
                    )
                    .col(
                        double(Trip::Price)
                            .not_null()
                            .check(Expr::col(Trip::Price).gte(0)),
                    )
                    .col(
                        timestamp_with_time_zone(Trip::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(timestamp_with_time_zone_null(Trip::DeletedAt))
                    .to_owned(),
            )
            .await?;

        // One trip per (origin, destination, vehicle, departure) tuple
        manager
            .create_index(
                Index::create()
                    .name("idx_trip_route_unique")
                    .table(Trip::Table)
                    .col(Trip::Origin)
                    .col(Trip::Destination)
                    .col(Trip::Vehicle)
                    .col(Trip::DepartureAt)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Trip::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(VehicleType::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Trip {
    Table,
    Id,
    Origin,
    Destination,
    Vehicle,
    DepartureAt,
    Capacity,
    AvailableSeats,
    Price,
    CreatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
pub enum VehicleType {
    #[sea_orm(iden = "vehicle")]
    Enum,
    #[sea_orm(iden = "bus")]
    Bus,
    #[sea_orm(iden = "flight")]
    Flight,
}
