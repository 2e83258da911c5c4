pub use sea_orm_migration::prelude::*;

mod m20240612_000001_create_users;
mod m20240612_000002_create_trips;
mod m20240612_000003_create_tickets;
mod m20240612_000004_create_notification_logs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240612_000001_create_users::Migration),
            Box::new(m20240612_000002_create_trips::Migration),
            Box::new(m20240612_000003_create_tickets::Migration),
            Box::new(m20240612_000004_create_notification_logs::Migration),
        ]
    }
}
