pub use sea_orm_migration::prelude::*;

mod m20251015_000001_create_users;
mod m20251015_000002_create_routes;
mod m20251015_000003_create_buses;
mod m20251015_000004_create_schedules;
mod m20251015_000005_create_bookings;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251015_000001_create_users::Migration),
            Box::new(m20251015_000002_create_routes::Migration),
            Box::new(m20251015_000003_create_buses::Migration),
            Box::new(m20251015_000004_create_schedules::Migration),
            Box::new(m20251015_000005_create_bookings::Migration),
        ]
    }
}
