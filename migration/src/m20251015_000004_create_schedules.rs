use sea_orm_migration::{prelude::*, schema::*};

use super::m20251015_000002_create_routes::Route;
use super::m20251015_000003_create_buses::Bus;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Schedule::Table)
                    .if_not_exists()
                    .col(pk_auto(Schedule::Id))
                    .col(integer(Schedule::BusId).not_null())
                    .col(integer(Schedule::RouteId).not_null())
                    .col(time(Schedule::DepartureTime).not_null())
                    .col(time(Schedule::ArrivalTime).not_null())
                    .col(decimal_len(Schedule::Price, 10, 2).not_null())
                    .col(
                        string_len(Schedule::AvailableDays, 100)
                            .not_null()
                            .default("Monday,Tuesday,Wednesday,Thursday,Friday,Saturday,Sunday"),
                    )
                    .col(boolean(Schedule::IsActive).not_null().default(true))
                    .col(
                        timestamp_with_time_zone(Schedule::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_schedule_bus")
                            .from(Schedule::Table, Schedule::BusId)
                            .to(Bus::Table, Bus::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_schedule_route")
                            .from(Schedule::Table, Schedule::RouteId)
                            .to(Route::Table, Route::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_schedule_route")
                    .table(Schedule::Table)
                    .col(Schedule::RouteId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Schedule::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Schedule {
    Table,
    Id,
    BusId,
    RouteId,
    DepartureTime,
    ArrivalTime,
    Price,
    AvailableDays,
    IsActive,
    CreatedAt,
}
