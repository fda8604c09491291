use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

use super::m20251015_000001_create_users::User;
use super::m20251015_000004_create_schedules::Schedule;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(BookingStatus::Enum)
                    .values([
                        BookingStatus::Confirmed,
                        BookingStatus::Cancelled,
                        BookingStatus::Completed,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(BookingType::Enum)
                    .values([BookingType::OneWay, BookingType::RoundTrip, BookingType::MultiCity])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Booking::Table)
                    .if_not_exists()
                    .col(pk_auto(Booking::Id))
                    .col(string_len(Booking::BookingCode, 32).not_null().unique_key())
                    .col(integer(Booking::UserId).not_null())
                    .col(integer(Booking::ScheduleId).not_null())
                    .col(date(Booking::TravelDate).not_null())
                    .col(integer(Booking::SeatNumber).not_null())
                    .col(
                        ColumnDef::new(Booking::Status)
                            .custom(BookingStatus::Enum)
                            .not_null()
                            .default("confirmed"),
                    )
                    .col(
                        ColumnDef::new(Booking::BookingType)
                            .custom(BookingType::Enum)
                            .not_null()
                            .default("one-way"),
                    )
                    .col(integer_null(Booking::ParentBookingId))
                    .col(integer_null(Booking::LegSequence))
                    .col(date_null(Booking::ReturnTravelDate))
                    .col(
                        timestamp_with_time_zone(Booking::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Booking::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_user")
                            .from(Booking::Table, Booking::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_schedule")
                            .from(Booking::Table, Booking::ScheduleId)
                            .to(Schedule::Table, Schedule::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_parent")
                            .from(Booking::Table, Booking::ParentBookingId)
                            .to(Booking::Table, Booking::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, col) in [
            ("idx_booking_user", Booking::UserId),
            ("idx_booking_schedule", Booking::ScheduleId),
            ("idx_booking_travel_date", Booking::TravelDate),
            ("idx_booking_parent", Booking::ParentBookingId),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Booking::Table)
                        .col(col)
                        .to_owned(),
                )
                .await?;
        }

        // Seat exclusivity guard. Partial over confirmed rows so a cancelled
        // booking never blocks rebooking the same (schedule, date, seat).
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX uq_booking_confirmed_seat \
                 ON booking (schedule_id, travel_date, seat_number) \
                 WHERE status = 'confirmed'",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Booking::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(BookingType::Enum).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(BookingStatus::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Booking {
    Table,
    Id,
    BookingCode,
    UserId,
    ScheduleId,
    TravelDate,
    SeatNumber,
    Status,
    BookingType,
    ParentBookingId,
    LegSequence,
    ReturnTravelDate,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum BookingStatus {
    #[sea_orm(iden = "booking_status")]
    Enum,
    #[sea_orm(iden = "confirmed")]
    Confirmed,
    #[sea_orm(iden = "cancelled")]
    Cancelled,
    #[sea_orm(iden = "completed")]
    Completed,
}

#[derive(DeriveIden)]
pub enum BookingType {
    #[sea_orm(iden = "booking_type")]
    Enum,
    #[sea_orm(iden = "one-way")]
    OneWay,
    #[sea_orm(iden = "round-trip")]
    RoundTrip,
    #[sea_orm(iden = "multi-city")]
    MultiCity,
}
