use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create bus status enum
        manager
            .create_type(
                Type::create()
                    .as_enum(BusStatus::Enum)
                    .values([BusStatus::Active, BusStatus::Inactive, BusStatus::Maintenance])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Bus::Table)
                    .if_not_exists()
                    .col(pk_auto(Bus::Id))
                    .col(string_len(Bus::PlateNumber, 20).not_null().unique_key())
                    .col(string_len(Bus::BusType, 50).not_null())
                    .col(integer(Bus::TotalSeats).not_null())
                    .col(
                        ColumnDef::new(Bus::Status)
                            .custom(BusStatus::Enum)
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        timestamp_with_time_zone(Bus::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bus::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(BusStatus::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Bus {
    Table,
    Id,
    PlateNumber,
    BusType,
    TotalSeats,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum BusStatus {
    #[sea_orm(iden = "bus_status")]
    Enum,
    #[sea_orm(iden = "active")]
    Active,
    #[sea_orm(iden = "inactive")]
    Inactive,
    #[sea_orm(iden = "maintenance")]
    Maintenance,
}
