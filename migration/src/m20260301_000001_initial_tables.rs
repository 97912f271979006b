use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // users
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(User::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(User::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(User::PasswordHash).string().not_null())
                    .col(ColumnDef::new(User::Name).string().not_null())
                    .col(ColumnDef::new(User::Phone).string().null())
                    .col(ColumnDef::new(User::Role).string().not_null())
                    .col(
                        ColumnDef::new(User::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(User::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // pharmacies（与 PHARMACY 用户一对一）
        manager
            .create_table(
                Table::create()
                    .table(Pharmacy::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Pharmacy::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Pharmacy::UserId)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Pharmacy::Name).string().not_null())
                    .col(ColumnDef::new(Pharmacy::Address).string().not_null())
                    .col(ColumnDef::new(Pharmacy::City).string().not_null())
                    .col(ColumnDef::new(Pharmacy::Phone).string().not_null())
                    .col(
                        ColumnDef::new(Pharmacy::LicenseNumber)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Pharmacy::Latitude).double().not_null())
                    .col(ColumnDef::new(Pharmacy::Longitude).double().not_null())
                    .col(ColumnDef::new(Pharmacy::OpeningHours).string().null())
                    .col(
                        ColumnDef::new(Pharmacy::IsApproved)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Pharmacy::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Pharmacy::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pharmacies_user")
                            .from(Pharmacy::Table, Pharmacy::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // medicines
        manager
            .create_table(
                Table::create()
                    .table(Medicine::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Medicine::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Medicine::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Medicine::GenericName).string().null())
                    .col(ColumnDef::new(Medicine::Category).string().not_null())
                    .col(ColumnDef::new(Medicine::Description).text().null())
                    .col(ColumnDef::new(Medicine::Manufacturer).string().null())
                    .col(
                        ColumnDef::new(Medicine::RequiresPrescription)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Medicine::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Medicine::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // inventory（pharmacy × medicine）
        manager
            .create_table(
                Table::create()
                    .table(Inventory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Inventory::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Inventory::PharmacyId).string().not_null())
                    .col(ColumnDef::new(Inventory::MedicineId).string().not_null())
                    .col(
                        ColumnDef::new(Inventory::Quantity)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Inventory::Price).double().null())
                    .col(ColumnDef::new(Inventory::Status).string().not_null())
                    .col(
                        ColumnDef::new(Inventory::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_inventory_pharmacy")
                            .from(Inventory::Table, Inventory::PharmacyId)
                            .to(Pharmacy::Table, Pharmacy::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_inventory_medicine")
                            .from(Inventory::Table, Inventory::MedicineId)
                            .to(Medicine::Table, Medicine::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_inventory_pharmacy_medicine")
                    .table(Inventory::Table)
                    .col(Inventory::PharmacyId)
                    .col(Inventory::MedicineId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_inventory_medicine")
                    .table(Inventory::Table)
                    .col(Inventory::MedicineId)
                    .to_owned(),
            )
            .await?;

        // reservations
        manager
            .create_table(
                Table::create()
                    .table(Reservation::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Reservation::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Reservation::PatientId).string().not_null())
                    .col(ColumnDef::new(Reservation::PharmacyId).string().not_null())
                    .col(ColumnDef::new(Reservation::MedicineId).string().not_null())
                    .col(ColumnDef::new(Reservation::Quantity).integer().not_null())
                    .col(ColumnDef::new(Reservation::Status).string().not_null())
                    .col(ColumnDef::new(Reservation::Note).text().null())
                    .col(ColumnDef::new(Reservation::ResponseNote).text().null())
                    .col(
                        ColumnDef::new(Reservation::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Reservation::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Reservation::RespondedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Reservation::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reservations_patient")
                            .from(Reservation::Table, Reservation::PatientId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reservations_pharmacy")
                            .from(Reservation::Table, Reservation::PharmacyId)
                            .to(Pharmacy::Table, Pharmacy::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reservations_medicine")
                            .from(Reservation::Table, Reservation::MedicineId)
                            .to(Medicine::Table, Medicine::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // notifications
        manager
            .create_table(
                Table::create()
                    .table(Notification::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notification::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Notification::UserId).string().not_null())
                    .col(ColumnDef::new(Notification::Kind).string().not_null())
                    .col(ColumnDef::new(Notification::Title).string().not_null())
                    .col(ColumnDef::new(Notification::Message).text().not_null())
                    .col(ColumnDef::new(Notification::ReservationId).string().null())
                    .col(
                        ColumnDef::new(Notification::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Notification::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notifications_user")
                            .from(Notification::Table, Notification::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Notification::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Reservation::Table).to_owned())
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_inventory_medicine")
                    .table(Inventory::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_inventory_pharmacy_medicine")
                    .table(Inventory::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Inventory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Medicine::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Pharmacy::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum User {
    #[sea_orm(iden = "users")]
    Table,
    Id,
    Email,
    PasswordHash,
    Name,
    Phone,
    Role,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum Pharmacy {
    #[sea_orm(iden = "pharmacies")]
    Table,
    Id,
    UserId,
    Name,
    Address,
    City,
    Phone,
    LicenseNumber,
    Latitude,
    Longitude,
    OpeningHours,
    IsApproved,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum Medicine {
    #[sea_orm(iden = "medicines")]
    Table,
    Id,
    Name,
    GenericName,
    Category,
    Description,
    Manufacturer,
    RequiresPrescription,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Inventory {
    #[sea_orm(iden = "inventory")]
    Table,
    Id,
    PharmacyId,
    MedicineId,
    Quantity,
    Price,
    Status,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum Reservation {
    #[sea_orm(iden = "reservations")]
    Table,
    Id,
    PatientId,
    PharmacyId,
    MedicineId,
    Quantity,
    Status,
    Note,
    ResponseNote,
    CreatedAt,
    ExpiresAt,
    RespondedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum Notification {
    #[sea_orm(iden = "notifications")]
    Table,
    Id,
    UserId,
    Kind,
    Title,
    Message,
    ReservationId,
    IsRead,
    CreatedAt,
}
