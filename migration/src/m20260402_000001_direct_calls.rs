use sea_orm_migration::prelude::*;

use crate::m20260301_000001_initial_tables::{Medicine, Pharmacy, User};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DirectCall::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DirectCall::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DirectCall::PharmacyId).string().not_null())
                    .col(ColumnDef::new(DirectCall::PatientId).string().null())
                    .col(ColumnDef::new(DirectCall::MedicineId).string().null())
                    .col(
                        ColumnDef::new(DirectCall::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_direct_calls_pharmacy")
                            .from(DirectCall::Table, DirectCall::PharmacyId)
                            .to(Pharmacy::Table, Pharmacy::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_direct_calls_patient")
                            .from(DirectCall::Table, DirectCall::PatientId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_direct_calls_medicine")
                            .from(DirectCall::Table, DirectCall::MedicineId)
                            .to(Medicine::Table, Medicine::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_direct_calls_pharmacy")
                    .table(DirectCall::Table)
                    .col(DirectCall::PharmacyId)
                    .col(DirectCall::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_direct_calls_pharmacy")
                    .table(DirectCall::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(DirectCall::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DirectCall {
    #[sea_orm(iden = "direct_calls")]
    Table,
    Id,
    PharmacyId,
    PatientId,
    MedicineId,
    CreatedAt,
}
