use sea_orm_migration::prelude::*;

use crate::m20260301_000001_initial_tables::{Notification, Reservation};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 超时扫描：WHERE status = 'PENDING' AND expires_at <= now
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_reservations_status_expires")
                    .table(Reservation::Table)
                    .col(Reservation::Status)
                    .col(Reservation::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_reservations_patient")
                    .table(Reservation::Table)
                    .col(Reservation::PatientId)
                    .col(Reservation::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_reservations_pharmacy")
                    .table(Reservation::Table)
                    .col(Reservation::PharmacyId)
                    .col(Reservation::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_notifications_user_read")
                    .table(Notification::Table)
                    .col(Notification::UserId)
                    .col(Notification::IsRead)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_notifications_user_read")
                    .table(Notification::Table)
                    .to_owned(),
            )
            .await?;

        for name in [
            "idx_reservations_pharmacy",
            "idx_reservations_patient",
            "idx_reservations_status_expires",
        ] {
            manager
                .drop_index(Index::drop().name(name).table(Reservation::Table).to_owned())
                .await?;
        }
        Ok(())
    }
}
