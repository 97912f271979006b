//! 预约生命周期
//!
//! 状态转换统一经过 [`ReservationStatus::apply`]；所有权与角色在状态机之前检查。
//! 状态写回使用带旧状态条件的 UPDATE，并发响应时只有一个能成功。

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait, sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::api::types::TS_EXPORT_PATH;
use crate::config::ReservationConfig;
use crate::errors::{MedifindError, Result};
use crate::models::{
    AuthUser, NotificationKind, ReservationAction, ReservationStatus, Role, parse_stored,
};
use crate::storage::Storage;
use crate::utils::generate_id;
use crate::utils::validation::optional_trimmed;
use migration::entities::{inventory, pharmacy, reservation};

use super::NotificationService;
use super::inventory_service::shift_quantity;
use super::lookup::{
    approved_pharmacy_for_user, find_approved_pharmacy, find_medicine, medicines_by_ids,
    pharmacies_by_ids, pharmacy_for_user, users_by_ids,
};

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct ReservationView {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub patient_phone: Option<String>,
    pub pharmacy_id: String,
    pub pharmacy_name: String,
    pub medicine_id: String,
    pub medicine_name: String,
    pub quantity: i32,
    pub status: ReservationStatus,
    pub note: Option<String>,
    pub response_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct CreateReservationRequest {
    pub pharmacy_id: String,
    pub medicine_id: String,
    pub quantity: i32,
    pub note: Option<String>,
}

/// 药房响应时附带的说明（拒绝原因等）
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct RespondRequest {
    #[serde(alias = "reason")]
    pub note: Option<String>,
}

pub struct ReservationService {
    storage: Arc<Storage>,
    notifications: Arc<NotificationService>,
    settings: ReservationConfig,
    low_stock_threshold: i32,
}

impl ReservationService {
    pub fn new(
        storage: Arc<Storage>,
        notifications: Arc<NotificationService>,
        settings: ReservationConfig,
        low_stock_threshold: i32,
    ) -> Self {
        Self {
            storage,
            notifications,
            settings,
            low_stock_threshold,
        }
    }

    fn timeout(&self) -> Duration {
        Duration::minutes(self.settings.timeout_minutes as i64)
    }

    /// 患者创建预约（PENDING）
    pub async fn create(
        &self,
        patient: &AuthUser,
        req: &CreateReservationRequest,
    ) -> Result<ReservationView> {
        patient.require_role(&[Role::Patient])?;

        if req.quantity < 1 || req.quantity > self.settings.max_quantity {
            return Err(MedifindError::validation(format!(
                "Quantity must be between 1 and {}",
                self.settings.max_quantity
            )));
        }

        let db = self.storage.get_db();
        let pharmacy = find_approved_pharmacy(db, &req.pharmacy_id).await?;
        let medicine = find_medicine(db, &req.medicine_id).await?;

        let stock = inventory::Entity::find()
            .filter(inventory::Column::PharmacyId.eq(pharmacy.id.as_str()))
            .filter(inventory::Column::MedicineId.eq(medicine.id.as_str()))
            .one(db)
            .await?;
        match stock {
            Some(row) if row.quantity >= req.quantity => {}
            Some(row) => {
                return Err(MedifindError::insufficient_stock(format!(
                    "Only {} unit(s) of {} available at {}",
                    row.quantity, medicine.name, pharmacy.name
                )));
            }
            None => {
                return Err(MedifindError::insufficient_stock(format!(
                    "{} is not stocked at {}",
                    medicine.name, pharmacy.name
                )));
            }
        }

        let now = Utc::now();
        let model = reservation::ActiveModel {
            id: Set(generate_id()),
            patient_id: Set(patient.id.clone()),
            pharmacy_id: Set(pharmacy.id.clone()),
            medicine_id: Set(medicine.id.clone()),
            quantity: Set(req.quantity),
            status: Set(ReservationStatus::Pending.to_string()),
            note: Set(optional_trimmed(req.note.as_deref())),
            response_note: Set(None),
            created_at: Set(now),
            expires_at: Set(now + self.timeout()),
            responded_at: Set(None),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        info!(
            "Reservation {} created: patient={} pharmacy={} medicine={} qty={}",
            model.id, patient.id, pharmacy.id, medicine.name, model.quantity
        );

        self.notify_quietly(
            &pharmacy.user_id,
            NotificationKind::ReservationCreated,
            "New reservation",
            &format!(
                "A patient reserved {} x {}. Please respond within {} minutes.",
                model.quantity, medicine.name, self.settings.timeout_minutes
            ),
            &model.id,
        )
        .await;

        self.build_view(model).await
    }

    /// 药房接受预约，同一事务内扣减库存
    pub async fn accept(
        &self,
        actor: &AuthUser,
        id: &str,
        note: Option<&str>,
    ) -> Result<ReservationView> {
        actor.require_role(&[Role::Pharmacy])?;
        let db = self.storage.get_db();
        let pharmacy = approved_pharmacy_for_user(db, &actor.id).await?;
        let model = self.find_for_pharmacy(&pharmacy, id).await?;
        let current = self.check_deadline(&model).await?;
        let next = current.apply(ReservationAction::Accept)?;

        let stock = inventory::Entity::find()
            .filter(inventory::Column::PharmacyId.eq(model.pharmacy_id.as_str()))
            .filter(inventory::Column::MedicineId.eq(model.medicine_id.as_str()))
            .one(db)
            .await?
            .ok_or_else(|| MedifindError::insufficient_stock("Medicine is no longer stocked"))?;

        // 扣减先于状态写入，事务开始即持有库存行的写锁
        let now = Utc::now();
        let txn = db.begin().await?;
        let Some(stock) =
            shift_quantity(&txn, &stock.id, -model.quantity, self.low_stock_threshold).await?
        else {
            return Err(MedifindError::insufficient_stock(format!(
                "Not enough stock left to cover {} unit(s)",
                model.quantity
            )));
        };
        let remaining = stock.quantity;

        Self::transition(
            &txn,
            &model.id,
            current,
            next,
            optional_trimmed(note),
            Some(now),
        )
        .await?;
        txn.commit().await?;

        info!(
            "Reservation {} accepted by pharmacy {} (stock left: {})",
            model.id, pharmacy.id, remaining
        );

        let updated = self.reload(&model.id).await?;
        let medicine_name = self.medicine_name(&updated.medicine_id).await;
        self.notify_quietly(
            &updated.patient_id,
            NotificationKind::ReservationAccepted,
            "Reservation accepted",
            &format!(
                "{} accepted your reservation for {} x {}.",
                pharmacy.name, updated.quantity, medicine_name
            ),
            &updated.id,
        )
        .await;

        self.build_view(updated).await
    }

    /// 药房拒绝预约
    pub async fn reject(
        &self,
        actor: &AuthUser,
        id: &str,
        reason: Option<&str>,
    ) -> Result<ReservationView> {
        actor.require_role(&[Role::Pharmacy])?;
        let db = self.storage.get_db();
        let pharmacy = approved_pharmacy_for_user(db, &actor.id).await?;
        let model = self.find_for_pharmacy(&pharmacy, id).await?;
        let current = self.check_deadline(&model).await?;
        let next = current.apply(ReservationAction::Reject)?;

        let reason = optional_trimmed(reason);
        Self::transition(db, &model.id, current, next, reason.clone(), Some(Utc::now())).await?;
        info!("Reservation {} rejected by pharmacy {}", model.id, pharmacy.id);

        let updated = self.reload(&model.id).await?;
        let medicine_name = self.medicine_name(&updated.medicine_id).await;
        let message = match reason {
            Some(reason) => format!(
                "{} declined your reservation for {}: {}",
                pharmacy.name, medicine_name, reason
            ),
            None => format!(
                "{} declined your reservation for {}.",
                pharmacy.name, medicine_name
            ),
        };
        self.notify_quietly(
            &updated.patient_id,
            NotificationKind::ReservationRejected,
            "Reservation rejected",
            &message,
            &updated.id,
        )
        .await;

        self.build_view(updated).await
    }

    /// 患者取消预约；已接受的预约归还库存
    pub async fn cancel(&self, patient: &AuthUser, id: &str) -> Result<ReservationView> {
        patient.require_role(&[Role::Patient])?;
        let db = self.storage.get_db();
        let model = reservation::Entity::find_by_id(id.to_string())
            .filter(reservation::Column::PatientId.eq(patient.id.as_str()))
            .one(db)
            .await?
            .ok_or_else(|| MedifindError::not_found(format!("Reservation {} not found", id)))?;

        let current: ReservationStatus = parse_stored("reservation status", &model.status)?;
        let next = current.apply(ReservationAction::Cancel)?;

        // 已接受的预约需要归还库存
        let restore = if current == ReservationStatus::Accepted {
            Some(
                inventory::Entity::find()
                    .filter(inventory::Column::PharmacyId.eq(model.pharmacy_id.as_str()))
                    .filter(inventory::Column::MedicineId.eq(model.medicine_id.as_str()))
                    .one(db)
                    .await?,
            )
        } else {
            None
        };

        let txn = db.begin().await?;
        if let Some(stock) = restore {
            match stock {
                Some(row) => {
                    if shift_quantity(&txn, &row.id, model.quantity, self.low_stock_threshold)
                        .await?
                        .is_none()
                    {
                        return Err(MedifindError::conflict(format!(
                            "Cannot restore {} unit(s): stock quantity would overflow",
                            model.quantity
                        )));
                    }
                    debug!(
                        "Restored {} unit(s) for reservation {}",
                        model.quantity, model.id
                    );
                }
                None => warn!(
                    "Inventory row for reservation {} no longer exists, stock not restored",
                    model.id
                ),
            }
        }
        Self::transition(&txn, &model.id, current, next, None, None).await?;
        txn.commit().await?;

        info!("Reservation {} cancelled by patient {}", model.id, patient.id);

        let updated = self.reload(&model.id).await?;
        if let Some(pharmacy) = pharmacy::Entity::find_by_id(updated.pharmacy_id.clone())
            .one(db)
            .await?
        {
            let medicine_name = self.medicine_name(&updated.medicine_id).await;
            self.notify_quietly(
                &pharmacy.user_id,
                NotificationKind::ReservationCancelled,
                "Reservation cancelled",
                &format!(
                    "The patient cancelled the reservation for {} x {}.",
                    updated.quantity, medicine_name
                ),
                &updated.id,
            )
            .await;
        }

        self.build_view(updated).await
    }

    /// 按调用者角色列出预约：患者看自己的，药房看本店的，管理员看全部
    pub async fn list_for(
        &self,
        actor: &AuthUser,
        status: Option<ReservationStatus>,
    ) -> Result<Vec<ReservationView>> {
        let db = self.storage.get_db();
        let mut select = reservation::Entity::find();

        match actor.role {
            Role::Patient => {
                select = select.filter(reservation::Column::PatientId.eq(actor.id.as_str()));
            }
            Role::Pharmacy => {
                let pharmacy = pharmacy_for_user(db, &actor.id).await?;
                select = select.filter(reservation::Column::PharmacyId.eq(pharmacy.id));
            }
            Role::Admin => {}
        }
        if let Some(status) = status {
            select = select.filter(reservation::Column::Status.eq(status.as_ref()));
        }

        let models = select
            .order_by_desc(reservation::Column::CreatedAt)
            .all(db)
            .await?;
        self.build_views(models).await
    }

    /// 仅患者本人、所属药房和管理员可见，其他人 404
    pub async fn get(&self, actor: &AuthUser, id: &str) -> Result<ReservationView> {
        let db = self.storage.get_db();
        let not_found = || MedifindError::not_found(format!("Reservation {} not found", id));
        let model = reservation::Entity::find_by_id(id.to_string())
            .one(db)
            .await?
            .ok_or_else(not_found)?;

        let visible = match actor.role {
            Role::Admin => true,
            Role::Patient => model.patient_id == actor.id,
            Role::Pharmacy => pharmacy_for_user(db, &actor.id)
                .await
                .map(|p| p.id == model.pharmacy_id)
                .unwrap_or(false),
        };
        if !visible {
            return Err(not_found());
        }
        self.build_view(model).await
    }

    /// 将所有已过期的 PENDING 预约标记为 NO_RESPONSE，返回处理条数
    pub async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<u64> {
        let db = self.storage.get_db();
        let overdue = reservation::Entity::find()
            .filter(reservation::Column::Status.eq(ReservationStatus::Pending.as_ref()))
            .filter(reservation::Column::ExpiresAt.lte(now))
            .all(db)
            .await?;

        let mut expired = 0u64;
        for model in overdue {
            if self.expire_one(&model, now).await? {
                expired += 1;
            }
        }

        if expired > 0 {
            info!("Timeout sweep: {} reservation(s) moved to NO_RESPONSE", expired);
        }
        Ok(expired)
    }

    /// 单条超时处理；已被其他请求改变状态时返回 false
    async fn expire_one(&self, model: &reservation::Model, now: DateTime<Utc>) -> Result<bool> {
        let db = self.storage.get_db();
        let next = ReservationStatus::Pending.apply(ReservationAction::Expire)?;
        let result = reservation::Entity::update_many()
            .col_expr(reservation::Column::Status, Expr::value(next.to_string()))
            .col_expr(reservation::Column::UpdatedAt, Expr::value(now))
            .filter(reservation::Column::Id.eq(model.id.as_str()))
            .filter(reservation::Column::Status.eq(ReservationStatus::Pending.as_ref()))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Ok(false);
        }

        let medicine_name = self.medicine_name(&model.medicine_id).await;
        self.notify_quietly(
            &model.patient_id,
            NotificationKind::ReservationNoResponse,
            "No response from pharmacy",
            &format!(
                "The pharmacy did not respond to your reservation for {} in time.",
                medicine_name
            ),
            &model.id,
        )
        .await;

        if let Some(pharmacy) = pharmacy::Entity::find_by_id(model.pharmacy_id.clone())
            .one(db)
            .await?
        {
            self.notify_quietly(
                &pharmacy.user_id,
                NotificationKind::ReservationNoResponse,
                "Reservation expired",
                &format!(
                    "A reservation for {} x {} expired without a response.",
                    model.quantity, medicine_name
                ),
                &model.id,
            )
            .await;
        }
        Ok(true)
    }

    /// PENDING 且已过截止时间：先转为 NO_RESPONSE，再返回 409
    async fn check_deadline(&self, model: &reservation::Model) -> Result<ReservationStatus> {
        let current: ReservationStatus = parse_stored("reservation status", &model.status)?;
        let now = Utc::now();
        if current == ReservationStatus::Pending && model.expires_at <= now {
            self.expire_one(model, now).await?;
            return Err(MedifindError::invalid_transition(
                "Reservation expired before a response was given",
            ));
        }
        Ok(current)
    }

    /// 条件更新：只有状态仍为 `from` 时才写入
    async fn transition<C: ConnectionTrait>(
        conn: &C,
        id: &str,
        from: ReservationStatus,
        to: ReservationStatus,
        response_note: Option<String>,
        responded_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let now = Utc::now();
        let mut update = reservation::Entity::update_many()
            .col_expr(reservation::Column::Status, Expr::value(to.to_string()))
            .col_expr(reservation::Column::UpdatedAt, Expr::value(now));
        if let Some(note) = response_note {
            update = update.col_expr(reservation::Column::ResponseNote, Expr::value(note));
        }
        if let Some(at) = responded_at {
            update = update.col_expr(reservation::Column::RespondedAt, Expr::value(at));
        }

        let result = update
            .filter(reservation::Column::Id.eq(id))
            .filter(reservation::Column::Status.eq(from.as_ref()))
            .exec(conn)
            .await?;
        if result.rows_affected == 0 {
            return Err(MedifindError::invalid_transition(format!(
                "Reservation {} is no longer {}",
                id, from
            )));
        }
        Ok(())
    }

    async fn find_for_pharmacy(
        &self,
        pharmacy: &pharmacy::Model,
        id: &str,
    ) -> Result<reservation::Model> {
        reservation::Entity::find_by_id(id.to_string())
            .filter(reservation::Column::PharmacyId.eq(pharmacy.id.as_str()))
            .one(self.storage.get_db())
            .await?
            .ok_or_else(|| MedifindError::not_found(format!("Reservation {} not found", id)))
    }

    async fn reload(&self, id: &str) -> Result<reservation::Model> {
        reservation::Entity::find_by_id(id.to_string())
            .one(self.storage.get_db())
            .await?
            .ok_or_else(|| MedifindError::not_found(format!("Reservation {} not found", id)))
    }

    async fn medicine_name(&self, medicine_id: &str) -> String {
        find_medicine(self.storage.get_db(), medicine_id)
            .await
            .map(|m| m.name)
            .unwrap_or_else(|_| "medicine".to_string())
    }

    /// 通知写入失败不影响主流程
    async fn notify_quietly(
        &self,
        user_id: &str,
        kind: NotificationKind,
        title: &str,
        message: &str,
        reservation_id: &str,
    ) {
        if let Err(e) = self
            .notifications
            .notify(user_id, kind, title, message, Some(reservation_id))
            .await
        {
            warn!(
                "Failed to send {} for reservation {}: {}",
                kind, reservation_id, e
            );
        }
    }

    async fn build_view(&self, model: reservation::Model) -> Result<ReservationView> {
        let mut views = self.build_views(vec![model]).await?;
        views
            .pop()
            .ok_or_else(|| MedifindError::database_operation("Failed to build reservation view"))
    }

    async fn build_views(&self, models: Vec<reservation::Model>) -> Result<Vec<ReservationView>> {
        let db = self.storage.get_db();
        let users = users_by_ids(db, models.iter().map(|m| m.patient_id.as_str())).await?;
        let pharmacies =
            pharmacies_by_ids(db, models.iter().map(|m| m.pharmacy_id.as_str())).await?;
        let medicines = medicines_by_ids(db, models.iter().map(|m| m.medicine_id.as_str())).await?;

        models
            .into_iter()
            .map(|m| {
                let patient = users.get(&m.patient_id);
                Ok(ReservationView {
                    status: parse_stored("reservation status", &m.status)?,
                    patient_name: patient.map(|u| u.name.clone()).unwrap_or_default(),
                    patient_phone: patient.and_then(|u| u.phone.clone()),
                    pharmacy_name: pharmacies
                        .get(&m.pharmacy_id)
                        .map(|p| p.name.clone())
                        .unwrap_or_default(),
                    medicine_name: medicines
                        .get(&m.medicine_id)
                        .map(|x| x.name.clone())
                        .unwrap_or_default(),
                    id: m.id,
                    patient_id: m.patient_id,
                    pharmacy_id: m.pharmacy_id,
                    medicine_id: m.medicine_id,
                    quantity: m.quantity,
                    note: m.note,
                    response_note: m.response_note,
                    created_at: m.created_at,
                    expires_at: m.expires_at,
                    responded_at: m.responded_at,
                    updated_at: m.updated_at,
                })
            })
            .collect()
    }
}
