//! 药房目录与审核

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use ts_rs::TS;

use crate::api::types::TS_EXPORT_PATH;
use crate::errors::{MedifindError, Result};
use crate::models::NotificationKind;
use crate::storage::Storage;
use crate::utils::geo::is_valid_coordinate;
use crate::utils::validation::{is_valid_phone, optional_trimmed, require_non_empty};
use migration::entities::{inventory, pharmacy};

use super::NotificationService;
use super::inventory_service::InventoryItemView;
use super::lookup::{find_approved_pharmacy, lower_contains, medicines_by_ids};

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct PharmacyView {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub phone: String,
    pub license_number: String,
    pub latitude: f64,
    pub longitude: f64,
    pub opening_hours: Option<String>,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<pharmacy::Model> for PharmacyView {
    fn from(model: pharmacy::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            address: model.address,
            city: model.city,
            phone: model.phone,
            license_number: model.license_number,
            latitude: model.latitude,
            longitude: model.longitude,
            opening_hours: model.opening_hours,
            is_approved: model.is_approved,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// 注册药房账号时附带的资料
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct PharmacyDetails {
    pub name: String,
    pub address: String,
    pub city: String,
    pub phone: String,
    pub license_number: String,
    pub latitude: f64,
    pub longitude: f64,
    pub opening_hours: Option<String>,
}

impl PharmacyDetails {
    /// 校验并规范化（去除首尾空白）
    pub fn validated(&self) -> Result<PharmacyDetails> {
        let phone = require_non_empty("phone", &self.phone)?;
        if !is_valid_phone(&phone) {
            return Err(MedifindError::validation("Invalid pharmacy phone number"));
        }
        if !is_valid_coordinate(self.latitude, self.longitude) {
            return Err(MedifindError::validation(
                "Latitude must be within [-90, 90] and longitude within [-180, 180]",
            ));
        }
        Ok(PharmacyDetails {
            name: require_non_empty("name", &self.name)?,
            address: require_non_empty("address", &self.address)?,
            city: require_non_empty("city", &self.city)?,
            phone,
            license_number: require_non_empty("license_number", &self.license_number)?,
            latitude: self.latitude,
            longitude: self.longitude,
            opening_hours: optional_trimmed(self.opening_hours.as_deref()),
        })
    }
}

/// 公开药房列表筛选
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct PharmacyQuery {
    pub city: Option<String>,
    pub search: Option<String>,
}

pub struct PharmacyService {
    storage: Arc<Storage>,
    notifications: Arc<NotificationService>,
    low_stock_threshold: i32,
}

impl PharmacyService {
    pub fn new(
        storage: Arc<Storage>,
        notifications: Arc<NotificationService>,
        low_stock_threshold: i32,
    ) -> Self {
        Self {
            storage,
            notifications,
            low_stock_threshold,
        }
    }

    /// 已审核的药房，按名称排序
    pub async fn list_public(&self, query: &PharmacyQuery) -> Result<Vec<PharmacyView>> {
        let mut select =
            pharmacy::Entity::find().filter(pharmacy::Column::IsApproved.eq(true));

        if let Some(city) = optional_trimmed(query.city.as_deref()) {
            select = select.filter(lower_contains(pharmacy::Column::City, &city));
        }
        if let Some(search) = optional_trimmed(query.search.as_deref()) {
            select = select.filter(
                Condition::any()
                    .add(lower_contains(pharmacy::Column::Name, &search))
                    .add(lower_contains(pharmacy::Column::Address, &search)),
            );
        }

        Ok(select
            .order_by_asc(pharmacy::Column::Name)
            .all(self.storage.get_db())
            .await?
            .into_iter()
            .map(PharmacyView::from)
            .collect())
    }

    pub async fn get_public(&self, id: &str) -> Result<PharmacyView> {
        find_approved_pharmacy(self.storage.get_db(), id)
            .await
            .map(PharmacyView::from)
    }

    /// 公开的药房库存
    pub async fn public_inventory(&self, id: &str) -> Result<Vec<InventoryItemView>> {
        let db = self.storage.get_db();
        let pharmacy = find_approved_pharmacy(db, id).await?;

        let rows = inventory::Entity::find()
            .filter(inventory::Column::PharmacyId.eq(pharmacy.id.as_str()))
            .all(db)
            .await?;
        let medicines = medicines_by_ids(db, rows.iter().map(|r| r.medicine_id.as_str())).await?;

        let mut items: Vec<InventoryItemView> = rows
            .into_iter()
            .map(|row| InventoryItemView::build(row, &medicines, self.low_stock_threshold))
            .collect();
        items.sort_by(|a, b| a.medicine_name.cmp(&b.medicine_name));
        Ok(items)
    }

    /// 管理员视角：全部药房，可按审核状态筛选
    pub async fn list_all(&self, approved: Option<bool>) -> Result<Vec<PharmacyView>> {
        let mut select = pharmacy::Entity::find();
        if let Some(approved) = approved {
            select = select.filter(pharmacy::Column::IsApproved.eq(approved));
        }
        Ok(select
            .order_by_desc(pharmacy::Column::CreatedAt)
            .all(self.storage.get_db())
            .await?
            .into_iter()
            .map(PharmacyView::from)
            .collect())
    }

    /// 审核通过或暂停药房，并通知药房账号
    pub async fn set_approval(&self, id: &str, approved: bool) -> Result<PharmacyView> {
        let db = self.storage.get_db();
        let model = pharmacy::Entity::find_by_id(id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| MedifindError::not_found(format!("Pharmacy {} not found", id)))?;

        let user_id = model.user_id.clone();
        let mut active: pharmacy::ActiveModel = model.into();
        active.is_approved = Set(approved);
        active.updated_at = Set(Utc::now());
        let updated = active.update(db).await?;

        let (kind, title, message) = if approved {
            (
                NotificationKind::PharmacyApproved,
                "Pharmacy approved",
                format!(
                    "{} is now visible to patients and can manage inventory.",
                    updated.name
                ),
            )
        } else {
            (
                NotificationKind::PharmacySuspended,
                "Pharmacy suspended",
                format!(
                    "{} has been suspended and is hidden from search.",
                    updated.name
                ),
            )
        };
        // 审批已落库，通知失败只记录
        if let Err(e) = self
            .notifications
            .notify(&user_id, kind, title, &message, None)
            .await
        {
            warn!("Failed to send {} for pharmacy {}: {}", kind, updated.id, e);
        }

        info!(
            "Pharmacy {} approval set to {} ({})",
            updated.id, approved, updated.name
        );
        Ok(updated.into())
    }
}
