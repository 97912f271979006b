//! 药房库存管理
//!
//! 库存状态在每次写入时由数量派生，阈值来自 `inventory.low_stock_threshold`。

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ExprTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait, sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use ts_rs::TS;

use crate::api::types::TS_EXPORT_PATH;
use crate::errors::{MedifindError, Result};
use crate::models::StockStatus;
use crate::storage::Storage;
use crate::utils::generate_id;
use migration::entities::{inventory, medicine};

use super::lookup::{approved_pharmacy_for_user, find_medicine, medicines_by_ids};

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct InventoryItemView {
    pub id: String,
    pub pharmacy_id: String,
    pub medicine_id: String,
    pub medicine_name: String,
    pub generic_name: Option<String>,
    pub category: Option<String>,
    pub quantity: i32,
    pub price: Option<f64>,
    pub status: StockStatus,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItemView {
    pub(crate) fn build(
        row: inventory::Model,
        medicines: &HashMap<String, medicine::Model>,
        low_stock_threshold: i32,
    ) -> Self {
        let medicine = medicines.get(&row.medicine_id);
        let status = row
            .status
            .parse()
            .unwrap_or_else(|_| StockStatus::from_quantity(row.quantity, low_stock_threshold));
        Self {
            medicine_name: medicine.map(|m| m.name.clone()).unwrap_or_default(),
            generic_name: medicine.and_then(|m| m.generic_name.clone()),
            category: medicine.map(|m| m.category.clone()),
            id: row.id,
            pharmacy_id: row.pharmacy_id,
            medicine_id: row.medicine_id,
            quantity: row.quantity,
            price: row.price,
            status,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct UpsertInventoryRequest {
    pub medicine_id: String,
    pub quantity: i32,
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct AdjustInventoryRequest {
    pub delta: i32,
}

/// 原子增减库存数量，并同步派生状态
///
/// 数量条件写在 UPDATE 的 WHERE 中：扣减要求余量足够，增加要求结果不超过 `i32::MAX`。
/// 条件不满足时返回 `None`，行保持不变。
pub(crate) async fn shift_quantity<C: ConnectionTrait>(
    conn: &C,
    item_id: &str,
    delta: i32,
    low_stock_threshold: i32,
) -> Result<Option<inventory::Model>> {
    let update = inventory::Entity::update_many()
        .col_expr(
            inventory::Column::Quantity,
            Expr::col(inventory::Column::Quantity).add(delta),
        )
        .col_expr(inventory::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(inventory::Column::Id.eq(item_id));
    let update = if delta < 0 {
        update.filter(inventory::Column::Quantity.gte(-(delta as i64)))
    } else {
        update.filter(inventory::Column::Quantity.lte(i32::MAX as i64 - delta as i64))
    };

    if update.exec(conn).await?.rows_affected == 0 {
        return Ok(None);
    }

    let Some(row) = inventory::Entity::find_by_id(item_id.to_string())
        .one(conn)
        .await?
    else {
        return Ok(None);
    };
    let status = StockStatus::from_quantity(row.quantity, low_stock_threshold).to_string();
    if row.status == status {
        return Ok(Some(row));
    }
    let mut active: inventory::ActiveModel = row.into();
    active.status = Set(status);
    Ok(Some(active.update(conn).await?))
}

pub struct InventoryService {
    storage: Arc<Storage>,
    low_stock_threshold: i32,
}

impl InventoryService {
    pub fn new(storage: Arc<Storage>, low_stock_threshold: i32) -> Self {
        Self {
            storage,
            low_stock_threshold,
        }
    }

    pub async fn list_own(
        &self,
        user_id: &str,
        status: Option<StockStatus>,
    ) -> Result<Vec<InventoryItemView>> {
        let db = self.storage.get_db();
        let pharmacy = approved_pharmacy_for_user(db, user_id).await?;

        let mut select =
            inventory::Entity::find().filter(inventory::Column::PharmacyId.eq(pharmacy.id));
        if let Some(status) = status {
            select = select.filter(inventory::Column::Status.eq(status.as_ref()));
        }
        let rows = select
            .order_by_desc(inventory::Column::UpdatedAt)
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

    /// 新建或覆盖 药房×药品 库存行
    pub async fn upsert(
        &self,
        user_id: &str,
        req: &UpsertInventoryRequest,
    ) -> Result<InventoryItemView> {
        if req.quantity < 0 {
            return Err(MedifindError::validation("Quantity must not be negative"));
        }
        if let Some(price) = req.price
            && (!price.is_finite() || price < 0.0)
        {
            return Err(MedifindError::validation("Price must not be negative"));
        }

        let db = self.storage.get_db();
        let pharmacy = approved_pharmacy_for_user(db, user_id).await?;
        let medicine = find_medicine(db, &req.medicine_id).await?;

        let existing = inventory::Entity::find()
            .filter(inventory::Column::PharmacyId.eq(pharmacy.id.as_str()))
            .filter(inventory::Column::MedicineId.eq(medicine.id.as_str()))
            .one(db)
            .await?;

        let status = StockStatus::from_quantity(req.quantity, self.low_stock_threshold);
        let now = Utc::now();

        let saved = match existing {
            Some(row) => {
                let mut active: inventory::ActiveModel = row.into();
                active.quantity = Set(req.quantity);
                active.price = Set(req.price);
                active.status = Set(status.to_string());
                active.updated_at = Set(now);
                active.update(db).await?
            }
            None => {
                inventory::ActiveModel {
                    id: Set(generate_id()),
                    pharmacy_id: Set(pharmacy.id.clone()),
                    medicine_id: Set(medicine.id.clone()),
                    quantity: Set(req.quantity),
                    price: Set(req.price),
                    status: Set(status.to_string()),
                    updated_at: Set(now),
                }
                .insert(db)
                .await?
            }
        };

        info!(
            "Inventory upserted: pharmacy={} medicine={} quantity={} status={}",
            pharmacy.id, medicine.name, saved.quantity, status
        );

        let medicines = HashMap::from([(medicine.id.clone(), medicine)]);
        Ok(InventoryItemView::build(
            saved,
            &medicines,
            self.low_stock_threshold,
        ))
    }

    /// 增减库存，结果不得小于 0
    pub async fn adjust_quantity(
        &self,
        user_id: &str,
        item_id: &str,
        delta: i32,
    ) -> Result<InventoryItemView> {
        let db = self.storage.get_db();
        let row = self.find_own_item(user_id, item_id).await?;

        let txn = db.begin().await?;
        let Some(saved) = shift_quantity(&txn, &row.id, delta, self.low_stock_threshold).await?
        else {
            return Err(MedifindError::validation(format!(
                "Adjustment of {} would take quantity out of range (current {})",
                delta, row.quantity
            )));
        };
        txn.commit().await?;

        info!(
            "Inventory item {} adjusted by {} (now {})",
            saved.id, delta, saved.quantity
        );

        let medicines = medicines_by_ids(db, [saved.medicine_id.as_str()]).await?;
        Ok(InventoryItemView::build(
            saved,
            &medicines,
            self.low_stock_threshold,
        ))
    }

    pub async fn delete(&self, user_id: &str, item_id: &str) -> Result<()> {
        let row = self.find_own_item(user_id, item_id).await?;
        inventory::Entity::delete_by_id(row.id)
            .exec(self.storage.get_db())
            .await?;
        info!("Inventory item {} deleted", item_id);
        Ok(())
    }

    /// 其他药房的库存一律 404
    async fn find_own_item(&self, user_id: &str, item_id: &str) -> Result<inventory::Model> {
        let db = self.storage.get_db();
        let pharmacy = approved_pharmacy_for_user(db, user_id).await?;
        inventory::Entity::find_by_id(item_id.to_string())
            .filter(inventory::Column::PharmacyId.eq(pharmacy.id))
            .one(db)
            .await?
            .ok_or_else(|| MedifindError::not_found(format!("Inventory item {} not found", item_id)))
    }
}
