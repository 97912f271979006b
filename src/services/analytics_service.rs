//! 统计汇总
//!
//! 所有计数都在数据库中以 GROUP BY 聚合，这里只负责补零和计算比率。

use std::collections::BTreeMap;
use std::sync::Arc;

use sea_orm::{
    ColumnTrait, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, sea_query::Expr,
};
use serde::Serialize;
use strum::IntoEnumIterator;
use tracing::debug;
use ts_rs::TS;

use crate::api::types::TS_EXPORT_PATH;
use crate::errors::Result;
use crate::models::{ReservationStatus, Role, StockStatus};
use crate::storage::Storage;
use migration::entities::{direct_call, inventory, medicine, pharmacy, reservation, user};

use super::lookup::{medicines_by_ids, pharmacy_for_user};

const TOP_MEDICINES_LIMIT: u64 = 5;

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct TopMedicine {
    pub medicine_id: String,
    pub name: String,
    pub reservations: u64,
}

/// 管理员总览
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct AdminOverview {
    pub users_by_role: BTreeMap<String, u64>,
    pub total_users: u64,
    pub approved_pharmacies: u64,
    pub pending_pharmacies: u64,
    pub total_medicines: u64,
    pub reservations_by_status: BTreeMap<String, u64>,
    pub total_reservations: u64,
    pub total_calls: u64,
    /// 百分比，accepted / (accepted + rejected + no_response)
    pub acceptance_rate: f64,
    pub top_medicines: Vec<TopMedicine>,
}

/// 药房看板
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct PharmacyDashboard {
    pub pharmacy_id: String,
    pub inventory_by_status: BTreeMap<String, u64>,
    pub total_items: u64,
    pub reservations_by_status: BTreeMap<String, u64>,
    pub total_reservations: u64,
    pub total_calls: u64,
    /// 百分比，(accepted + rejected) / (accepted + rejected + no_response)
    pub response_rate: f64,
    pub top_medicines: Vec<TopMedicine>,
}

// ============ SeaORM DSL 辅助结构 ============

#[derive(Debug, FromQueryResult)]
struct GroupCount {
    key: String,
    count: i64,
}

#[derive(Debug, FromQueryResult)]
struct MedicineCount {
    medicine_id: String,
    count: i64,
}

/// 把分组结果补齐为包含所有枚举值的映射
fn fill_counts<I>(keys: I, rows: Vec<GroupCount>) -> BTreeMap<String, u64>
where
    I: Iterator<Item = String>,
{
    let mut counts: BTreeMap<String, u64> = keys.map(|k| (k, 0)).collect();
    for row in rows {
        *counts.entry(row.key).or_insert(0) += row.count.max(0) as u64;
    }
    counts
}

fn count_of(counts: &BTreeMap<String, u64>, status: ReservationStatus) -> u64 {
    counts.get(status.as_ref()).copied().unwrap_or(0)
}

fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    ((part as f64 / total as f64) * 1000.0).round() / 10.0
}

/// 已被处理或超时的预约中被接受的比例
pub fn acceptance_rate(by_status: &BTreeMap<String, u64>) -> f64 {
    let accepted = count_of(by_status, ReservationStatus::Accepted);
    let decided = accepted
        + count_of(by_status, ReservationStatus::Rejected)
        + count_of(by_status, ReservationStatus::NoResponse);
    percentage(accepted, decided)
}

/// 药房在截止前做出响应的比例
pub fn response_rate(by_status: &BTreeMap<String, u64>) -> f64 {
    let responded = count_of(by_status, ReservationStatus::Accepted)
        + count_of(by_status, ReservationStatus::Rejected);
    let decided = responded + count_of(by_status, ReservationStatus::NoResponse);
    percentage(responded, decided)
}

pub struct AnalyticsService {
    storage: Arc<Storage>,
}

impl AnalyticsService {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub async fn overview(&self) -> Result<AdminOverview> {
        let db = self.storage.get_db();

        let role_rows = user::Entity::find()
            .select_only()
            .column_as(user::Column::Role, "key")
            .column_as(user::Column::Id.count(), "count")
            .group_by(user::Column::Role)
            .into_model::<GroupCount>()
            .all(db)
            .await?;
        let users_by_role = fill_counts(Role::iter().map(|r| r.to_string()), role_rows);

        let approved_pharmacies = pharmacy::Entity::find()
            .filter(pharmacy::Column::IsApproved.eq(true))
            .count(db)
            .await?;
        let pending_pharmacies = pharmacy::Entity::find()
            .filter(pharmacy::Column::IsApproved.eq(false))
            .count(db)
            .await?;
        let total_medicines = medicine::Entity::find().count(db).await?;
        let total_calls = direct_call::Entity::find().count(db).await?;

        let status_rows = reservation::Entity::find()
            .select_only()
            .column_as(reservation::Column::Status, "key")
            .column_as(reservation::Column::Id.count(), "count")
            .group_by(reservation::Column::Status)
            .into_model::<GroupCount>()
            .all(db)
            .await?;
        let reservations_by_status =
            fill_counts(ReservationStatus::iter().map(|s| s.to_string()), status_rows);

        let top_medicines = self.top_medicines(None).await?;

        debug!("Analytics overview computed");

        Ok(AdminOverview {
            total_users: users_by_role.values().sum(),
            total_reservations: reservations_by_status.values().sum(),
            acceptance_rate: acceptance_rate(&reservations_by_status),
            users_by_role,
            approved_pharmacies,
            pending_pharmacies,
            total_medicines,
            reservations_by_status,
            total_calls,
            top_medicines,
        })
    }

    pub async fn pharmacy_dashboard(&self, user_id: &str) -> Result<PharmacyDashboard> {
        let db = self.storage.get_db();
        let pharmacy = pharmacy_for_user(db, user_id).await?;

        let stock_rows = inventory::Entity::find()
            .select_only()
            .column_as(inventory::Column::Status, "key")
            .column_as(inventory::Column::Id.count(), "count")
            .filter(inventory::Column::PharmacyId.eq(pharmacy.id.as_str()))
            .group_by(inventory::Column::Status)
            .into_model::<GroupCount>()
            .all(db)
            .await?;
        let inventory_by_status =
            fill_counts(StockStatus::iter().map(|s| s.to_string()), stock_rows);

        let status_rows = reservation::Entity::find()
            .select_only()
            .column_as(reservation::Column::Status, "key")
            .column_as(reservation::Column::Id.count(), "count")
            .filter(reservation::Column::PharmacyId.eq(pharmacy.id.as_str()))
            .group_by(reservation::Column::Status)
            .into_model::<GroupCount>()
            .all(db)
            .await?;
        let reservations_by_status =
            fill_counts(ReservationStatus::iter().map(|s| s.to_string()), status_rows);

        let total_calls = direct_call::Entity::find()
            .filter(direct_call::Column::PharmacyId.eq(pharmacy.id.as_str()))
            .count(db)
            .await?;

        let top_medicines = self.top_medicines(Some(&pharmacy.id)).await?;

        Ok(PharmacyDashboard {
            total_items: inventory_by_status.values().sum(),
            total_reservations: reservations_by_status.values().sum(),
            response_rate: response_rate(&reservations_by_status),
            pharmacy_id: pharmacy.id,
            inventory_by_status,
            reservations_by_status,
            total_calls,
            top_medicines,
        })
    }

    /// 预约次数最多的药品，可按药房过滤
    async fn top_medicines(&self, pharmacy_id: Option<&str>) -> Result<Vec<TopMedicine>> {
        let db = self.storage.get_db();
        let mut query = reservation::Entity::find()
            .select_only()
            .column(reservation::Column::MedicineId)
            .column_as(reservation::Column::Id.count(), "count");
        if let Some(pharmacy_id) = pharmacy_id {
            query = query.filter(reservation::Column::PharmacyId.eq(pharmacy_id));
        }

        let rows = query
            .group_by(reservation::Column::MedicineId)
            .order_by_desc(Expr::cust("count"))
            .limit(TOP_MEDICINES_LIMIT)
            .into_model::<MedicineCount>()
            .all(db)
            .await?;

        let names = medicines_by_ids(db, rows.iter().map(|r| r.medicine_id.as_str())).await?;
        Ok(rows
            .into_iter()
            .map(|r| TopMedicine {
                name: names
                    .get(&r.medicine_id)
                    .map(|m| m.name.clone())
                    .unwrap_or_default(),
                medicine_id: r.medicine_id,
                reservations: r.count.max(0) as u64,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(pairs: &[(ReservationStatus, u64)]) -> BTreeMap<String, u64> {
        pairs.iter().map(|(s, n)| (s.to_string(), *n)).collect()
    }

    #[test]
    fn test_fill_counts_adds_missing_keys() {
        let rows = vec![GroupCount {
            key: "PATIENT".to_string(),
            count: 3,
        }];
        let filled = fill_counts(Role::iter().map(|r| r.to_string()), rows);
        assert_eq!(filled.len(), 3);
        assert_eq!(filled["PATIENT"], 3);
        assert_eq!(filled["ADMIN"], 0);
    }

    #[test]
    fn test_acceptance_rate() {
        let by_status = counts(&[
            (ReservationStatus::Accepted, 3),
            (ReservationStatus::Rejected, 1),
            (ReservationStatus::NoResponse, 0),
            (ReservationStatus::Pending, 10),
            (ReservationStatus::Cancelled, 5),
        ]);
        assert_eq!(acceptance_rate(&by_status), 75.0);
    }

    #[test]
    fn test_response_rate_counts_no_response_against() {
        let by_status = counts(&[
            (ReservationStatus::Accepted, 1),
            (ReservationStatus::Rejected, 1),
            (ReservationStatus::NoResponse, 2),
        ]);
        assert_eq!(response_rate(&by_status), 50.0);
    }

    #[test]
    fn test_rates_are_zero_without_decisions() {
        let by_status = counts(&[(ReservationStatus::Pending, 4)]);
        assert_eq!(acceptance_rate(&by_status), 0.0);
        assert_eq!(response_rate(&by_status), 0.0);
    }

    #[test]
    fn test_percentage_rounds_to_one_decimal() {
        assert_eq!(percentage(1, 3), 33.3);
        assert_eq!(percentage(2, 3), 66.7);
    }
}
