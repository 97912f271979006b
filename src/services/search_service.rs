//! 药品可用性检索
//!
//! 只返回已审核药房的库存。给出参考坐标时按 haversine 距离过滤排序，
//! 否则按库存状态、药房名称排序。

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QuerySelect};
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::api::types::TS_EXPORT_PATH;
use crate::config::SearchConfig;
use crate::errors::{MedifindError, Result};
use crate::models::StockStatus;
use crate::storage::Storage;
use crate::utils::geo::{haversine_km, is_valid_coordinate};
use crate::utils::validation::optional_trimmed;
use migration::entities::{inventory, medicine, pharmacy};

use super::lookup::{lower_contains, medicines_by_ids};

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct SearchQuery {
    /// 匹配药品名或通用名
    #[serde(alias = "q")]
    pub query: Option<String>,
    pub medicine_id: Option<String>,
    pub city: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius_km: Option<f64>,
    #[serde(default)]
    pub in_stock_only: bool,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct MedicineSummary {
    pub id: String,
    pub name: String,
    pub generic_name: Option<String>,
    pub category: String,
    pub requires_prescription: bool,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct PharmacySummary {
    pub id: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub phone: String,
    pub latitude: f64,
    pub longitude: f64,
    pub opening_hours: Option<String>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct AvailabilityEntry {
    pub inventory_id: String,
    pub medicine: MedicineSummary,
    pub pharmacy: PharmacySummary,
    pub quantity: i32,
    pub price: Option<f64>,
    pub status: StockStatus,
    pub distance_km: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

/// 校验后的参考点与半径
#[derive(Debug, Clone, Copy)]
struct Origin {
    lat: f64,
    lng: f64,
    radius_km: f64,
}

pub struct SearchService {
    storage: Arc<Storage>,
    settings: SearchConfig,
    low_stock_threshold: i32,
}

impl SearchService {
    pub fn new(storage: Arc<Storage>, settings: SearchConfig, low_stock_threshold: i32) -> Self {
        Self {
            storage,
            settings,
            low_stock_threshold,
        }
    }

    fn parse_origin(&self, query: &SearchQuery) -> Result<Option<Origin>> {
        let (lat, lng) = match (query.lat, query.lng) {
            (None, None) => return Ok(None),
            (Some(lat), Some(lng)) => (lat, lng),
            _ => {
                return Err(MedifindError::validation(
                    "lat and lng must be provided together",
                ));
            }
        };
        if !is_valid_coordinate(lat, lng) {
            return Err(MedifindError::validation(
                "Latitude must be within [-90, 90] and longitude within [-180, 180]",
            ));
        }
        let radius_km = query.radius_km.unwrap_or(self.settings.default_radius_km);
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(MedifindError::validation("radius_km must be positive"));
        }
        Ok(Some(Origin {
            lat,
            lng,
            radius_km,
        }))
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<AvailabilityEntry>> {
        let origin = self.parse_origin(query)?;
        let db = self.storage.get_db();

        // 1. 候选药品
        let text = optional_trimmed(query.query.as_deref());
        let medicine_id = optional_trimmed(query.medicine_id.as_deref());
        let medicine_filter: Option<Vec<String>> = if text.is_some() || medicine_id.is_some() {
            let mut select = medicine::Entity::find().select_only().column(medicine::Column::Id);
            if let Some(ref id) = medicine_id {
                select = select.filter(medicine::Column::Id.eq(id.as_str()));
            }
            if let Some(ref text) = text {
                select = select.filter(
                    Condition::any()
                        .add(lower_contains(medicine::Column::Name, text))
                        .add(lower_contains(medicine::Column::GenericName, text)),
                );
            }
            let ids: Vec<String> = select.into_tuple().all(db).await?;
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            Some(ids)
        } else {
            None
        };

        // 2. 已审核药房
        let mut pharmacy_select =
            pharmacy::Entity::find().filter(pharmacy::Column::IsApproved.eq(true));
        if let Some(city) = optional_trimmed(query.city.as_deref()) {
            pharmacy_select = pharmacy_select.filter(lower_contains(pharmacy::Column::City, &city));
        }
        let pharmacies: std::collections::HashMap<String, pharmacy::Model> = pharmacy_select
            .all(db)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();
        if pharmacies.is_empty() {
            return Ok(Vec::new());
        }

        // 3. 库存行
        let mut inventory_select = inventory::Entity::find()
            .filter(inventory::Column::PharmacyId.is_in(pharmacies.keys().cloned()));
        if let Some(ids) = medicine_filter {
            inventory_select = inventory_select.filter(inventory::Column::MedicineId.is_in(ids));
        }
        if query.in_stock_only {
            inventory_select = inventory_select.filter(inventory::Column::Quantity.gt(0));
        }
        let rows = inventory_select.all(db).await?;
        let medicines = medicines_by_ids(db, rows.iter().map(|r| r.medicine_id.as_str())).await?;

        let entries: Vec<AvailabilityEntry> = rows
            .into_iter()
            .filter_map(|row| {
                let pharmacy = pharmacies.get(&row.pharmacy_id)?;
                let medicine = medicines.get(&row.medicine_id)?;
                let status = StockStatus::from_quantity(row.quantity, self.low_stock_threshold);
                Some(AvailabilityEntry {
                    inventory_id: row.id,
                    medicine: MedicineSummary {
                        id: medicine.id.clone(),
                        name: medicine.name.clone(),
                        generic_name: medicine.generic_name.clone(),
                        category: medicine.category.clone(),
                        requires_prescription: medicine.requires_prescription,
                    },
                    pharmacy: PharmacySummary {
                        id: pharmacy.id.clone(),
                        name: pharmacy.name.clone(),
                        address: pharmacy.address.clone(),
                        city: pharmacy.city.clone(),
                        phone: pharmacy.phone.clone(),
                        latitude: pharmacy.latitude,
                        longitude: pharmacy.longitude,
                        opening_hours: pharmacy.opening_hours.clone(),
                    },
                    quantity: row.quantity,
                    price: row.price,
                    status,
                    distance_km: None,
                    updated_at: row.updated_at,
                })
            })
            .collect();

        let results = rank_entries(
            entries,
            origin,
            query.in_stock_only,
            self.settings.max_results,
        );
        debug!("Search returned {} availability entries", results.len());
        Ok(results)
    }
}

/// 计算距离、过滤半径与缺货项并排序
fn rank_entries(
    mut entries: Vec<AvailabilityEntry>,
    origin: Option<Origin>,
    in_stock_only: bool,
    max_results: usize,
) -> Vec<AvailabilityEntry> {
    if in_stock_only {
        entries.retain(|e| e.status.is_available());
    }

    match origin {
        Some(origin) => {
            for entry in &mut entries {
                entry.distance_km = Some(haversine_km(
                    origin.lat,
                    origin.lng,
                    entry.pharmacy.latitude,
                    entry.pharmacy.longitude,
                ));
            }
            entries.retain(|e| e.distance_km.is_some_and(|d| d <= origin.radius_km));
            entries.sort_by(|a, b| {
                a.distance_km
                    .partial_cmp(&b.distance_km)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.status.sort_rank().cmp(&b.status.sort_rank()))
            });
        }
        None => {
            entries.sort_by(|a, b| {
                a.status
                    .sort_rank()
                    .cmp(&b.status.sort_rank())
                    .then_with(|| a.pharmacy.name.cmp(&b.pharmacy.name))
            });
        }
    }

    entries.truncate(max_results);
    entries
}
