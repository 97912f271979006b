//! 直拨电话记录

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::info;
use ts_rs::TS;

use crate::api::types::TS_EXPORT_PATH;
use crate::errors::Result;
use crate::models::{AuthUser, Role};
use crate::storage::Storage;
use crate::utils::generate_id;
use migration::entities::direct_call;

use super::lookup::{
    find_approved_pharmacy, find_medicine, medicines_by_ids, pharmacy_for_user, users_by_ids,
};

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct LogCallRequest {
    pub medicine_id: Option<String>,
}

/// 返回给拨号方的药房电话
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct CallTarget {
    pub call_id: String,
    pub pharmacy_id: String,
    pub pharmacy_name: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct CallLogEntry {
    pub id: String,
    pub patient_id: Option<String>,
    pub patient_name: Option<String>,
    pub medicine_id: Option<String>,
    pub medicine_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub struct CallService {
    storage: Arc<Storage>,
}

impl CallService {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// 记录一次直拨并返回药房电话；只有患者身份会被记录
    pub async fn log_call(
        &self,
        pharmacy_id: &str,
        medicine_id: Option<&str>,
        caller: Option<&AuthUser>,
    ) -> Result<CallTarget> {
        let db = self.storage.get_db();
        let pharmacy = find_approved_pharmacy(db, pharmacy_id).await?;

        let medicine_id = match medicine_id.map(str::trim).filter(|s| !s.is_empty()) {
            Some(id) => Some(find_medicine(db, id).await?.id),
            None => None,
        };
        let patient_id = caller.filter(|u| u.is(Role::Patient)).map(|u| u.id.clone());

        let call = direct_call::ActiveModel {
            id: Set(generate_id()),
            pharmacy_id: Set(pharmacy.id.clone()),
            patient_id: Set(patient_id),
            medicine_id: Set(medicine_id),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await?;

        info!("Direct call {} logged for pharmacy {}", call.id, pharmacy.id);

        Ok(CallTarget {
            call_id: call.id,
            pharmacy_id: pharmacy.id,
            pharmacy_name: pharmacy.name,
            phone: pharmacy.phone,
        })
    }

    /// 本药房的来电记录，最新的在前
    pub async fn list_calls(&self, user_id: &str) -> Result<Vec<CallLogEntry>> {
        let db = self.storage.get_db();
        let pharmacy = pharmacy_for_user(db, user_id).await?;

        let calls = direct_call::Entity::find()
            .filter(direct_call::Column::PharmacyId.eq(pharmacy.id))
            .order_by_desc(direct_call::Column::CreatedAt)
            .all(db)
            .await?;

        let patients = users_by_ids(db, calls.iter().filter_map(|c| c.patient_id.as_deref())).await?;
        let medicines =
            medicines_by_ids(db, calls.iter().filter_map(|c| c.medicine_id.as_deref())).await?;

        Ok(calls
            .into_iter()
            .map(|c| CallLogEntry {
                patient_name: c
                    .patient_id
                    .as_ref()
                    .and_then(|id| patients.get(id))
                    .map(|u| u.name.clone()),
                medicine_name: c
                    .medicine_id
                    .as_ref()
                    .and_then(|id| medicines.get(id))
                    .map(|m| m.name.clone()),
                id: c.id,
                patient_id: c.patient_id,
                medicine_id: c.medicine_id,
                created_at: c.created_at,
            })
            .collect())
    }
}
