//! 个人资料维护

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use serde::Deserialize;
use tracing::info;
use ts_rs::TS;

use crate::api::types::TS_EXPORT_PATH;
use crate::errors::{MedifindError, Result};
use crate::storage::Storage;
use crate::utils::geo::is_valid_coordinate;
use crate::utils::password::{hash_password, verify_password};
use crate::utils::validation::{
    is_valid_phone, optional_trimmed, require_non_empty, validate_password,
};
use migration::entities::{pharmacy, user};

use super::auth_service::UserView;
use super::lookup::{find_user, pharmacy_for_user};
use super::pharmacy_service::PharmacyView;

/// 未提供的字段保持不变；phone 传空串表示清除
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct UpdatePharmacyRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub opening_hours: Option<String>,
}

pub struct ProfileService {
    storage: Arc<Storage>,
    password_min_length: usize,
}

impl ProfileService {
    pub fn new(storage: Arc<Storage>, password_min_length: usize) -> Self {
        Self {
            storage,
            password_min_length,
        }
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<UserView> {
        UserView::try_from(find_user(self.storage.get_db(), user_id).await?)
    }

    pub async fn update_profile(
        &self,
        user_id: &str,
        req: &UpdateProfileRequest,
    ) -> Result<UserView> {
        let db = self.storage.get_db();
        let model = find_user(db, user_id).await?;
        let mut active: user::ActiveModel = model.into();

        if let Some(ref name) = req.name {
            active.name = Set(require_non_empty("name", name)?);
        }
        if let Some(ref phone) = req.phone {
            let phone = optional_trimmed(Some(phone));
            if let Some(ref p) = phone
                && !is_valid_phone(p)
            {
                return Err(MedifindError::validation("Invalid phone number"));
            }
            active.phone = Set(phone);
        }
        active.updated_at = Set(Utc::now());

        UserView::try_from(active.update(db).await?)
    }

    /// 当前密码错误返回 401
    pub async fn change_password(&self, user_id: &str, req: &ChangePasswordRequest) -> Result<()> {
        let db = self.storage.get_db();
        let model = find_user(db, user_id).await?;

        if !verify_password(&req.current_password, &model.password_hash)? {
            return Err(MedifindError::unauthorized("Current password is incorrect"));
        }
        validate_password(&req.new_password, self.password_min_length)?;

        let mut active: user::ActiveModel = model.into();
        active.password_hash = Set(hash_password(&req.new_password)?);
        active.updated_at = Set(Utc::now());
        active.update(db).await?;

        info!("Password changed for user {}", user_id);
        Ok(())
    }

    pub async fn update_pharmacy_profile(
        &self,
        user_id: &str,
        req: &UpdatePharmacyRequest,
    ) -> Result<PharmacyView> {
        let db = self.storage.get_db();
        let model = pharmacy_for_user(db, user_id).await?;

        let latitude = req.latitude.unwrap_or(model.latitude);
        let longitude = req.longitude.unwrap_or(model.longitude);
        if !is_valid_coordinate(latitude, longitude) {
            return Err(MedifindError::validation(
                "Latitude must be within [-90, 90] and longitude within [-180, 180]",
            ));
        }

        let mut active: pharmacy::ActiveModel = model.into();
        if let Some(ref name) = req.name {
            active.name = Set(require_non_empty("name", name)?);
        }
        if let Some(ref address) = req.address {
            active.address = Set(require_non_empty("address", address)?);
        }
        if let Some(ref city) = req.city {
            active.city = Set(require_non_empty("city", city)?);
        }
        if let Some(ref phone) = req.phone {
            let phone = require_non_empty("phone", phone)?;
            if !is_valid_phone(&phone) {
                return Err(MedifindError::validation("Invalid pharmacy phone number"));
            }
            active.phone = Set(phone);
        }
        if let Some(ref hours) = req.opening_hours {
            active.opening_hours = Set(optional_trimmed(Some(hours)));
        }
        active.latitude = Set(latitude);
        active.longitude = Set(longitude);
        active.updated_at = Set(Utc::now());

        Ok(active.update(db).await?.into())
    }
}
