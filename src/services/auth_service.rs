//! 注册、登录与令牌签发

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use ts_rs::TS;

use crate::api::jwt::get_jwt_service;
use crate::api::types::TS_EXPORT_PATH;
use crate::errors::{MedifindError, Result};
use crate::models::{NotificationKind, Role, parse_stored};
use crate::storage::Storage;
use crate::utils::generate_id;
use crate::utils::password::{hash_password, verify_against_placeholder, verify_password};
use crate::utils::validation::{
    is_valid_email, is_valid_phone, normalize_email, optional_trimmed, require_non_empty,
    validate_password,
};
use migration::entities::{pharmacy, user};

use super::NotificationService;
use super::lookup::find_user;
use super::pharmacy_service::{PharmacyDetails, PharmacyView};

/// 对外展示的用户信息（不含密码哈希）
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct UserView {
    pub id: String,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<user::Model> for UserView {
    type Error = MedifindError;

    fn try_from(model: user::Model) -> Result<Self> {
        Ok(Self {
            role: parse_stored("role", &model.role)?,
            id: model.id,
            email: model.email,
            name: model.name,
            phone: model.phone,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: Role,
    /// role 为 PHARMACY 时必填
    pub pharmacy: Option<PharmacyDetails>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct MeResponse {
    pub user: UserView,
    pub pharmacy: Option<PharmacyView>,
}

/// 一次登录/刷新签发的令牌
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct AuthService {
    storage: Arc<Storage>,
    notifications: Arc<NotificationService>,
    password_min_length: usize,
}

impl AuthService {
    pub fn new(
        storage: Arc<Storage>,
        notifications: Arc<NotificationService>,
        password_min_length: usize,
    ) -> Self {
        Self {
            storage,
            notifications,
            password_min_length,
        }
    }

    /// 自助注册（PATIENT / PHARMACY）
    pub async fn register(&self, req: &RegisterRequest) -> Result<MeResponse> {
        if !req.role.can_self_register() {
            return Err(MedifindError::forbidden(
                "Administrator accounts cannot be self-registered",
            ));
        }

        let email = normalize_email(&req.email);
        if !is_valid_email(&email) {
            return Err(MedifindError::validation("Invalid email address"));
        }
        validate_password(&req.password, self.password_min_length)?;
        let name = require_non_empty("name", &req.name)?;
        let phone = optional_trimmed(req.phone.as_deref());
        if let Some(ref phone) = phone
            && !is_valid_phone(phone)
        {
            return Err(MedifindError::validation("Invalid phone number"));
        }

        let details = match (req.role, &req.pharmacy) {
            (Role::Pharmacy, Some(details)) => Some(details.validated()?),
            (Role::Pharmacy, None) => {
                return Err(MedifindError::validation(
                    "Pharmacy details are required for pharmacy registration",
                ));
            }
            _ => None,
        };

        let db = self.storage.get_db();
        if user::Entity::find()
            .filter(user::Column::Email.eq(email.as_str()))
            .one(db)
            .await?
            .is_some()
        {
            return Err(MedifindError::conflict("Email is already registered"));
        }
        if let Some(ref details) = details
            && pharmacy::Entity::find()
                .filter(pharmacy::Column::LicenseNumber.eq(details.license_number.as_str()))
                .one(db)
                .await?
                .is_some()
        {
            return Err(MedifindError::conflict(
                "License number is already registered",
            ));
        }

        let password_hash = hash_password(&req.password)?;
        let now = Utc::now();

        let txn = db.begin().await?;
        let user = user::ActiveModel {
            id: Set(generate_id()),
            email: Set(email),
            password_hash: Set(password_hash),
            name: Set(name),
            phone: Set(phone),
            role: Set(req.role.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let pharmacy = match details {
            Some(details) => Some(
                pharmacy::ActiveModel {
                    id: Set(generate_id()),
                    user_id: Set(user.id.clone()),
                    name: Set(details.name),
                    address: Set(details.address),
                    city: Set(details.city),
                    phone: Set(details.phone),
                    license_number: Set(details.license_number),
                    latitude: Set(details.latitude),
                    longitude: Set(details.longitude),
                    opening_hours: Set(details.opening_hours),
                    is_approved: Set(false),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(&txn)
                .await?,
            ),
            None => None,
        };
        txn.commit().await?;

        info!("User registered: {} ({})", user.email, user.role);

        if let Some(ref pharmacy) = pharmacy {
            let message = format!(
                "{} ({}) registered and is awaiting approval.",
                pharmacy.name, pharmacy.city
            );
            if let Err(e) = self
                .notifications
                .notify_role(
                    Role::Admin,
                    NotificationKind::PharmacyRegistered,
                    "New pharmacy registration",
                    &message,
                )
                .await
            {
                warn!("Failed to notify admins about pharmacy {}: {}", pharmacy.id, e);
            }
        }

        Ok(MeResponse {
            user: UserView::try_from(user)?,
            pharmacy: pharmacy.map(PharmacyView::from),
        })
    }

    /// 校验邮箱和密码，成功后签发令牌
    pub async fn login(&self, email: &str, password: &str) -> Result<(UserView, TokenPair)> {
        let email = normalize_email(email);
        let invalid = || MedifindError::unauthorized("Invalid email or password");

        let Some(user) = user::Entity::find()
            .filter(user::Column::Email.eq(email.as_str()))
            .one(self.storage.get_db())
            .await?
        else {
            verify_against_placeholder(password);
            info!("Login failed for unknown account {}", email);
            return Err(invalid());
        };

        if !verify_password(password, &user.password_hash)? {
            info!("Login failed for {}", email);
            return Err(invalid());
        }

        let view = UserView::try_from(user)?;
        let tokens = Self::issue_tokens(&view.id, view.role)?;
        info!("Login successful: {} ({})", view.email, view.role);
        Ok((view, tokens))
    }

    /// 用 refresh token 换取新的令牌对
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let claims = get_jwt_service()
            .validate_refresh_token(refresh_token)
            .map_err(|e| MedifindError::unauthorized(format!("Invalid refresh token: {}", e)))?;

        // 角色以数据库为准，账号被删除后刷新失败
        let user = user::Entity::find_by_id(claims.sub.clone())
            .one(self.storage.get_db())
            .await?
            .ok_or_else(|| MedifindError::unauthorized("Account no longer exists"))?;
        let role: Role = parse_stored("role", &user.role)?;

        Self::issue_tokens(&user.id, role)
    }

    pub async fn me(&self, user_id: &str) -> Result<MeResponse> {
        let db = self.storage.get_db();
        let user = find_user(db, user_id)
            .await
            .map_err(|_| MedifindError::unauthorized("Account no longer exists"))?;
        let view = UserView::try_from(user)?;

        let pharmacy = if view.role == Role::Pharmacy {
            pharmacy::Entity::find()
                .filter(pharmacy::Column::UserId.eq(user_id))
                .one(db)
                .await?
                .map(PharmacyView::from)
        } else {
            None
        };

        Ok(MeResponse {
            user: view,
            pharmacy,
        })
    }

    /// 创建管理员账号（CLI 与启动引导使用）
    pub async fn create_admin(&self, email: &str, password: &str, name: &str) -> Result<UserView> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(MedifindError::validation("Invalid email address"));
        }
        validate_password(password, self.password_min_length)?;
        let name = require_non_empty("name", name)?;

        let db = self.storage.get_db();
        if user::Entity::find()
            .filter(user::Column::Email.eq(email.as_str()))
            .one(db)
            .await?
            .is_some()
        {
            return Err(MedifindError::conflict("Email is already registered"));
        }

        let now = Utc::now();
        let user = user::ActiveModel {
            id: Set(generate_id()),
            email: Set(email),
            password_hash: Set(hash_password(password)?),
            name: Set(name),
            phone: Set(None),
            role: Set(Role::Admin.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        info!("Administrator account created: {}", user.email);
        UserView::try_from(user)
    }

    /// 确保引导管理员存在，返回是否新建
    pub async fn ensure_admin(&self, email: &str, password: &str) -> Result<bool> {
        let exists = user::Entity::find()
            .filter(user::Column::Email.eq(normalize_email(email)))
            .one(self.storage.get_db())
            .await?
            .is_some();
        if exists {
            return Ok(false);
        }
        self.create_admin(email, password, "Administrator").await?;
        Ok(true)
    }

    fn issue_tokens(user_id: &str, role: Role) -> Result<TokenPair> {
        let jwt = get_jwt_service();
        Ok(TokenPair {
            access_token: jwt.generate_access_token(user_id, role)?,
            refresh_token: jwt.generate_refresh_token(user_id, role)?,
        })
    }
}
