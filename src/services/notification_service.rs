//! 站内通知服务
//!
//! 通知是按用户存储的消息队列，由预约、药房审核等流程写入。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, sea_query::Expr,
};
use serde::Serialize;
use tracing::{debug, info};
use ts_rs::TS;

use crate::api::types::TS_EXPORT_PATH;
use crate::errors::{MedifindError, Result};
use crate::models::{NotificationKind, Role, parse_stored};
use crate::storage::Storage;
use crate::utils::generate_id;
use migration::entities::{notification, user};

/// 单次列表的默认/最大条数
const DEFAULT_LIST_LIMIT: u64 = 50;
const MAX_LIST_LIMIT: u64 = 200;

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct NotificationView {
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub reservation_id: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<notification::Model> for NotificationView {
    type Error = MedifindError;

    fn try_from(model: notification::Model) -> Result<Self> {
        Ok(Self {
            kind: parse_stored("notification kind", &model.kind)?,
            id: model.id,
            title: model.title,
            message: model.message,
            reservation_id: model.reservation_id,
            is_read: model.is_read,
            created_at: model.created_at,
        })
    }
}

pub struct NotificationService {
    storage: Arc<Storage>,
}

impl NotificationService {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub async fn notify(
        &self,
        user_id: &str,
        kind: NotificationKind,
        title: &str,
        message: &str,
        reservation_id: Option<&str>,
    ) -> Result<()> {
        notification::ActiveModel {
            id: Set(generate_id()),
            user_id: Set(user_id.to_string()),
            kind: Set(kind.to_string()),
            title: Set(title.to_string()),
            message: Set(message.to_string()),
            reservation_id: Set(reservation_id.map(str::to_string)),
            is_read: Set(false),
            created_at: Set(Utc::now()),
        }
        .insert(self.storage.get_db())
        .await?;

        debug!("Notification {} queued for user {}", kind, user_id);
        Ok(())
    }

    /// 向某一角色的全部用户广播，返回写入条数
    pub async fn notify_role(
        &self,
        role: Role,
        kind: NotificationKind,
        title: &str,
        message: &str,
    ) -> Result<usize> {
        let db = self.storage.get_db();
        let recipients: Vec<String> = user::Entity::find()
            .select_only()
            .column(user::Column::Id)
            .filter(user::Column::Role.eq(role.as_ref()))
            .into_tuple()
            .all(db)
            .await?;

        if recipients.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let rows = recipients.iter().map(|user_id| notification::ActiveModel {
            id: Set(generate_id()),
            user_id: Set(user_id.clone()),
            kind: Set(kind.to_string()),
            title: Set(title.to_string()),
            message: Set(message.to_string()),
            reservation_id: Set(None),
            is_read: Set(false),
            created_at: Set(now),
        });
        notification::Entity::insert_many(rows).exec(db).await?;

        info!(
            "Broadcast {} to {} {} user(s)",
            kind,
            recipients.len(),
            role
        );
        Ok(recipients.len())
    }

    /// 最新的在前
    pub async fn list(
        &self,
        user_id: &str,
        unread_only: bool,
        limit: Option<u64>,
    ) -> Result<Vec<NotificationView>> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);

        let mut query = notification::Entity::find()
            .filter(notification::Column::UserId.eq(user_id));
        if unread_only {
            query = query.filter(notification::Column::IsRead.eq(false));
        }

        query
            .order_by_desc(notification::Column::CreatedAt)
            .order_by_desc(notification::Column::Id)
            .limit(limit)
            .all(self.storage.get_db())
            .await?
            .into_iter()
            .map(NotificationView::try_from)
            .collect()
    }

    pub async fn unread_count(&self, user_id: &str) -> Result<u64> {
        Ok(notification::Entity::find()
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .count(self.storage.get_db())
            .await?)
    }

    /// 只能标记自己的通知，其他人的视为不存在
    pub async fn mark_read(&self, user_id: &str, id: &str) -> Result<NotificationView> {
        let db = self.storage.get_db();
        let model = self.find_own(user_id, id).await?;

        let mut active: notification::ActiveModel = model.into();
        active.is_read = Set(true);
        let updated = active.update(db).await?;
        NotificationView::try_from(updated)
    }

    pub async fn mark_all_read(&self, user_id: &str) -> Result<u64> {
        let result = notification::Entity::update_many()
            .col_expr(notification::Column::IsRead, Expr::value(true))
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .exec(self.storage.get_db())
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn delete(&self, user_id: &str, id: &str) -> Result<()> {
        let model = self.find_own(user_id, id).await?;
        notification::Entity::delete_by_id(model.id)
            .exec(self.storage.get_db())
            .await?;
        Ok(())
    }

    async fn find_own(&self, user_id: &str, id: &str) -> Result<notification::Model> {
        notification::Entity::find_by_id(id.to_string())
            .filter(notification::Column::UserId.eq(user_id))
            .one(self.storage.get_db())
            .await?
            .ok_or_else(|| MedifindError::not_found(format!("Notification {} not found", id)))
    }
}
