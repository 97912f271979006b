//! 管理员的用户管理

use std::sync::Arc;

use sea_orm::{ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde::Deserialize;
use tracing::info;
use ts_rs::TS;

use crate::api::types::TS_EXPORT_PATH;
use crate::errors::{MedifindError, Result};
use crate::models::Role;
use crate::storage::Storage;
use crate::utils::validation::{normalize_page, optional_trimmed};
use migration::entities::user;

use super::auth_service::UserView;
use super::lookup::{find_user, lower_contains};
use super::medicine_service::Page;

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct UserQuery {
    pub role: Option<Role>,
    /// 匹配邮箱或姓名
    pub search: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

pub struct AdminService {
    storage: Arc<Storage>,
}

impl AdminService {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub async fn list_users(&self, query: &UserQuery) -> Result<Page<UserView>> {
        let (page, page_size) = normalize_page(query.page, query.page_size);

        let mut select = user::Entity::find();
        if let Some(role) = query.role {
            select = select.filter(user::Column::Role.eq(role.as_ref()));
        }
        if let Some(search) = optional_trimmed(query.search.as_deref()) {
            select = select.filter(
                Condition::any()
                    .add(lower_contains(user::Column::Email, &search))
                    .add(lower_contains(user::Column::Name, &search)),
            );
        }

        let paginator = select
            .order_by_desc(user::Column::CreatedAt)
            .paginate(self.storage.get_db(), page_size);
        let total = paginator.num_items().await?;
        let items = paginator
            .fetch_page(page - 1)
            .await?
            .into_iter()
            .map(UserView::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(Page {
            items,
            page,
            page_size,
            total,
        })
    }

    /// 删除用户，关联的药房、库存、预约和通知由外键级联删除
    pub async fn delete_user(&self, actor_id: &str, id: &str) -> Result<()> {
        if actor_id == id {
            return Err(MedifindError::validation(
                "Administrators cannot delete their own account",
            ));
        }

        let db = self.storage.get_db();
        let target = find_user(db, id).await?;
        user::Entity::delete_by_id(target.id.clone()).exec(db).await?;

        info!("User {} ({}) deleted by admin {}", target.id, target.email, actor_id);
        Ok(())
    }
}
