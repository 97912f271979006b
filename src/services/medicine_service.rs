//! 药品目录

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use ts_rs::TS;

use crate::api::types::TS_EXPORT_PATH;
use crate::errors::{MedifindError, Result};
use crate::storage::Storage;
use crate::utils::generate_id;
use crate::utils::validation::{normalize_page, optional_trimmed, require_non_empty};
use migration::entities::{inventory, medicine, reservation};

use super::lookup::{find_medicine, lower_contains, lower_eq};

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct MedicineView {
    pub id: String,
    pub name: String,
    pub generic_name: Option<String>,
    pub category: String,
    pub description: Option<String>,
    pub manufacturer: Option<String>,
    pub requires_prescription: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<medicine::Model> for MedicineView {
    fn from(model: medicine::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            generic_name: model.generic_name,
            category: model.category,
            description: model.description,
            manufacturer: model.manufacturer,
            requires_prescription: model.requires_prescription,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct MedicineQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct NewMedicine {
    pub name: String,
    pub generic_name: Option<String>,
    pub category: String,
    pub description: Option<String>,
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub requires_prescription: bool,
}

/// 未提供的字段保持不变
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct MedicineUpdate {
    pub name: Option<String>,
    pub generic_name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub manufacturer: Option<String>,
    pub requires_prescription: Option<bool>,
}

/// 一页结果与总数
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(self.page_size.max(1))
    }
}

pub struct MedicineService {
    storage: Arc<Storage>,
}

impl MedicineService {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub async fn list(&self, query: &MedicineQuery) -> Result<Page<MedicineView>> {
        let (page, page_size) = normalize_page(query.page, query.page_size);

        let mut select = medicine::Entity::find();
        if let Some(search) = optional_trimmed(query.search.as_deref()) {
            select = select.filter(
                Condition::any()
                    .add(lower_contains(medicine::Column::Name, &search))
                    .add(lower_contains(medicine::Column::GenericName, &search)),
            );
        }
        if let Some(category) = optional_trimmed(query.category.as_deref()) {
            select = select.filter(medicine::Column::Category.eq(category));
        }

        let paginator = select
            .order_by_asc(medicine::Column::Name)
            .paginate(self.storage.get_db(), page_size);
        let total = paginator.num_items().await?;
        let items = paginator
            .fetch_page(page - 1)
            .await?
            .into_iter()
            .map(MedicineView::from)
            .collect();

        Ok(Page {
            items,
            page,
            page_size,
            total,
        })
    }

    pub async fn get(&self, id: &str) -> Result<MedicineView> {
        find_medicine(self.storage.get_db(), id)
            .await
            .map(MedicineView::from)
    }

    /// 去重后的分类列表（字母序）
    pub async fn categories(&self) -> Result<Vec<String>> {
        Ok(medicine::Entity::find()
            .select_only()
            .column(medicine::Column::Category)
            .distinct()
            .order_by_asc(medicine::Column::Category)
            .into_tuple::<String>()
            .all(self.storage.get_db())
            .await?)
    }

    pub async fn create(&self, req: &NewMedicine) -> Result<MedicineView> {
        let name = require_non_empty("name", &req.name)?;
        let category = require_non_empty("category", &req.category)?;
        self.ensure_name_free(&name, None).await?;

        let now = Utc::now();
        let model = medicine::ActiveModel {
            id: Set(generate_id()),
            name: Set(name),
            generic_name: Set(optional_trimmed(req.generic_name.as_deref())),
            category: Set(category),
            description: Set(optional_trimmed(req.description.as_deref())),
            manufacturer: Set(optional_trimmed(req.manufacturer.as_deref())),
            requires_prescription: Set(req.requires_prescription),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.storage.get_db())
        .await?;

        info!("Medicine created: {} ({})", model.name, model.id);
        Ok(model.into())
    }

    pub async fn update(&self, id: &str, req: &MedicineUpdate) -> Result<MedicineView> {
        let db = self.storage.get_db();
        let model = find_medicine(db, id).await?;
        let mut active: medicine::ActiveModel = model.into();

        if let Some(ref name) = req.name {
            let name = require_non_empty("name", name)?;
            self.ensure_name_free(&name, Some(id)).await?;
            active.name = Set(name);
        }
        if let Some(ref category) = req.category {
            active.category = Set(require_non_empty("category", category)?);
        }
        if let Some(ref generic_name) = req.generic_name {
            active.generic_name = Set(optional_trimmed(Some(generic_name)));
        }
        if let Some(ref description) = req.description {
            active.description = Set(optional_trimmed(Some(description)));
        }
        if let Some(ref manufacturer) = req.manufacturer {
            active.manufacturer = Set(optional_trimmed(Some(manufacturer)));
        }
        if let Some(requires_prescription) = req.requires_prescription {
            active.requires_prescription = Set(requires_prescription);
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(db).await?.into())
    }

    /// 被预约引用的药品不可删除；库存行随之删除
    pub async fn delete(&self, id: &str) -> Result<()> {
        let db = self.storage.get_db();
        let model = find_medicine(db, id).await?;

        let referenced = reservation::Entity::find()
            .filter(reservation::Column::MedicineId.eq(id))
            .count(db)
            .await?;
        if referenced > 0 {
            return Err(MedifindError::conflict(format!(
                "Medicine is referenced by {} reservation(s) and cannot be deleted",
                referenced
            )));
        }

        let txn = db.begin().await?;
        let removed = inventory::Entity::delete_many()
            .filter(inventory::Column::MedicineId.eq(id))
            .exec(&txn)
            .await?;
        medicine::Entity::delete_by_id(model.id.clone())
            .exec(&txn)
            .await?;
        txn.commit().await?;

        info!(
            "Medicine {} deleted along with {} inventory row(s)",
            model.name, removed.rows_affected
        );
        Ok(())
    }

    async fn ensure_name_free(&self, name: &str, except_id: Option<&str>) -> Result<()> {
        let mut select =
            medicine::Entity::find().filter(lower_eq(medicine::Column::Name, name));
        if let Some(id) = except_id {
            select = select.filter(medicine::Column::Id.ne(id));
        }
        if select.one(self.storage.get_db()).await?.is_some() {
            return Err(MedifindError::conflict(format!(
                "Medicine '{}' already exists",
                name
            )));
        }
        Ok(())
    }
}
