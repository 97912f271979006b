//! 服务间共享的查询辅助函数

use std::collections::{HashMap, HashSet};

use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, ExprTrait, QueryFilter,
    sea_query::{Expr, Func},
};

use crate::errors::{MedifindError, Result};
use migration::entities::{medicine, pharmacy, user};

/// 不区分大小写的子串匹配条件
pub(crate) fn lower_contains<C>(column: C, needle: &str) -> Expr
where
    C: ColumnTrait,
{
    let pattern = format!("%{}%", needle.trim().to_lowercase());
    Expr::expr(Func::lower(Expr::col(column))).like(pattern)
}

/// 不区分大小写的相等条件
pub(crate) fn lower_eq<C>(column: C, value: &str) -> Expr
where
    C: ColumnTrait,
{
    Expr::expr(Func::lower(Expr::col(column))).eq(value.trim().to_lowercase())
}

pub(crate) async fn find_user<C: ConnectionTrait>(db: &C, id: &str) -> Result<user::Model> {
    user::Entity::find_by_id(id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| MedifindError::not_found(format!("User {} not found", id)))
}

pub(crate) async fn find_medicine<C: ConnectionTrait>(db: &C, id: &str) -> Result<medicine::Model> {
    medicine::Entity::find_by_id(id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| MedifindError::not_found(format!("Medicine {} not found", id)))
}

/// 查询用户名下的药房资料
pub(crate) async fn pharmacy_for_user<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
) -> Result<pharmacy::Model> {
    pharmacy::Entity::find()
        .filter(pharmacy::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| MedifindError::not_found("Pharmacy profile not found"))
}

/// 查询用户名下已审核的药房，未审核返回 403
pub(crate) async fn approved_pharmacy_for_user<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
) -> Result<pharmacy::Model> {
    let pharmacy = pharmacy_for_user(db, user_id).await?;
    if !pharmacy.is_approved {
        return Err(MedifindError::forbidden(
            "Pharmacy is pending approval by an administrator",
        ));
    }
    Ok(pharmacy)
}

/// 查询已审核的药房（公开接口），不存在或未审核均为 404
pub(crate) async fn find_approved_pharmacy<C: ConnectionTrait>(
    db: &C,
    id: &str,
) -> Result<pharmacy::Model> {
    pharmacy::Entity::find_by_id(id.to_string())
        .filter(pharmacy::Column::IsApproved.eq(true))
        .one(db)
        .await?
        .ok_or_else(|| MedifindError::not_found(format!("Pharmacy {} not found", id)))
}

fn unique_ids<'a>(ids: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    ids.into_iter()
        .collect::<HashSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

pub(crate) async fn medicines_by_ids<'a, C: ConnectionTrait>(
    db: &C,
    ids: impl IntoIterator<Item = &'a str>,
) -> Result<HashMap<String, medicine::Model>> {
    let ids = unique_ids(ids);
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(medicine::Entity::find()
        .filter(medicine::Column::Id.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|m| (m.id.clone(), m))
        .collect())
}

pub(crate) async fn pharmacies_by_ids<'a, C: ConnectionTrait>(
    db: &C,
    ids: impl IntoIterator<Item = &'a str>,
) -> Result<HashMap<String, pharmacy::Model>> {
    let ids = unique_ids(ids);
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(pharmacy::Entity::find()
        .filter(pharmacy::Column::Id.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|p| (p.id.clone(), p))
        .collect())
}

pub(crate) async fn users_by_ids<'a, C: ConnectionTrait>(
    db: &C,
    ids: impl IntoIterator<Item = &'a str>,
) -> Result<HashMap<String, user::Model>> {
    let ids = unique_ids(ids);
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(user::Entity::find()
        .filter(user::Column::Id.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id.clone(), u))
        .collect())
}
