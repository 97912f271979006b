//! Inventory management, public pharmacy directory and search tests

mod common;

use medifind::errors::MedifindError;
use medifind::models::StockStatus;
use medifind::services::{PharmacyQuery, SearchQuery, UpsertInventoryRequest};

use common::*;

// =============================================================================
// Inventory
// =============================================================================

#[tokio::test]
async fn test_upsert_derives_status_and_overwrites() {
    let env = setup().await;
    let (owner, _) = pharmacy(&env, "ph@example.com").await;
    let medicine_id = medicine(&env, "Paracetamol").await;
    let inventory = &env.services.inventory;

    let first = inventory
        .upsert(
            &owner.id,
            &UpsertInventoryRequest {
                medicine_id: medicine_id.clone(),
                quantity: 50,
                price: Some(3.2),
            },
        )
        .await
        .unwrap();
    assert_eq!(first.status, StockStatus::InStock);
    assert_eq!(first.medicine_name, "Paracetamol");

    let second = inventory
        .upsert(
            &owner.id,
            &UpsertInventoryRequest {
                medicine_id: medicine_id.clone(),
                quantity: 0,
                price: None,
            },
        )
        .await
        .unwrap();
    // 同一药品只有一行
    assert_eq!(second.id, first.id);
    assert_eq!(second.status, StockStatus::OutOfStock);
    assert_eq!(second.price, None);

    let items = inventory.list_own(&owner.id, None).await.unwrap();
    assert_eq!(items.len(), 1);
    let out = inventory
        .list_own(&owner.id, Some(StockStatus::OutOfStock))
        .await
        .unwrap();
    assert_eq!(out.len(), 1);
}

#[tokio::test]
async fn test_upsert_validation() {
    let env = setup().await;
    let (owner, _) = pharmacy(&env, "ph@example.com").await;
    let medicine_id = medicine(&env, "Paracetamol").await;
    let inventory = &env.services.inventory;

    let negative = inventory
        .upsert(
            &owner.id,
            &UpsertInventoryRequest {
                medicine_id: medicine_id.clone(),
                quantity: -1,
                price: None,
            },
        )
        .await;
    assert!(matches!(negative, Err(MedifindError::Validation(_))));

    let bad_price = inventory
        .upsert(
            &owner.id,
            &UpsertInventoryRequest {
                medicine_id,
                quantity: 1,
                price: Some(-0.5),
            },
        )
        .await;
    assert!(matches!(bad_price, Err(MedifindError::Validation(_))));

    let unknown = inventory
        .upsert(
            &owner.id,
            &UpsertInventoryRequest {
                medicine_id: "missing".to_string(),
                quantity: 1,
                price: None,
            },
        )
        .await;
    assert!(matches!(unknown, Err(MedifindError::NotFound(_))));
}

#[tokio::test]
async fn test_unapproved_pharmacy_cannot_manage_inventory() {
    let env = setup().await;
    let (owner, _) = pharmacy_at(
        &env,
        "new@example.com",
        pharmacy_details("Waiting Room", "Springfield", 40.0, -75.0),
        false,
    )
    .await;
    let medicine_id = medicine(&env, "Paracetamol").await;

    let result = env
        .services
        .inventory
        .upsert(
            &owner.id,
            &UpsertInventoryRequest {
                medicine_id,
                quantity: 5,
                price: None,
            },
        )
        .await;
    assert!(matches!(result, Err(MedifindError::Forbidden(_))));
}

#[tokio::test]
async fn test_adjust_never_goes_negative() {
    let env = setup().await;
    let (owner, _) = pharmacy(&env, "ph@example.com").await;
    let medicine_id = medicine(&env, "Paracetamol").await;
    let item_id = stock(&env, &owner, &medicine_id, 6).await;
    let inventory = &env.services.inventory;

    let item = inventory.adjust_quantity(&owner.id, &item_id, -2).await.unwrap();
    assert_eq!(item.quantity, 4);
    assert_eq!(item.status, StockStatus::LowStock);

    let result = inventory.adjust_quantity(&owner.id, &item_id, -5).await;
    assert!(matches!(result, Err(MedifindError::Validation(_))));
    assert_eq!(quantity_of(&env, &owner, &medicine_id).await, 4);

    let item = inventory.adjust_quantity(&owner.id, &item_id, 10).await.unwrap();
    assert_eq!(item.quantity, 14);
    assert_eq!(item.status, StockStatus::InStock);

    let result = inventory.adjust_quantity(&owner.id, &item_id, i32::MAX).await;
    assert!(matches!(result, Err(MedifindError::Validation(_))));
    assert_eq!(quantity_of(&env, &owner, &medicine_id).await, 14);
}

#[tokio::test]
async fn test_foreign_inventory_is_not_found() {
    let env = setup().await;
    let (owner, _) = pharmacy(&env, "ph@example.com").await;
    let (other, _) = pharmacy_at(
        &env,
        "other@example.com",
        pharmacy_details("Other", "Springfield", 40.1, -75.1),
        true,
    )
    .await;
    let medicine_id = medicine(&env, "Paracetamol").await;
    let item_id = stock(&env, &owner, &medicine_id, 6).await;

    let result = env.services.inventory.delete(&other.id, &item_id).await;
    assert!(matches!(result, Err(MedifindError::NotFound(_))));

    env.services.inventory.delete(&owner.id, &item_id).await.unwrap();
    assert!(env.services.inventory.list_own(&owner.id, None).await.unwrap().is_empty());
}

// =============================================================================
// Public directory
// =============================================================================

#[tokio::test]
async fn test_unapproved_pharmacies_are_hidden() {
    let env = setup().await;
    let (_, approved_id) = pharmacy(&env, "ph@example.com").await;
    let (_, hidden_id) = pharmacy_at(
        &env,
        "new@example.com",
        pharmacy_details("Hidden", "Springfield", 40.0, -75.0),
        false,
    )
    .await;
    let pharmacies = &env.services.pharmacies;

    let listed = pharmacies.list_public(&PharmacyQuery::default()).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, approved_id);

    assert!(matches!(
        pharmacies.get_public(&hidden_id).await,
        Err(MedifindError::NotFound(_))
    ));
    assert!(matches!(
        pharmacies.public_inventory(&hidden_id).await,
        Err(MedifindError::NotFound(_))
    ));

    let all = pharmacies.list_all(None).await.unwrap();
    assert_eq!(all.len(), 2);
    let pending = pharmacies.list_all(Some(false)).await.unwrap();
    assert_eq!(pending[0].id, hidden_id);
}

#[tokio::test]
async fn test_list_public_filters_by_city() {
    let env = setup().await;
    pharmacy(&env, "ph@example.com").await;
    pharmacy_at(
        &env,
        "north@example.com",
        pharmacy_details("North Star", "Shelbyville", 41.0, -75.0),
        true,
    )
    .await;

    let listed = env
        .services
        .pharmacies
        .list_public(&PharmacyQuery {
            city: Some("shelby".to_string()),
            search: None,
        })
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "North Star");
}

// =============================================================================
// Search
// =============================================================================

#[tokio::test]
async fn test_search_orders_by_distance_and_respects_radius() {
    let env = setup().await;
    let (near, _) = pharmacy_at(
        &env,
        "near@example.com",
        pharmacy_details("Near", "Springfield", 40.01, -75.0),
        true,
    )
    .await;
    let (far, _) = pharmacy_at(
        &env,
        "far@example.com",
        pharmacy_details("Far", "Springfield", 40.2, -75.0),
        true,
    )
    .await;
    let (remote, _) = pharmacy_at(
        &env,
        "remote@example.com",
        pharmacy_details("Remote", "Capital City", 45.0, -75.0),
        true,
    )
    .await;
    let medicine_id = medicine(&env, "Paracetamol").await;
    stock(&env, &far, &medicine_id, 40).await;
    stock(&env, &near, &medicine_id, 2).await;
    stock(&env, &remote, &medicine_id, 40).await;

    let results = env
        .services
        .search
        .search(&SearchQuery {
            query: Some("paracet".to_string()),
            lat: Some(40.0),
            lng: Some(-75.0),
            ..Default::default()
        })
        .await
        .unwrap();

    // 默认半径 25km 排除 Remote
    let names: Vec<&str> = results.iter().map(|r| r.pharmacy.name.as_str()).collect();
    assert_eq!(names, vec!["Near", "Far"]);
    assert_eq!(results[0].status, StockStatus::LowStock);
    let first = results[0].distance_km.unwrap();
    let second = results[1].distance_km.unwrap();
    assert!(first < second);
    assert!(second < 25.0);
}

#[tokio::test]
async fn test_search_without_location_ranks_by_stock() {
    let env = setup().await;
    let (a, _) = pharmacy_at(
        &env,
        "a@example.com",
        pharmacy_details("Alpha", "Springfield", 40.0, -75.0),
        true,
    )
    .await;
    let (b, _) = pharmacy_at(
        &env,
        "b@example.com",
        pharmacy_details("Beta", "Springfield", 40.0, -75.0),
        true,
    )
    .await;
    let (c, _) = pharmacy_at(
        &env,
        "c@example.com",
        pharmacy_details("Gamma", "Springfield", 40.0, -75.0),
        true,
    )
    .await;
    let medicine_id = medicine(&env, "Ibuprofen").await;
    stock(&env, &a, &medicine_id, 0).await;
    stock(&env, &b, &medicine_id, 3).await;
    stock(&env, &c, &medicine_id, 30).await;

    let search = &env.services.search;
    let all = search
        .search(&SearchQuery {
            medicine_id: Some(medicine_id.clone()),
            ..Default::default()
        })
        .await
        .unwrap();
    let statuses: Vec<StockStatus> = all.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![
            StockStatus::InStock,
            StockStatus::LowStock,
            StockStatus::OutOfStock
        ]
    );
    assert!(all.iter().all(|r| r.distance_km.is_none()));

    let available = search
        .search(&SearchQuery {
            medicine_id: Some(medicine_id),
            in_stock_only: true,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(available.len(), 2);
}

#[tokio::test]
async fn test_search_rejects_half_coordinates_and_skips_unapproved() {
    let env = setup().await;
    let (hidden, _) = pharmacy_at(
        &env,
        "hidden@example.com",
        pharmacy_details("Hidden", "Springfield", 40.0, -75.0),
        true,
    )
    .await;
    let medicine_id = medicine(&env, "Loratadine").await;
    stock(&env, &hidden, &medicine_id, 30).await;

    let search = &env.services.search;
    let result = search
        .search(&SearchQuery {
            lat: Some(40.0),
            ..Default::default()
        })
        .await;
    assert!(matches!(result, Err(MedifindError::Validation(_))));

    // 暂停后不再出现在搜索结果中
    let pharmacy_id = env.services.pharmacies.list_all(None).await.unwrap()[0].id.clone();
    env.services
        .pharmacies
        .set_approval(&pharmacy_id, false)
        .await
        .unwrap();
    let results = search
        .search(&SearchQuery {
            query: Some("lora".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(results.is_empty());
}
