//! Shared test fixtures: temp SQLite database plus seeded accounts.

#![allow(dead_code)]

use std::sync::Arc;

use medifind::config::{StaticConfig, replace_config};
use medifind::models::{AuthUser, Role};
use medifind::services::{
    NewMedicine, PharmacyDetails, RegisterRequest, Services, UpsertInventoryRequest,
};
use medifind::storage::Storage;
use tempfile::TempDir;

pub const PASSWORD: &str = "correct-horse-battery";

// =============================================================================
// Environment
// =============================================================================

pub struct TestEnv {
    pub services: Services,
    // 保持临时目录存活直到测试结束
    _dir: TempDir,
}

pub fn test_config() -> StaticConfig {
    let mut config = StaticConfig::default();
    config.auth.jwt_secret = "integration-test-secret-0123456789abcdef".to_string();
    config.reservation.timeout_minutes = 30;
    config.reservation.max_quantity = 10;
    config.inventory.low_stock_threshold = 5;
    config
}

pub async fn setup() -> TestEnv {
    setup_with(test_config()).await
}

pub async fn setup_with(mut config: StaticConfig) -> TestEnv {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("medifind_test.db");
    config.database.database_url = format!("sqlite://{}?mode=rwc", db_path.display());
    config.database.pool_size = 4;
    replace_config(config.clone());

    let storage = Arc::new(
        Storage::connect(&config.database)
            .await
            .expect("Failed to create storage"),
    );
    TestEnv {
        services: Services::new(storage, &config),
        _dir: dir,
    }
}

// =============================================================================
// Seed helpers
// =============================================================================

pub async fn patient(env: &TestEnv, email: &str) -> AuthUser {
    let me = env
        .services
        .auth
        .register(&RegisterRequest {
            email: email.to_string(),
            password: PASSWORD.to_string(),
            name: "Test Patient".to_string(),
            phone: Some("+1 555 0100".to_string()),
            role: Role::Patient,
            pharmacy: None,
        })
        .await
        .expect("register patient");
    AuthUser::new(me.user.id, Role::Patient)
}

pub fn pharmacy_details(name: &str, city: &str, lat: f64, lng: f64) -> PharmacyDetails {
    PharmacyDetails {
        name: name.to_string(),
        address: "1 Main Street".to_string(),
        city: city.to_string(),
        phone: "+1 555 0199".to_string(),
        license_number: format!("LIC-{}", name.replace(' ', "-")),
        latitude: lat,
        longitude: lng,
        opening_hours: Some("08:00-20:00".to_string()),
    }
}

/// 注册药房账号，返回 (账号, 药房 ID)；approved 为 true 时同时审批
pub async fn pharmacy_at(
    env: &TestEnv,
    email: &str,
    details: PharmacyDetails,
    approved: bool,
) -> (AuthUser, String) {
    let me = env
        .services
        .auth
        .register(&RegisterRequest {
            email: email.to_string(),
            password: PASSWORD.to_string(),
            name: "Pharmacist".to_string(),
            phone: None,
            role: Role::Pharmacy,
            pharmacy: Some(details),
        })
        .await
        .expect("register pharmacy");
    let pharmacy_id = me.pharmacy.expect("pharmacy profile").id;
    if approved {
        env.services
            .pharmacies
            .set_approval(&pharmacy_id, true)
            .await
            .expect("approve pharmacy");
    }
    (AuthUser::new(me.user.id, Role::Pharmacy), pharmacy_id)
}

pub async fn pharmacy(env: &TestEnv, email: &str) -> (AuthUser, String) {
    pharmacy_at(
        env,
        email,
        pharmacy_details("Central Pharmacy", "Springfield", 40.0, -75.0),
        true,
    )
    .await
}

pub async fn admin(env: &TestEnv, email: &str) -> AuthUser {
    let user = env
        .services
        .auth
        .create_admin(email, PASSWORD, "Admin")
        .await
        .expect("create admin");
    AuthUser::new(user.id, Role::Admin)
}

pub async fn medicine(env: &TestEnv, name: &str) -> String {
    env.services
        .medicines
        .create(&NewMedicine {
            name: name.to_string(),
            generic_name: Some(format!("{} generic", name)),
            category: "Analgesic".to_string(),
            description: None,
            manufacturer: None,
            requires_prescription: false,
        })
        .await
        .expect("create medicine")
        .id
}

pub async fn stock(env: &TestEnv, owner: &AuthUser, medicine_id: &str, quantity: i32) -> String {
    env.services
        .inventory
        .upsert(
            &owner.id,
            &UpsertInventoryRequest {
                medicine_id: medicine_id.to_string(),
                quantity,
                price: Some(4.5),
            },
        )
        .await
        .expect("upsert inventory")
        .id
}

/// 当前库存数量
pub async fn quantity_of(env: &TestEnv, owner: &AuthUser, medicine_id: &str) -> i32 {
    env.services
        .inventory
        .list_own(&owner.id, None)
        .await
        .expect("list inventory")
        .into_iter()
        .find(|item| item.medicine_id == medicine_id)
        .map(|item| item.quantity)
        .unwrap_or(0)
}
