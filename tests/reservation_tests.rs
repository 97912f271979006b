//! Reservation lifecycle tests
//!
//! Create / accept / reject / cancel / timeout against a real SQLite database.

mod common;

use chrono::{Duration, Utc};
use medifind::errors::MedifindError;
use medifind::models::{NotificationKind, ReservationStatus, StockStatus};
use medifind::services::{CreateReservationRequest, UpsertInventoryRequest};

use common::*;

fn request(pharmacy_id: &str, medicine_id: &str, quantity: i32) -> CreateReservationRequest {
    CreateReservationRequest {
        pharmacy_id: pharmacy_id.to_string(),
        medicine_id: medicine_id.to_string(),
        quantity,
        note: Some("  pick up after work ".to_string()),
    }
}

// =============================================================================
// Create
// =============================================================================

#[tokio::test]
async fn test_create_reservation_is_pending_with_deadline() {
    let env = setup().await;
    let patient = patient(&env, "p@example.com").await;
    let (owner, pharmacy_id) = pharmacy(&env, "ph@example.com").await;
    let medicine_id = medicine(&env, "Paracetamol").await;
    stock(&env, &owner, &medicine_id, 20).await;

    let before = Utc::now();
    let view = env
        .services
        .reservations
        .create(&patient, &request(&pharmacy_id, &medicine_id, 2))
        .await
        .unwrap();

    assert_eq!(view.status, ReservationStatus::Pending);
    assert_eq!(view.quantity, 2);
    assert_eq!(view.medicine_name, "Paracetamol");
    assert_eq!(view.pharmacy_name, "Central Pharmacy");
    assert_eq!(view.note.as_deref(), Some("pick up after work"));
    assert!(view.expires_at >= before + Duration::minutes(30));
    assert!(view.responded_at.is_none());

    // 创建预约不扣库存
    assert_eq!(quantity_of(&env, &owner, &medicine_id).await, 20);

    let notes = env
        .services
        .notifications
        .list(&owner.id, true, None)
        .await
        .unwrap();
    assert!(
        notes
            .iter()
            .any(|n| n.kind == NotificationKind::ReservationCreated
                && n.reservation_id.as_deref() == Some(view.id.as_str()))
    );
}

#[tokio::test]
async fn test_create_rejects_bad_quantity_and_missing_stock() {
    let env = setup().await;
    let patient = patient(&env, "p@example.com").await;
    let (owner, pharmacy_id) = pharmacy(&env, "ph@example.com").await;
    let stocked = medicine(&env, "Ibuprofen").await;
    let unstocked = medicine(&env, "Amoxicillin").await;
    stock(&env, &owner, &stocked, 3).await;

    let reservations = &env.services.reservations;
    assert!(matches!(
        reservations.create(&patient, &request(&pharmacy_id, &stocked, 0)).await,
        Err(MedifindError::Validation(_))
    ));
    assert!(matches!(
        reservations.create(&patient, &request(&pharmacy_id, &stocked, 11)).await,
        Err(MedifindError::Validation(_))
    ));
    assert!(matches!(
        reservations.create(&patient, &request(&pharmacy_id, &stocked, 4)).await,
        Err(MedifindError::InsufficientStock(_))
    ));
    assert!(matches!(
        reservations.create(&patient, &request(&pharmacy_id, &unstocked, 1)).await,
        Err(MedifindError::InsufficientStock(_))
    ));
}

#[tokio::test]
async fn test_only_patients_reserve_at_approved_pharmacies() {
    let env = setup().await;
    let patient = patient(&env, "p@example.com").await;
    let (owner, _) = pharmacy(&env, "ph@example.com").await;
    let (_, pending_id) = pharmacy_at(
        &env,
        "new@example.com",
        pharmacy_details("Unapproved", "Springfield", 40.1, -75.1),
        false,
    )
    .await;
    let medicine_id = medicine(&env, "Cetirizine").await;

    let result = env
        .services
        .reservations
        .create(&owner, &request(&pending_id, &medicine_id, 1))
        .await;
    assert!(matches!(result, Err(MedifindError::Forbidden(_))));

    let result = env
        .services
        .reservations
        .create(&patient, &request(&pending_id, &medicine_id, 1))
        .await;
    assert!(matches!(result, Err(MedifindError::NotFound(_))));
}

// =============================================================================
// Respond
// =============================================================================

#[tokio::test]
async fn test_accept_decrements_stock_and_notifies_patient() {
    let env = setup().await;
    let patient = patient(&env, "p@example.com").await;
    let (owner, pharmacy_id) = pharmacy(&env, "ph@example.com").await;
    let medicine_id = medicine(&env, "Paracetamol").await;
    stock(&env, &owner, &medicine_id, 7).await;

    let created = env
        .services
        .reservations
        .create(&patient, &request(&pharmacy_id, &medicine_id, 3))
        .await
        .unwrap();
    let accepted = env
        .services
        .reservations
        .accept(&owner, &created.id, Some("ready at the counter"))
        .await
        .unwrap();

    assert_eq!(accepted.status, ReservationStatus::Accepted);
    assert_eq!(accepted.response_note.as_deref(), Some("ready at the counter"));
    assert!(accepted.responded_at.is_some());

    // 7 - 3 = 4，低于阈值 5
    let items = env.services.inventory.list_own(&owner.id, None).await.unwrap();
    assert_eq!(items[0].quantity, 4);
    assert_eq!(items[0].status, StockStatus::LowStock);

    let notes = env
        .services
        .notifications
        .list(&patient.id, false, None)
        .await
        .unwrap();
    assert_eq!(notes[0].kind, NotificationKind::ReservationAccepted);
}

#[tokio::test]
async fn test_accept_fails_when_stock_dropped_meanwhile() {
    let env = setup().await;
    let patient = patient(&env, "p@example.com").await;
    let (owner, pharmacy_id) = pharmacy(&env, "ph@example.com").await;
    let medicine_id = medicine(&env, "Paracetamol").await;
    let item_id = stock(&env, &owner, &medicine_id, 5).await;

    let created = env
        .services
        .reservations
        .create(&patient, &request(&pharmacy_id, &medicine_id, 4))
        .await
        .unwrap();
    env.services
        .inventory
        .adjust_quantity(&owner.id, &item_id, -3)
        .await
        .unwrap();

    let result = env.services.reservations.accept(&owner, &created.id, None).await;
    assert!(matches!(result, Err(MedifindError::InsufficientStock(_))));

    // 事务回滚：状态和库存保持不变
    let view = env.services.reservations.get(&patient, &created.id).await.unwrap();
    assert_eq!(view.status, ReservationStatus::Pending);
    assert_eq!(quantity_of(&env, &owner, &medicine_id).await, 2);
}

#[tokio::test]
async fn test_reject_keeps_stock_and_records_reason() {
    let env = setup().await;
    let patient = patient(&env, "p@example.com").await;
    let (owner, pharmacy_id) = pharmacy(&env, "ph@example.com").await;
    let medicine_id = medicine(&env, "Paracetamol").await;
    stock(&env, &owner, &medicine_id, 5).await;

    let created = env
        .services
        .reservations
        .create(&patient, &request(&pharmacy_id, &medicine_id, 2))
        .await
        .unwrap();
    let rejected = env
        .services
        .reservations
        .reject(&owner, &created.id, Some("batch recalled"))
        .await
        .unwrap();

    assert_eq!(rejected.status, ReservationStatus::Rejected);
    assert_eq!(rejected.response_note.as_deref(), Some("batch recalled"));
    assert_eq!(quantity_of(&env, &owner, &medicine_id).await, 5);

    // 终态不可再变
    let again = env.services.reservations.accept(&owner, &created.id, None).await;
    assert!(matches!(again, Err(MedifindError::InvalidTransition(_))));
    let cancel = env.services.reservations.cancel(&patient, &created.id).await;
    assert!(matches!(cancel, Err(MedifindError::InvalidTransition(_))));
}

#[tokio::test]
async fn test_other_pharmacy_cannot_respond() {
    let env = setup().await;
    let patient = patient(&env, "p@example.com").await;
    let (owner, pharmacy_id) = pharmacy(&env, "ph@example.com").await;
    let (other, _) = pharmacy_at(
        &env,
        "other@example.com",
        pharmacy_details("Other", "Springfield", 40.2, -75.2),
        true,
    )
    .await;
    let medicine_id = medicine(&env, "Paracetamol").await;
    stock(&env, &owner, &medicine_id, 5).await;

    let created = env
        .services
        .reservations
        .create(&patient, &request(&pharmacy_id, &medicine_id, 1))
        .await
        .unwrap();

    let result = env.services.reservations.accept(&other, &created.id, None).await;
    assert!(matches!(result, Err(MedifindError::NotFound(_))));
    let result = env.services.reservations.get(&other, &created.id).await;
    assert!(matches!(result, Err(MedifindError::NotFound(_))));
}

#[tokio::test]
async fn test_concurrent_responses_only_one_wins() {
    let env = setup().await;
    let patient = patient(&env, "p@example.com").await;
    let (owner, pharmacy_id) = pharmacy(&env, "ph@example.com").await;
    let medicine_id = medicine(&env, "Paracetamol").await;
    stock(&env, &owner, &medicine_id, 10).await;

    let created = env
        .services
        .reservations
        .create(&patient, &request(&pharmacy_id, &medicine_id, 2))
        .await
        .unwrap();

    let reservations = env.services.reservations.clone();
    let (a, r) = tokio::join!(
        reservations.accept(&owner, &created.id, None),
        reservations.reject(&owner, &created.id, None),
    );
    assert!(a.is_ok() != r.is_ok(), "exactly one response must succeed");

    let final_view = reservations.get(&patient, &created.id).await.unwrap();
    let expected_stock = if a.is_ok() { 8 } else { 10 };
    assert_eq!(quantity_of(&env, &owner, &medicine_id).await, expected_stock);
    assert!(matches!(
        final_view.status,
        ReservationStatus::Accepted | ReservationStatus::Rejected
    ));
}

#[tokio::test]
async fn test_concurrent_accepts_never_oversell() {
    let env = setup().await;
    let first = patient(&env, "p1@example.com").await;
    let second = patient(&env, "p2@example.com").await;
    let (owner, pharmacy_id) = pharmacy(&env, "ph@example.com").await;
    let medicine_id = medicine(&env, "Paracetamol").await;
    stock(&env, &owner, &medicine_id, 5).await;

    let reservations = env.services.reservations.clone();
    let a = reservations
        .create(&first, &request(&pharmacy_id, &medicine_id, 3))
        .await
        .unwrap();
    let b = reservations
        .create(&second, &request(&pharmacy_id, &medicine_id, 3))
        .await
        .unwrap();

    let (ra, rb) = tokio::join!(
        reservations.accept(&owner, &a.id, None),
        reservations.accept(&owner, &b.id, None),
    );
    assert!(ra.is_ok() != rb.is_ok(), "only one accept fits in stock 5");
    let failed = if ra.is_ok() { rb } else { ra };
    assert!(matches!(failed, Err(MedifindError::InsufficientStock(_))));

    assert_eq!(quantity_of(&env, &owner, &medicine_id).await, 2);
    let statuses = [
        reservations.get(&first, &a.id).await.unwrap().status,
        reservations.get(&second, &b.id).await.unwrap().status,
    ];
    assert_eq!(
        statuses
            .iter()
            .filter(|s| **s == ReservationStatus::Accepted)
            .count(),
        1
    );
    assert!(statuses.contains(&ReservationStatus::Pending));
}

// =============================================================================
// Cancel
// =============================================================================

#[tokio::test]
async fn test_cancel_accepted_restores_stock() {
    let env = setup().await;
    let patient = patient(&env, "p@example.com").await;
    let (owner, pharmacy_id) = pharmacy(&env, "ph@example.com").await;
    let medicine_id = medicine(&env, "Paracetamol").await;
    stock(&env, &owner, &medicine_id, 6).await;

    let created = env
        .services
        .reservations
        .create(&patient, &request(&pharmacy_id, &medicine_id, 4))
        .await
        .unwrap();
    env.services
        .reservations
        .accept(&owner, &created.id, None)
        .await
        .unwrap();
    assert_eq!(quantity_of(&env, &owner, &medicine_id).await, 2);

    let cancelled = env
        .services
        .reservations
        .cancel(&patient, &created.id)
        .await
        .unwrap();
    assert_eq!(cancelled.status, ReservationStatus::Cancelled);
    assert_eq!(quantity_of(&env, &owner, &medicine_id).await, 6);

    let notes = env
        .services
        .notifications
        .list(&owner.id, false, None)
        .await
        .unwrap();
    assert_eq!(notes[0].kind, NotificationKind::ReservationCancelled);
}

#[tokio::test]
async fn test_cancel_pending_and_foreign_reservation() {
    let env = setup().await;
    let patient = patient(&env, "p@example.com").await;
    let stranger = common::patient(&env, "s@example.com").await;
    let (owner, pharmacy_id) = pharmacy(&env, "ph@example.com").await;
    let medicine_id = medicine(&env, "Paracetamol").await;
    stock(&env, &owner, &medicine_id, 6).await;

    let created = env
        .services
        .reservations
        .create(&patient, &request(&pharmacy_id, &medicine_id, 1))
        .await
        .unwrap();

    let result = env.services.reservations.cancel(&stranger, &created.id).await;
    assert!(matches!(result, Err(MedifindError::NotFound(_))));

    let cancelled = env
        .services
        .reservations
        .cancel(&patient, &created.id)
        .await
        .unwrap();
    assert_eq!(cancelled.status, ReservationStatus::Cancelled);
    assert_eq!(quantity_of(&env, &owner, &medicine_id).await, 6);
}

// =============================================================================
// Timeout
// =============================================================================

#[tokio::test]
async fn test_sweep_moves_overdue_pending_to_no_response() {
    let env = setup().await;
    let patient = patient(&env, "p@example.com").await;
    let (owner, pharmacy_id) = pharmacy(&env, "ph@example.com").await;
    let medicine_id = medicine(&env, "Paracetamol").await;
    stock(&env, &owner, &medicine_id, 10).await;

    let overdue = env
        .services
        .reservations
        .create(&patient, &request(&pharmacy_id, &medicine_id, 1))
        .await
        .unwrap();
    let accepted = env
        .services
        .reservations
        .create(&patient, &request(&pharmacy_id, &medicine_id, 1))
        .await
        .unwrap();
    env.services
        .reservations
        .accept(&owner, &accepted.id, None)
        .await
        .unwrap();

    // 尚未到期时什么都不做
    assert_eq!(
        env.services.reservations.expire_overdue(Utc::now()).await.unwrap(),
        0
    );

    let later = Utc::now() + Duration::minutes(31);
    assert_eq!(env.services.reservations.expire_overdue(later).await.unwrap(), 1);
    // 第二次扫描不重复处理
    assert_eq!(env.services.reservations.expire_overdue(later).await.unwrap(), 0);

    let view = env.services.reservations.get(&patient, &overdue.id).await.unwrap();
    assert_eq!(view.status, ReservationStatus::NoResponse);
    let view = env.services.reservations.get(&patient, &accepted.id).await.unwrap();
    assert_eq!(view.status, ReservationStatus::Accepted);

    let patient_notes = env
        .services
        .notifications
        .list(&patient.id, false, None)
        .await
        .unwrap();
    assert!(
        patient_notes
            .iter()
            .any(|n| n.kind == NotificationKind::ReservationNoResponse)
    );
}

#[tokio::test]
async fn test_respond_after_deadline_is_conflict_and_expires() {
    let mut config = test_config();
    config.reservation.timeout_minutes = 0;
    let env = setup_with(config).await;
    let patient = patient(&env, "p@example.com").await;
    let (owner, pharmacy_id) = pharmacy(&env, "ph@example.com").await;
    let medicine_id = medicine(&env, "Paracetamol").await;
    stock(&env, &owner, &medicine_id, 10).await;

    let created = env
        .services
        .reservations
        .create(&patient, &request(&pharmacy_id, &medicine_id, 1))
        .await
        .unwrap();

    let result = env.services.reservations.accept(&owner, &created.id, None).await;
    assert!(matches!(result, Err(MedifindError::InvalidTransition(_))));

    let view = env.services.reservations.get(&patient, &created.id).await.unwrap();
    assert_eq!(view.status, ReservationStatus::NoResponse);
    assert_eq!(quantity_of(&env, &owner, &medicine_id).await, 10);
}

#[tokio::test]
async fn test_sweeper_run_once_and_disabled_interval() {
    let mut config = test_config();
    config.reservation.timeout_minutes = 0;
    let env = setup_with(config).await;
    let patient = patient(&env, "p@example.com").await;
    let (owner, pharmacy_id) = pharmacy(&env, "ph@example.com").await;
    let medicine_id = medicine(&env, "Paracetamol").await;
    stock(&env, &owner, &medicine_id, 10).await;

    env.services
        .reservations
        .create(&patient, &request(&pharmacy_id, &medicine_id, 1))
        .await
        .unwrap();

    let sweeper = env.services.sweeper();
    assert!(!sweeper.clone().spawn_background_task(0));
    assert_eq!(sweeper.run_once().await.unwrap(), 1);
}

// =============================================================================
// Listing
// =============================================================================

#[tokio::test]
async fn test_list_is_scoped_by_role() {
    let env = setup().await;
    let alice = patient(&env, "alice@example.com").await;
    let bob = common::patient(&env, "bob@example.com").await;
    let admin = admin(&env, "admin@example.com").await;
    let (owner, pharmacy_id) = pharmacy(&env, "ph@example.com").await;
    let medicine_id = medicine(&env, "Paracetamol").await;
    stock(&env, &owner, &medicine_id, 10).await;

    let first = env
        .services
        .reservations
        .create(&alice, &request(&pharmacy_id, &medicine_id, 1))
        .await
        .unwrap();
    env.services
        .reservations
        .create(&bob, &request(&pharmacy_id, &medicine_id, 1))
        .await
        .unwrap();
    env.services
        .reservations
        .reject(&owner, &first.id, None)
        .await
        .unwrap();

    let reservations = &env.services.reservations;
    assert_eq!(reservations.list_for(&alice, None).await.unwrap().len(), 1);
    assert_eq!(reservations.list_for(&owner, None).await.unwrap().len(), 2);
    assert_eq!(reservations.list_for(&admin, None).await.unwrap().len(), 2);

    let pending = reservations
        .list_for(&owner, Some(ReservationStatus::Pending))
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].patient_id, bob.id);
}

#[tokio::test]
async fn test_cancel_refuses_restore_past_quantity_limit() {
    let env = setup().await;
    let patient = patient(&env, "p@example.com").await;
    let (owner, pharmacy_id) = pharmacy(&env, "ph@example.com").await;
    let medicine_id = medicine(&env, "Paracetamol").await;
    stock(&env, &owner, &medicine_id, 10).await;

    let created = env
        .services
        .reservations
        .create(&patient, &request(&pharmacy_id, &medicine_id, 2))
        .await
        .unwrap();
    env.services
        .reservations
        .accept(&owner, &created.id, None)
        .await
        .unwrap();
    env.services
        .inventory
        .upsert(
            &owner.id,
            &UpsertInventoryRequest {
                medicine_id: medicine_id.clone(),
                quantity: i32::MAX,
                price: None,
            },
        )
        .await
        .unwrap();

    let result = env.services.reservations.cancel(&patient, &created.id).await;
    assert!(matches!(result, Err(MedifindError::Conflict(_))));

    // 整个取消回滚
    let view = env.services.reservations.get(&patient, &created.id).await.unwrap();
    assert_eq!(view.status, ReservationStatus::Accepted);
    assert_eq!(quantity_of(&env, &owner, &medicine_id).await, i32::MAX);
}
