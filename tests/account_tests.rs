//! Profile, notification, administration and analytics tests

mod common;

use chrono::{Duration, Utc};
use medifind::errors::MedifindError;
use medifind::models::{NotificationKind, Role};
use medifind::services::{
    ChangePasswordRequest, CreateReservationRequest, RegisterRequest, UpdateProfileRequest,
    UserQuery,
};
use sea_orm::ConnectionTrait;

use common::*;

// =============================================================================
// Registration & profile
// =============================================================================

#[tokio::test]
async fn test_duplicate_email_is_conflict() {
    let env = setup().await;
    patient(&env, "dup@example.com").await;

    let result = env
        .services
        .auth
        .register(&RegisterRequest {
            email: "DUP@example.com".to_string(),
            password: PASSWORD.to_string(),
            name: "Again".to_string(),
            phone: None,
            role: Role::Patient,
            pharmacy: None,
        })
        .await;
    assert!(matches!(result, Err(MedifindError::Conflict(_))));
}

#[tokio::test]
async fn test_pharmacy_registration_requires_details_and_notifies_admins() {
    let env = setup().await;
    let admin = admin(&env, "admin@example.com").await;

    let missing = env
        .services
        .auth
        .register(&RegisterRequest {
            email: "ph@example.com".to_string(),
            password: PASSWORD.to_string(),
            name: "Pharmacist".to_string(),
            phone: None,
            role: Role::Pharmacy,
            pharmacy: None,
        })
        .await;
    assert!(matches!(missing, Err(MedifindError::Validation(_))));

    let (_, pharmacy_id) = pharmacy_at(
        &env,
        "ph@example.com",
        pharmacy_details("Fresh", "Springfield", 40.0, -75.0),
        false,
    )
    .await;
    let view = env.services.pharmacies.list_all(Some(false)).await.unwrap();
    assert_eq!(view[0].id, pharmacy_id);

    let notes = env
        .services
        .notifications
        .list(&admin.id, true, None)
        .await
        .unwrap();
    assert_eq!(notes[0].kind, NotificationKind::PharmacyRegistered);
}

#[tokio::test]
async fn test_profile_update_and_password_change() {
    let env = setup().await;
    let user = patient(&env, "p@example.com").await;
    let profile = &env.services.profile;

    let updated = profile
        .update_profile(
            &user.id,
            &UpdateProfileRequest {
                name: Some("  Renamed ".to_string()),
                phone: Some(String::new()),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Renamed");
    assert_eq!(updated.phone, None);

    let bad_phone = profile
        .update_profile(
            &user.id,
            &UpdateProfileRequest {
                name: None,
                phone: Some("call me".to_string()),
            },
        )
        .await;
    assert!(matches!(bad_phone, Err(MedifindError::Validation(_))));

    let wrong = profile
        .change_password(
            &user.id,
            &ChangePasswordRequest {
                current_password: "not-it".to_string(),
                new_password: "another-long-password".to_string(),
            },
        )
        .await;
    assert!(matches!(wrong, Err(MedifindError::Unauthorized(_))));

    profile
        .change_password(
            &user.id,
            &ChangePasswordRequest {
                current_password: PASSWORD.to_string(),
                new_password: "another-long-password".to_string(),
            },
        )
        .await
        .unwrap();

    assert!(env.services.auth.login("p@example.com", PASSWORD).await.is_err());
    let (view, _) = env
        .services
        .auth
        .login("p@example.com", "another-long-password")
        .await
        .unwrap();
    assert_eq!(view.id, user.id);
}

// =============================================================================
// Notifications
// =============================================================================

#[tokio::test]
async fn test_notifications_read_and_delete_are_owner_scoped() {
    let env = setup().await;
    let alice = patient(&env, "alice@example.com").await;
    let bob = common::patient(&env, "bob@example.com").await;
    let notifications = &env.services.notifications;

    for i in 0..3 {
        notifications
            .notify(
                &alice.id,
                NotificationKind::ReservationAccepted,
                "Hello",
                &format!("message {}", i),
                None,
            )
            .await
            .unwrap();
    }
    assert_eq!(notifications.unread_count(&alice.id).await.unwrap(), 3);

    let list = notifications.list(&alice.id, false, Some(2)).await.unwrap();
    assert_eq!(list.len(), 2);
    let first = list[0].id.clone();

    assert!(matches!(
        notifications.mark_read(&bob.id, &first).await,
        Err(MedifindError::NotFound(_))
    ));
    assert!(notifications.mark_read(&alice.id, &first).await.unwrap().is_read);
    assert_eq!(notifications.unread_count(&alice.id).await.unwrap(), 2);

    assert_eq!(notifications.mark_all_read(&alice.id).await.unwrap(), 2);
    assert!(
        notifications
            .list(&alice.id, true, None)
            .await
            .unwrap()
            .is_empty()
    );

    assert!(matches!(
        notifications.delete(&bob.id, &first).await,
        Err(MedifindError::NotFound(_))
    ));
    notifications.delete(&alice.id, &first).await.unwrap();
    assert_eq!(notifications.list(&alice.id, false, None).await.unwrap().len(), 2);
}

// =============================================================================
// Administration
// =============================================================================

#[tokio::test]
async fn test_admin_user_listing_and_deletion() {
    let env = setup().await;
    let admin = admin(&env, "admin@example.com").await;
    let patient = patient(&env, "p@example.com").await;
    let (owner, _) = pharmacy(&env, "ph@example.com").await;
    let admin_service = &env.services.admin;

    let page = admin_service
        .list_users(&UserQuery {
            role: Some(Role::Pharmacy),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, owner.id);

    let searched = admin_service
        .list_users(&UserQuery {
            search: Some("P@EXAMPLE".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(searched.items.iter().any(|u| u.id == patient.id));

    assert!(matches!(
        admin_service.delete_user(&admin.id, &admin.id).await,
        Err(MedifindError::Validation(_))
    ));
    assert!(matches!(
        admin_service.delete_user(&admin.id, "missing").await,
        Err(MedifindError::NotFound(_))
    ));

    // 删除药房账号时其药房资料一并删除
    admin_service.delete_user(&admin.id, &owner.id).await.unwrap();
    assert!(env.services.pharmacies.list_all(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_approval_persists_when_notification_fails() {
    let env = setup().await;
    let (_, pharmacy_id) = pharmacy_at(
        &env,
        "ph@example.com",
        pharmacy_details("Riverside Pharmacy", "Springfield", 40.0, -75.0),
        false,
    )
    .await;

    env.services
        .storage
        .get_db()
        .execute_unprepared("DROP TABLE notifications")
        .await
        .unwrap();

    let view = env
        .services
        .pharmacies
        .set_approval(&pharmacy_id, true)
        .await
        .unwrap();
    assert!(view.is_approved);
    assert!(env.services.pharmacies.get_public(&pharmacy_id).await.is_ok());
}

// =============================================================================
// Analytics
// =============================================================================

#[tokio::test]
async fn test_overview_and_pharmacy_dashboard() {
    let env = setup().await;
    admin(&env, "admin@example.com").await;
    let patient = patient(&env, "p@example.com").await;
    let (owner, pharmacy_id) = pharmacy(&env, "ph@example.com").await;
    let popular = medicine(&env, "Paracetamol").await;
    let other = medicine(&env, "Ibuprofen").await;
    stock(&env, &owner, &popular, 30).await;
    stock(&env, &owner, &other, 2).await;

    let reserve = |medicine_id: &str| CreateReservationRequest {
        pharmacy_id: pharmacy_id.clone(),
        medicine_id: medicine_id.to_string(),
        quantity: 1,
        note: None,
    };
    let reservations = &env.services.reservations;
    let a = reservations.create(&patient, &reserve(&popular)).await.unwrap();
    let b = reservations.create(&patient, &reserve(&popular)).await.unwrap();
    reservations.create(&patient, &reserve(&popular)).await.unwrap();
    reservations.create(&patient, &reserve(&other)).await.unwrap();
    reservations.accept(&owner, &a.id, None).await.unwrap();
    reservations.reject(&owner, &b.id, None).await.unwrap();
    // 剩余两个 PENDING 超时
    reservations
        .expire_overdue(Utc::now() + Duration::hours(1))
        .await
        .unwrap();

    env.services
        .calls
        .log_call(&pharmacy_id, Some(&popular), Some(&patient))
        .await
        .unwrap();

    let overview = env.services.analytics.overview().await.unwrap();
    assert_eq!(overview.total_users, 3);
    assert_eq!(overview.users_by_role["PATIENT"], 1);
    assert_eq!(overview.approved_pharmacies, 1);
    assert_eq!(overview.total_medicines, 2);
    assert_eq!(overview.total_reservations, 4);
    assert_eq!(overview.reservations_by_status["NO_RESPONSE"], 2);
    assert_eq!(overview.reservations_by_status["CANCELLED"], 0);
    assert_eq!(overview.total_calls, 1);
    // 1 accepted / (1 + 1 rejected + 2 no response)
    assert_eq!(overview.acceptance_rate, 25.0);
    assert_eq!(overview.top_medicines[0].name, "Paracetamol");
    assert_eq!(overview.top_medicines[0].reservations, 3);

    let dashboard = env
        .services
        .analytics
        .pharmacy_dashboard(&owner.id)
        .await
        .unwrap();
    assert_eq!(dashboard.pharmacy_id, pharmacy_id);
    assert_eq!(dashboard.total_items, 2);
    assert_eq!(dashboard.inventory_by_status["LOW_STOCK"], 1);
    assert_eq!(dashboard.inventory_by_status["IN_STOCK"], 1);
    assert_eq!(dashboard.response_rate, 50.0);
    assert_eq!(dashboard.total_calls, 1);

    let calls = env.services.calls.list_calls(&owner.id).await.unwrap();
    assert_eq!(calls[0].patient_id.as_deref(), Some(patient.id.as_str()));
    assert_eq!(calls[0].medicine_name.as_deref(), Some("Paracetamol"));
}
