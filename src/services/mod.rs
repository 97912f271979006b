//! Service layer for business logic
//!
//! Business rules live here so HTTP handlers, the background sweeper and the
//! CLI share one implementation. Every service receives its settings at
//! construction time.

mod admin_service;
mod analytics_service;
mod auth_service;
mod call_service;
mod inventory_service;
pub(crate) mod lookup;
mod medicine_service;
mod notification_service;
mod pharmacy_service;
mod profile_service;
mod reservation_service;
mod reservation_sweeper;
mod search_service;

use std::sync::Arc;

use actix_web::web;

pub use admin_service::*;
pub use analytics_service::*;
pub use auth_service::*;
pub use call_service::*;
pub use inventory_service::{
    AdjustInventoryRequest, InventoryItemView, InventoryService, UpsertInventoryRequest,
};
pub use medicine_service::*;
pub use notification_service::*;
pub use pharmacy_service::*;
pub use profile_service::*;
pub use reservation_service::*;
pub use reservation_sweeper::ReservationSweeper;
pub use search_service::*;

use crate::config::StaticConfig;
use crate::storage::Storage;

/// 应用内全部服务实例
#[derive(Clone)]
pub struct Services {
    pub storage: Arc<Storage>,
    pub auth: Arc<AuthService>,
    pub profile: Arc<ProfileService>,
    pub medicines: Arc<MedicineService>,
    pub search: Arc<SearchService>,
    pub pharmacies: Arc<PharmacyService>,
    pub inventory: Arc<InventoryService>,
    pub reservations: Arc<ReservationService>,
    pub notifications: Arc<NotificationService>,
    pub calls: Arc<CallService>,
    pub analytics: Arc<AnalyticsService>,
    pub admin: Arc<AdminService>,
}

impl Services {
    pub fn new(storage: Arc<Storage>, config: &StaticConfig) -> Self {
        let threshold = config.inventory.low_stock_threshold;
        let notifications = Arc::new(NotificationService::new(storage.clone()));

        Self {
            auth: Arc::new(AuthService::new(
                storage.clone(),
                notifications.clone(),
                config.auth.password_min_length,
            )),
            profile: Arc::new(ProfileService::new(
                storage.clone(),
                config.auth.password_min_length,
            )),
            medicines: Arc::new(MedicineService::new(storage.clone())),
            search: Arc::new(SearchService::new(
                storage.clone(),
                config.search.clone(),
                threshold,
            )),
            pharmacies: Arc::new(PharmacyService::new(
                storage.clone(),
                notifications.clone(),
                threshold,
            )),
            inventory: Arc::new(InventoryService::new(storage.clone(), threshold)),
            reservations: Arc::new(ReservationService::new(
                storage.clone(),
                notifications.clone(),
                config.reservation.clone(),
                threshold,
            )),
            calls: Arc::new(CallService::new(storage.clone())),
            analytics: Arc::new(AnalyticsService::new(storage.clone())),
            admin: Arc::new(AdminService::new(storage.clone())),
            notifications,
            storage,
        }
    }

    pub fn sweeper(&self) -> Arc<ReservationSweeper> {
        Arc::new(ReservationSweeper::new(self.reservations.clone()))
    }

    /// 注册为 actix `web::Data<Arc<T>>`
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.storage.clone()))
            .app_data(web::Data::new(self.auth.clone()))
            .app_data(web::Data::new(self.profile.clone()))
            .app_data(web::Data::new(self.medicines.clone()))
            .app_data(web::Data::new(self.search.clone()))
            .app_data(web::Data::new(self.pharmacies.clone()))
            .app_data(web::Data::new(self.inventory.clone()))
            .app_data(web::Data::new(self.reservations.clone()))
            .app_data(web::Data::new(self.notifications.clone()))
            .app_data(web::Data::new(self.calls.clone()))
            .app_data(web::Data::new(self.analytics.clone()))
            .app_data(web::Data::new(self.admin.clone()));
    }
}
