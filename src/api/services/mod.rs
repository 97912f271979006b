pub mod admin;
pub mod analytics;
pub mod auth;
pub mod health;
pub mod inventory;
pub mod medicines;
pub mod notifications;
pub mod pharmacies;
pub mod profile;
pub mod reservations;
pub mod routes;
pub mod search;

pub use health::{AppStartTime, HealthService, health_routes};
pub use routes::api_v1_routes;
