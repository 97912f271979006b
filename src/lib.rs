//! MediFind - medicine locator service
//!
//! Patients search nearby pharmacies for a medicine, reserve stock and
//! call the pharmacy directly. Pharmacies manage inventory and answer
//! reservations. Administrators approve pharmacies and review analytics.
//!
//! # Architecture
//! - `api`: HTTP handlers, middleware and JWT
//! - `services`: business logic (reservations, inventory, search, ...)
//! - `storage`: database connection and migrations
//! - `models`: domain enums and derived state
//! - `interfaces`: operator CLI
//! - `config`: configuration management
//! - `runtime`: application lifecycle and execution modes
//! - `system`: logging initialisation

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod models;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
