//! CLI command implementations

mod admin;
mod config_gen;
mod pharmacy;
mod sweep;

pub use admin::create_admin;
pub use config_gen::config_generate;
pub use pharmacy::approve_pharmacy;
pub use sweep::run_sweep;
