//! Mode routing
//!
//! - Server mode (HTTP server, default)
//! - CLI mode (operator commands)

pub mod server;

pub use server::run_server;
