//! System-level modules
//!
//! - Logging initialisation (tracing + non-blocking appender)

pub mod logging;

pub use logging::init_logging;
