pub mod constants;
pub mod error_code;
pub mod helpers;
pub mod jwt;
pub mod middleware;
pub mod services;
pub mod types;

pub use error_code::ErrorCode;
