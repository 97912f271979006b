pub mod auth;
pub mod rate_limit;
pub mod request_id;

pub use auth::{JwtIdentity, OptionalAuthUser};
pub use rate_limit::{ClientIpKeyExtractor, auth_rate_limiter};
pub use request_id::{RequestId, RequestIdMiddleware};
